//! Command implementations behind the `meshsieve` binary.

pub mod convert;
pub mod extract;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use meshsieve_core::PipelineConfig;
use std::path::Path;

/// Load the threshold config, or fall back to defaults when no file is
/// given. Any config problem is fatal before an asset is touched.
pub(crate) fn load_config(path: Option<&str>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(Path::new(path))
            .with_context(|| format!("invalid config file: {path}")),
        None => Ok(PipelineConfig::default()),
    }
}
