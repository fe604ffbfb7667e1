//! Per-asset pipeline state machine.
//!
//! One asset runs `Pending → Loaded → Validated → Extracted → Converted →
//! Persisted` synchronously, with `Failed` reachable from any state. The
//! only branch point is the validation verdict: a failing asset never
//! reaches extraction or conversion. Each run owns its model and writes
//! only under its own output directory, which is what makes the batch
//! embarrassingly parallel.

use meshsieve_core::{AssetError, PipelineConfig, ValidationVerdict};
use meshsieve_geometry::{emitter, loader, validator};
use meshsieve_texture::{normalize, resolve, DecodeCache, PngConfig};
use std::path::{Path, PathBuf};

/// Where one asset's run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    /// Validation said no; extraction and conversion were skipped.
    Rejected,
    /// Full pipeline completed and outputs are on disk.
    Persisted,
    /// The run died in some state with an asset-local error.
    Failed { reason: String, detail: String },
}

/// Result of one asset's state-machine run.
#[derive(Debug, Clone)]
pub struct AssetOutcome {
    pub asset_id: String,
    pub state: AssetState,
    /// Present whenever the run reached validation.
    pub verdict: Option<ValidationVerdict>,
}

impl AssetOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.state, AssetState::Persisted)
    }
}

/// Drives single assets through the pipeline against shared batch state.
pub struct PipelineDriver<'a> {
    config: &'a PipelineConfig,
    cache: &'a DecodeCache,
    png: PngConfig,
    out_root: &'a Path,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(config: &'a PipelineConfig, cache: &'a DecodeCache, out_root: &'a Path) -> Self {
        Self {
            config,
            cache,
            png: PngConfig::default(),
            out_root,
        }
    }

    /// Output directory for one asset.
    pub fn asset_dir(&self, asset_id: &str) -> PathBuf {
        self.out_root.join(asset_id)
    }

    /// Paths that must exist for a passed asset to count as persisted.
    /// Resume uses this to decide whether a `pass=true` record can be
    /// skipped.
    pub fn expected_outputs(&self, asset_id: &str) -> [PathBuf; 2] {
        let dir = self.asset_dir(asset_id);
        [
            dir.join(format!("{asset_id}.obj")),
            dir.join("textures.json"),
        ]
    }

    /// Run one asset to completion. Never panics the batch: every
    /// asset-local error folds into `AssetState::Failed`.
    pub fn process(&self, asset_id: &str, source: &Path) -> AssetOutcome {
        match self.run(asset_id, source) {
            Ok(outcome) => outcome,
            Err(error) => AssetOutcome {
                asset_id: asset_id.to_string(),
                state: AssetState::Failed {
                    reason: error.reason().to_string(),
                    detail: error.to_string(),
                },
                verdict: None,
            },
        }
    }

    fn run(&self, asset_id: &str, source: &Path) -> Result<AssetOutcome, AssetError> {
        // Pending -> Loaded
        let model = loader::load_glb_file(source)?;

        // Loaded -> Validated: the one branch point.
        let verdict = validator::validate(&model, self.config, asset_id)?;
        if !verdict.pass {
            return Ok(AssetOutcome {
                asset_id: asset_id.to_string(),
                state: AssetState::Rejected,
                verdict: Some(verdict),
            });
        }

        let dir = self.asset_dir(asset_id);
        std::fs::create_dir_all(&dir)?;

        // Validated -> Extracted
        let bindings = resolve(&model, self.cache)?;
        let texture_set = normalize(&bindings, self.config);
        let manifest = texture_set.save(&dir, asset_id, &self.png)?;
        manifest.save(&dir.join("textures.json"))?;

        // Extracted -> Converted
        let mesh = emitter::emit(&model)?;

        // Converted -> Persisted
        mesh.write_obj(&dir.join(format!("{asset_id}.obj")))?;

        Ok(AssetOutcome {
            asset_id: asset_id.to_string(),
            state: AssetState::Persisted,
            verdict: Some(verdict),
        })
    }
}
