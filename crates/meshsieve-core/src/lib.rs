//! Meshsieve canonical types.
//!
//! This crate holds the types shared across the pipeline: threshold
//! configuration, the asset-local error taxonomy, validation verdicts and
//! the append-only verdict log, and the texture extraction manifest.
//!
//! It deliberately has no geometry or image dependencies so every other
//! crate in the workspace can depend on it.

pub mod config;
pub mod error;
pub mod manifest;
pub mod verdict;

pub use config::{ConfigError, ConfigIssue, PipelineConfig};
pub use error::AssetError;
pub use manifest::{ChannelRole, ChannelStatus, ManifestEntry, TextureManifest};
pub use verdict::{CheckFailure, CheckKind, ValidationVerdict, VerdictLog, VerdictRecord};
