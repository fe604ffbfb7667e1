//! Asset-local error taxonomy.
//!
//! Everything here is fatal to one asset and never to the batch: the driver
//! records the failure and moves on. Only [`crate::ConfigError`] aborts a
//! run, and it does so before the first asset is touched.

use thiserror::Error;

/// An error that terminates one asset's pipeline run.
///
/// Note that a failed validation is *not* an error; it is an expected
/// outcome carried in the [`crate::ValidationVerdict`].
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source file is unreadable or not a well-formed GLB.
    #[error("failed to load asset: {0}")]
    Load(String),

    /// A material claims a channel that cannot be located in the asset.
    #[error("channel {role} of material '{slot}' cannot be resolved: {detail}")]
    MissingChannel {
        slot: String,
        role: &'static str,
        detail: String,
    },

    /// The model contains faces that cannot be triangulated
    /// deterministically, or non-surface primitives.
    #[error("unsupported topology: {0}")]
    UnsupportedTopology(String),

    /// A check exceeded its resource ceiling without a configured fallback.
    #[error("resource limit exceeded: {0}")]
    ResourceExhaustion(String),

    /// Failed to write an output artifact.
    #[error("failed to persist output: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// Stable reason tag for the verdict log and batch summary.
    pub fn reason(&self) -> &'static str {
        match self {
            AssetError::Load(_) => "load",
            AssetError::MissingChannel { .. } => "missing-channel",
            AssetError::UnsupportedTopology(_) => "unsupported-topology",
            AssetError::ResourceExhaustion(_) => "resource-exhaustion",
            AssetError::Io(_) => "io",
        }
    }
}
