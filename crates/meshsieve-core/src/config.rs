//! Pipeline threshold configuration.
//!
//! All numeric policy lives here rather than in code: epsilon values,
//! face-count bounds, and the self-intersection sampling budget are loaded
//! from a JSON file and validated once, before any asset is processed.
//! A malformed configuration is fatal to the whole run.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Thresholds consumed by the validator and the texture normalizer.
///
/// Defaults mirror the production dataset policy: up to 64k faces, zero
/// tolerated degenerate faces, zero tolerated self-intersections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineConfig {
    /// Minimum face count for a usable mesh.
    pub min_faces: usize,
    /// Maximum face count for a usable mesh.
    pub max_faces: usize,
    /// A face with area below this is degenerate.
    pub degenerate_area_eps: f64,
    /// Maximum tolerated fraction of degenerate faces.
    pub degenerate_ratio_max: f64,
    /// Angular deviation (degrees) between a stored normal and the
    /// geometric face normal before the face counts as inconsistent.
    pub normal_angle_eps_deg: f64,
    /// Maximum tolerated fraction of normal-inconsistent faces.
    pub normal_fail_ratio_max: f64,
    /// Number of triangle-pair intersections tolerated before the
    /// self-intersection check fails.
    pub self_intersection_tolerance: usize,
    /// Above this face count the exhaustive pair test is replaced by the
    /// sampled fallback.
    pub self_intersection_face_ceiling: usize,
    /// Number of faces tested in the sampled fallback. Sampling can miss
    /// intersections; 0 disables the fallback, so meshes above the ceiling
    /// fail with resource exhaustion instead.
    pub self_intersection_samples: usize,
    /// Textures with a side longer than this are downscaled. Never upscales.
    pub max_texture_size: u32,
    /// Side length of the uniform buffer emitted for constant channels.
    pub constant_fill_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_faces: 1,
            max_faces: 64_000,
            degenerate_area_eps: 1e-10,
            degenerate_ratio_max: 0.0,
            normal_angle_eps_deg: 30.0,
            normal_fail_ratio_max: 0.1,
            self_intersection_tolerance: 0,
            self_intersection_face_ceiling: 100_000,
            self_intersection_samples: 4096,
            max_texture_size: 2048,
            constant_fill_size: 16,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every threshold for internal consistency.
    ///
    /// Returns all problems at once rather than stopping at the first, so a
    /// bad config file can be fixed in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        if self.max_faces < self.min_faces {
            issues.push(ConfigIssue::new(
                "max_faces",
                format!(
                    "max_faces ({}) must be >= min_faces ({})",
                    self.max_faces, self.min_faces
                ),
            ));
        }
        if !(self.degenerate_area_eps.is_finite() && self.degenerate_area_eps >= 0.0) {
            issues.push(ConfigIssue::new(
                "degenerate_area_eps",
                "must be a finite value >= 0",
            ));
        }
        for (path, ratio) in [
            ("degenerate_ratio_max", self.degenerate_ratio_max),
            ("normal_fail_ratio_max", self.normal_fail_ratio_max),
        ] {
            if !(0.0..=1.0).contains(&ratio) || !ratio.is_finite() {
                issues.push(ConfigIssue::new(path, "must be in [0.0, 1.0]"));
            }
        }
        if !(0.0..=180.0).contains(&self.normal_angle_eps_deg)
            || !self.normal_angle_eps_deg.is_finite()
        {
            issues.push(ConfigIssue::new(
                "normal_angle_eps_deg",
                "must be in [0.0, 180.0]",
            ));
        }
        if self.max_texture_size == 0 {
            issues.push(ConfigIssue::new("max_texture_size", "must be > 0"));
        }
        if self.constant_fill_size == 0 {
            issues.push(ConfigIssue::new("constant_fill_size", "must be > 0"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Epsilon for "two vertices coincide", derived from the area epsilon so
    /// the config surface stays at the documented key set.
    pub fn coincident_vertex_eps(&self) -> f64 {
        self.degenerate_area_eps.sqrt()
    }
}

/// A single problem found in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// JSON path of the offending field.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl ConfigIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Fatal configuration errors. These abort the run before any asset is
/// touched; asset-local problems use [`crate::AssetError`] instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_face_bounds_rejected() {
        let config = PipelineConfig {
            min_faces: 100,
            max_faces: 10,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "max_faces");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_all_issues_reported_at_once() {
        let config = PipelineConfig {
            degenerate_ratio_max: 1.5,
            normal_fail_ratio_max: -0.1,
            constant_fill_size: 0,
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            ConfigError::Invalid(issues) => assert_eq!(issues.len(), 3),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<PipelineConfig, _> =
            serde_json::from_str(r#"{"min_faces": 4, "max_facez": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"max_faces": 1000}"#).unwrap();
        assert_eq!(config.max_faces, 1000);
        assert_eq!(config.min_faces, PipelineConfig::default().min_faces);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"min_faces": 4, "max_faces": 1000}"#).unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.min_faces, 4);
        assert_eq!(config.max_faces, 1000);
    }
}
