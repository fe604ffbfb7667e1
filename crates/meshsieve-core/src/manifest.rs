//! Texture extraction manifest.
//!
//! One manifest is written per extracted asset, recording for each semantic
//! channel role whether it was present, absent, or flagged, plus the output
//! file name and a BLAKE3 hash of its bytes for post-hoc verification.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The four semantic PBR channel roles the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    BaseColor,
    MetallicRoughness,
    NormalMap,
    Emissive,
}

impl ChannelRole {
    /// All roles, in manifest order.
    pub const ALL: [ChannelRole; 4] = [
        ChannelRole::BaseColor,
        ChannelRole::MetallicRoughness,
        ChannelRole::NormalMap,
        ChannelRole::Emissive,
    ];

    /// Suffix used in output file names: `{asset_id}_{suffix}.png`.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ChannelRole::BaseColor => "base_color",
            ChannelRole::MetallicRoughness => "metallic_roughness",
            ChannelRole::NormalMap => "normal_map",
            ChannelRole::Emissive => "emissive",
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_suffix())
    }
}

/// Outcome for one channel role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Extracted and written.
    Present,
    /// Not bound in the source material. Not an error.
    Absent,
    /// Extracted and written, but suspicious (see `flag`).
    Flagged,
}

/// Manifest entry for one channel role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub role: ChannelRole,
    pub status: ChannelStatus,
    /// Output file name, relative to the asset's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// BLAKE3 hash of the written file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Why the channel was flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

impl ManifestEntry {
    pub fn absent(role: ChannelRole) -> Self {
        Self {
            role,
            status: ChannelStatus::Absent,
            file: None,
            hash: None,
            flag: None,
        }
    }

    pub fn present(role: ChannelRole, file: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            role,
            status: ChannelStatus::Present,
            file: Some(file.into()),
            hash: Some(hash.into()),
            flag: None,
        }
    }

    pub fn flagged(
        role: ChannelRole,
        file: impl Into<String>,
        hash: impl Into<String>,
        flag: impl Into<String>,
    ) -> Self {
        Self {
            role,
            status: ChannelStatus::Flagged,
            file: Some(file.into()),
            hash: Some(hash.into()),
            flag: Some(flag.into()),
        }
    }
}

/// Per-asset texture manifest, written once as `textures.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureManifest {
    pub asset_id: String,
    pub channels: Vec<ManifestEntry>,
}

impl TextureManifest {
    pub fn new(asset_id: impl Into<String>, channels: Vec<ManifestEntry>) -> Self {
        Self {
            asset_id: asset_id.into(),
            channels,
        }
    }

    /// Look up the entry for a role.
    pub fn channel(&self, role: ChannelRole) -> Option<&ManifestEntry> {
        self.channels.iter().find(|e| e.role == role)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_suffixes() {
        assert_eq!(ChannelRole::BaseColor.file_suffix(), "base_color");
        assert_eq!(ChannelRole::NormalMap.file_suffix(), "normal_map");
    }

    #[test]
    fn test_absent_entry_skips_optional_fields() {
        let entry = ManifestEntry::absent(ChannelRole::Emissive);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "emissive");
        assert_eq!(json["status"], "absent");
        assert!(json.get("file").is_none());
        assert!(json.get("hash").is_none());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textures.json");
        let manifest = TextureManifest::new(
            "cube_01",
            vec![
                ManifestEntry::present(ChannelRole::BaseColor, "cube_01_base_color.png", "abc"),
                ManifestEntry::absent(ChannelRole::Emissive),
                ManifestEntry::flagged(
                    ChannelRole::NormalMap,
                    "cube_01_normal_map.png",
                    "def",
                    "suspected object-space normal map",
                ),
            ],
        );
        manifest.save(&path).unwrap();
        let back = TextureManifest::load(&path).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(
            back.channel(ChannelRole::NormalMap).unwrap().status,
            ChannelStatus::Flagged
        );
    }
}
