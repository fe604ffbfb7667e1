//! Channel normalization into the fixed output schema.
//!
//! Every present channel becomes an 8-bit RGBA buffer: decoded images are
//! downscaled (never upscaled) when they exceed the configured size, and
//! constant-valued channels are expanded into small uniform buffers so
//! downstream consumers never branch on "constant vs. image". Normal maps
//! get a tangent-space plausibility check; suspicious ones are flagged in
//! the manifest, never silently corrected.

use crate::buffer::PixelBuffer;
use crate::png_out::{self, PngConfig, PngError};
use crate::resolve::{MaterialBinding, ResolvedChannel};
use image::imageops::FilterType;
use meshsieve_core::{
    AssetError, ChannelRole, ManifestEntry, PipelineConfig, TextureManifest,
};
use std::path::Path;

/// Tangent-space normal maps encode Z in blue with a strong positive bias;
/// a mean blue below this reads as object-space (or not a normal map).
const TANGENT_BLUE_BIAS_MIN: f64 = 0.5;

/// One normalized channel.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedChannel {
    Present {
        buffer: PixelBuffer,
        /// Set when the channel is usable but suspicious.
        flag: Option<String>,
    },
    /// Explicit marker; consumers must not invent defaults.
    Absent,
}

impl NormalizedChannel {
    pub fn is_present(&self) -> bool {
        matches!(self, NormalizedChannel::Present { .. })
    }
}

/// The extractor's final output for one asset: one entry per channel role,
/// produced once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTextureSet {
    channels: Vec<(ChannelRole, NormalizedChannel)>,
}

impl NormalizedTextureSet {
    pub fn channel(&self, role: ChannelRole) -> &NormalizedChannel {
        &self
            .channels
            .iter()
            .find(|(r, _)| *r == role)
            .expect("all roles populated")
            .1
    }

    /// Write one PNG per present channel under `dir`, named
    /// `{asset_id}_{channel_role}.png`, and return the manifest.
    pub fn save(
        &self,
        dir: &Path,
        asset_id: &str,
        png: &PngConfig,
    ) -> Result<TextureManifest, AssetError> {
        let mut entries = Vec::with_capacity(self.channels.len());
        for (role, channel) in &self.channels {
            match channel {
                NormalizedChannel::Absent => entries.push(ManifestEntry::absent(*role)),
                NormalizedChannel::Present { buffer, flag } => {
                    let file = format!("{asset_id}_{}.png", role.file_suffix());
                    let (bytes, hash) = png_out::write_rgba_to_vec_with_hash(buffer, png)
                        .map_err(png_to_asset_error)?;
                    std::fs::write(dir.join(&file), bytes)?;
                    entries.push(match flag {
                        Some(flag) => ManifestEntry::flagged(*role, file, hash, flag.clone()),
                        None => ManifestEntry::present(*role, file, hash),
                    });
                }
            }
        }
        Ok(TextureManifest::new(asset_id, entries))
    }
}

/// Normalize resolved bindings into one buffer per channel role.
///
/// When several material slots bind the same role, the first slot in model
/// order wins; the pipeline emits one texture set per asset.
pub fn normalize(bindings: &[MaterialBinding], config: &PipelineConfig) -> NormalizedTextureSet {
    let channels = ChannelRole::ALL
        .iter()
        .map(|&role| {
            let source = bindings
                .iter()
                .map(|b| b.channel(role))
                .find(|c| !c.is_absent());
            (role, normalize_channel(role, source, config))
        })
        .collect();
    NormalizedTextureSet { channels }
}

fn normalize_channel(
    role: ChannelRole,
    source: Option<&ResolvedChannel>,
    config: &PipelineConfig,
) -> NormalizedChannel {
    let buffer = match source {
        None | Some(ResolvedChannel::Absent) => return NormalizedChannel::Absent,
        Some(ResolvedChannel::Constant(value)) => {
            PixelBuffer::uniform(
                config.constant_fill_size,
                config.constant_fill_size,
                quantize(*value),
            )
        }
        Some(ResolvedChannel::Image(image)) => downscale_to_fit(image, config.max_texture_size),
    };

    let flag = (role == ChannelRole::NormalMap
        && buffer.mean_channel(2) < TANGENT_BLUE_BIAS_MIN)
        .then(|| {
            format!(
                "suspected object-space normal map (mean blue {:.3} < {TANGENT_BLUE_BIAS_MIN})",
                buffer.mean_channel(2)
            )
        });
    NormalizedChannel::Present { buffer, flag }
}

fn quantize(value: [f64; 4]) -> [u8; 4] {
    value.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Downscale so the longest side fits `max_side`, preserving aspect ratio.
/// Sources already within bounds pass through untouched, never upscaled.
fn downscale_to_fit(buffer: &PixelBuffer, max_side: u32) -> PixelBuffer {
    let side = buffer.max_side();
    if side <= max_side {
        return buffer.clone();
    }
    let scale = |v: u32| ((v as u64 * max_side as u64 / side as u64) as u32).max(1);
    let (width, height) = (scale(buffer.width), scale(buffer.height));

    let source = image::RgbaImage::from_raw(buffer.width, buffer.height, buffer.data.clone())
        .expect("buffer dimensions are internally consistent");
    let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
    PixelBuffer {
        width,
        height,
        data: resized.into_raw(),
    }
}

fn png_to_asset_error(error: PngError) -> AssetError {
    match error {
        PngError::Io(io) => AssetError::Io(io),
        PngError::Encoding(e) => {
            AssetError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshsieve_core::ChannelStatus;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn binding(role_channels: Vec<(ChannelRole, ResolvedChannel)>) -> MaterialBinding {
        let mut b = MaterialBinding {
            slot: "m".into(),
            base_color: ResolvedChannel::Absent,
            metallic_roughness: ResolvedChannel::Absent,
            normal_map: ResolvedChannel::Absent,
            emissive: ResolvedChannel::Absent,
        };
        for (role, channel) in role_channels {
            match role {
                ChannelRole::BaseColor => b.base_color = channel,
                ChannelRole::MetallicRoughness => b.metallic_roughness = channel,
                ChannelRole::NormalMap => b.normal_map = channel,
                ChannelRole::Emissive => b.emissive = channel,
            }
        }
        b
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            max_texture_size: 4,
            constant_fill_size: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_constant_becomes_uniform_buffer() {
        let bindings = vec![binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Constant([1.0, 0.5, 0.0, 1.0]),
        )])];
        let set = normalize(&bindings, &config());
        let NormalizedChannel::Present { buffer, flag } = set.channel(ChannelRole::BaseColor)
        else {
            panic!("expected present channel");
        };
        assert!(flag.is_none());
        assert_eq!((buffer.width, buffer.height), (2, 2));
        assert_eq!(buffer.get(0, 0), [255, 128, 0, 255]);
        assert_eq!(buffer.get(1, 1), [255, 128, 0, 255]);
    }

    #[test]
    fn test_oversized_image_downscaled_preserving_aspect() {
        let image = Arc::new(PixelBuffer::uniform(8, 4, [10, 10, 10, 255]));
        let bindings = vec![binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Image(image),
        )])];
        let set = normalize(&bindings, &config());
        let NormalizedChannel::Present { buffer, .. } = set.channel(ChannelRole::BaseColor)
        else {
            panic!("expected present channel");
        };
        assert_eq!((buffer.width, buffer.height), (4, 2));
    }

    #[test]
    fn test_small_image_never_upscaled() {
        let image = Arc::new(PixelBuffer::uniform(2, 2, [10, 10, 10, 255]));
        let bindings = vec![binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Image(Arc::clone(&image)),
        )])];
        let set = normalize(&bindings, &config());
        let NormalizedChannel::Present { buffer, .. } = set.channel(ChannelRole::BaseColor)
        else {
            panic!("expected present channel");
        };
        assert_eq!(buffer, image.as_ref());
    }

    #[test]
    fn test_tangent_space_normal_map_unflagged() {
        let image = Arc::new(PixelBuffer::uniform(2, 2, [128, 128, 255, 255]));
        let bindings = vec![binding(vec![(
            ChannelRole::NormalMap,
            ResolvedChannel::Image(image),
        )])];
        let set = normalize(&bindings, &config());
        let NormalizedChannel::Present { flag, .. } = set.channel(ChannelRole::NormalMap)
        else {
            panic!("expected present channel");
        };
        assert!(flag.is_none());
    }

    #[test]
    fn test_low_blue_bias_normal_map_flagged_not_corrected() {
        let original = PixelBuffer::uniform(2, 2, [128, 128, 10, 255]);
        let bindings = vec![binding(vec![(
            ChannelRole::NormalMap,
            ResolvedChannel::Image(Arc::new(original.clone())),
        )])];
        let set = normalize(&bindings, &config());
        let NormalizedChannel::Present { buffer, flag } = set.channel(ChannelRole::NormalMap)
        else {
            panic!("expected present channel");
        };
        assert!(flag.as_deref().unwrap().contains("object-space"));
        // Flagged, but the pixels are untouched.
        assert_eq!(buffer, &original);
    }

    #[test]
    fn test_missing_roles_are_explicitly_absent() {
        let set = normalize(&[], &config());
        for role in ChannelRole::ALL {
            assert_eq!(set.channel(role), &NormalizedChannel::Absent);
        }
    }

    #[test]
    fn test_first_slot_wins_per_role() {
        let first = binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Constant([1.0, 0.0, 0.0, 1.0]),
        )]);
        let second = binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Constant([0.0, 1.0, 0.0, 1.0]),
        )]);
        let set = normalize(&[first, second], &config());
        let NormalizedChannel::Present { buffer, .. } = set.channel(ChannelRole::BaseColor)
        else {
            panic!("expected present channel");
        };
        assert_eq!(buffer.get(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_normalize_twice_is_byte_identical() {
        let image = Arc::new(PixelBuffer::uniform(8, 8, [200, 100, 50, 255]));
        let bindings = vec![binding(vec![
            (
                ChannelRole::BaseColor,
                ResolvedChannel::Image(Arc::clone(&image)),
            ),
            (
                ChannelRole::MetallicRoughness,
                ResolvedChannel::Constant([0.0, 0.9, 0.0, 1.0]),
            ),
        ])];
        let config = config();
        let png = PngConfig::default();

        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let manifest_a = normalize(&bindings, &config)
            .save(dir_a.path(), "asset", &png)
            .unwrap();
        let manifest_b = normalize(&bindings, &config)
            .save(dir_b.path(), "asset", &png)
            .unwrap();

        assert_eq!(manifest_a, manifest_b);
        for entry in &manifest_a.channels {
            if let Some(file) = &entry.file {
                let a = std::fs::read(dir_a.path().join(file)).unwrap();
                let b = std::fs::read(dir_b.path().join(file)).unwrap();
                assert_eq!(a, b, "channel {file} differs between runs");
            }
        }
    }

    #[test]
    fn test_save_writes_manifest_statuses() {
        let bindings = vec![binding(vec![(
            ChannelRole::BaseColor,
            ResolvedChannel::Constant([0.5, 0.5, 0.5, 1.0]),
        )])];
        let dir = tempfile::tempdir().unwrap();
        let manifest = normalize(&bindings, &config())
            .save(dir.path(), "asset", &PngConfig::default())
            .unwrap();

        assert_eq!(
            manifest.channel(ChannelRole::BaseColor).unwrap().status,
            ChannelStatus::Present
        );
        assert_eq!(
            manifest.channel(ChannelRole::Emissive).unwrap().status,
            ChannelStatus::Absent
        );
        assert!(dir.path().join("asset_base_color.png").exists());
        assert!(!dir.path().join("asset_emissive.png").exists());
    }
}
