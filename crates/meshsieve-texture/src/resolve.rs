//! Material resolution: channel references to concrete data.
//!
//! Walks every material slot of a model and follows each semantic channel
//! through the image arena, decoding through the shared cache. Two slots
//! referencing the same underlying image end up holding the same decoded
//! buffer. A channel the material claims but the asset cannot supply is an
//! error; a channel that simply is not bound resolves to `Absent`.

use crate::buffer::PixelBuffer;
use crate::cache::DecodeCache;
use meshsieve_core::{AssetError, ChannelRole};
use meshsieve_geometry::{ChannelRef, GeometryModel};
use std::sync::Arc;

/// One resolved channel: decoded pixels, a constant, or nothing.
#[derive(Debug, Clone)]
pub enum ResolvedChannel {
    Image(Arc<PixelBuffer>),
    Constant([f64; 4]),
    Absent,
}

impl ResolvedChannel {
    pub fn is_absent(&self) -> bool {
        matches!(self, ResolvedChannel::Absent)
    }
}

/// All four channels of one material slot, resolved.
#[derive(Debug, Clone)]
pub struct MaterialBinding {
    pub slot: String,
    pub base_color: ResolvedChannel,
    pub metallic_roughness: ResolvedChannel,
    pub normal_map: ResolvedChannel,
    pub emissive: ResolvedChannel,
}

impl MaterialBinding {
    pub fn channel(&self, role: ChannelRole) -> &ResolvedChannel {
        match role {
            ChannelRole::BaseColor => &self.base_color,
            ChannelRole::MetallicRoughness => &self.metallic_roughness,
            ChannelRole::NormalMap => &self.normal_map,
            ChannelRole::Emissive => &self.emissive,
        }
    }
}

/// Resolve every material slot of `model`.
pub fn resolve(
    model: &GeometryModel,
    cache: &DecodeCache,
) -> Result<Vec<MaterialBinding>, AssetError> {
    model
        .material_slots()
        .iter()
        .map(|slot| {
            Ok(MaterialBinding {
                slot: slot.name.clone(),
                base_color: resolve_channel(
                    model,
                    cache,
                    &slot.name,
                    ChannelRole::BaseColor,
                    &slot.channels.base_color,
                )?,
                metallic_roughness: resolve_channel(
                    model,
                    cache,
                    &slot.name,
                    ChannelRole::MetallicRoughness,
                    &slot.channels.metallic_roughness,
                )?,
                normal_map: resolve_channel(
                    model,
                    cache,
                    &slot.name,
                    ChannelRole::NormalMap,
                    &slot.channels.normal_map,
                )?,
                emissive: resolve_channel(
                    model,
                    cache,
                    &slot.name,
                    ChannelRole::Emissive,
                    &slot.channels.emissive,
                )?,
            })
        })
        .collect()
}

fn resolve_channel(
    model: &GeometryModel,
    cache: &DecodeCache,
    slot: &str,
    role: ChannelRole,
    channel: &ChannelRef,
) -> Result<ResolvedChannel, AssetError> {
    match channel {
        ChannelRef::Image(index) => {
            let resource = &model.images()[*index];
            Ok(ResolvedChannel::Image(cache.get_or_decode(resource)?))
        }
        ChannelRef::Constant(value) => Ok(ResolvedChannel::Constant(*value)),
        ChannelRef::Absent => Ok(ResolvedChannel::Absent),
        ChannelRef::Unresolvable(detail) => Err(AssetError::MissingChannel {
            slot: slot.to_string(),
            role: role.file_suffix(),
            detail: detail.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png_out::{write_rgba_to_vec_with_hash, PngConfig};
    use meshsieve_geometry::{ChannelBindings, ImageResource, MaterialSlot};

    fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
        let buffer = PixelBuffer::uniform(2, 2, rgba);
        write_rgba_to_vec_with_hash(&buffer, &PngConfig::default())
            .unwrap()
            .0
    }

    fn model_with_slots(
        slots: Vec<MaterialSlot>,
        images: Vec<ImageResource>,
    ) -> GeometryModel {
        GeometryModel::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
            None,
            slots,
            images,
        )
        .unwrap()
    }

    fn slot(name: &str, channels: ChannelBindings) -> MaterialSlot {
        MaterialSlot {
            name: name.into(),
            face_ranges: vec![0..1],
            channels,
        }
    }

    #[test]
    fn test_shared_image_resolves_to_one_buffer() {
        let image = ImageResource::new("image/png", png_bytes([5, 5, 5, 255]));
        let bindings = ChannelBindings {
            base_color: ChannelRef::Image(0),
            ..ChannelBindings::absent()
        };
        let model = model_with_slots(
            vec![slot("a", bindings.clone()), slot("b", bindings)],
            vec![image],
        );

        let cache = DecodeCache::new();
        let resolved = resolve(&model, &cache).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(cache.decode_count(), 1);

        let (ResolvedChannel::Image(a), ResolvedChannel::Image(b)) =
            (&resolved[0].base_color, &resolved[1].base_color)
        else {
            panic!("expected image channels");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_constants_and_absent_pass_through() {
        let bindings = ChannelBindings {
            base_color: ChannelRef::Constant([0.8, 0.1, 0.1, 1.0]),
            metallic_roughness: ChannelRef::Constant([0.0, 0.9, 0.0, 1.0]),
            ..ChannelBindings::absent()
        };
        let model = model_with_slots(vec![slot("m", bindings)], vec![]);
        let resolved = resolve(&model, &DecodeCache::new()).unwrap();

        assert!(matches!(
            resolved[0].base_color,
            ResolvedChannel::Constant(_)
        ));
        assert!(resolved[0].normal_map.is_absent());
        assert!(resolved[0].emissive.is_absent());
    }

    #[test]
    fn test_unresolvable_channel_is_missing_channel_error() {
        let bindings = ChannelBindings {
            normal_map: ChannelRef::Unresolvable("external uri 'normal.png'".into()),
            ..ChannelBindings::absent()
        };
        let model = model_with_slots(vec![slot("m", bindings)], vec![]);
        let err = resolve(&model, &DecodeCache::new()).unwrap_err();
        match err {
            AssetError::MissingChannel { slot, role, .. } => {
                assert_eq!(slot, "m");
                assert_eq!(role, "normal_map");
            }
            other => panic!("expected MissingChannel, got {other:?}"),
        }
    }
}
