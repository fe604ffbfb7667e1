//! In-memory representation of a loaded mesh scene.
//!
//! A [`GeometryModel`] is constructed once per asset load, checked against
//! its structural invariants at that point, and never mutated afterwards.
//! Material channels hold lookup keys into the image arena rather than
//! owning pixel data, so two materials referencing the same embedded image
//! share one arena entry and one eventual decode.

use meshsieve_core::AssetError;
use std::ops::Range;

/// An embedded image resource, still in its encoded form.
#[derive(Debug, Clone)]
pub struct ImageResource {
    /// Content-derived identifier: BLAKE3 hex of the encoded bytes. Stable
    /// across assets, which is what lets the decode cache share work.
    pub key: String,
    /// MIME type as declared by the asset ("image/png", "image/jpeg").
    pub mime: String,
    /// Encoded bytes, copied out of the binary chunk.
    pub bytes: Vec<u8>,
}

impl ImageResource {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            key: blake3::hash(&bytes).to_hex().to_string(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// Where one semantic channel of a material gets its data.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRef {
    /// Index into [`GeometryModel::images`].
    Image(usize),
    /// A constant value covering the whole surface (RGBA, or
    /// `[metallic, roughness, 0, 1]` for the metallic-roughness role).
    Constant([f64; 4]),
    /// Not bound in the source material.
    Absent,
    /// Claimed by the material but not locatable in this asset (external
    /// URI, dangling texture index). Resolving this is an error.
    Unresolvable(String),
}

impl ChannelRef {
    pub fn is_absent(&self) -> bool {
        matches!(self, ChannelRef::Absent)
    }
}

/// The four semantic channels of one material slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBindings {
    pub base_color: ChannelRef,
    pub metallic_roughness: ChannelRef,
    pub normal_map: ChannelRef,
    pub emissive: ChannelRef,
}

impl ChannelBindings {
    /// Bindings with every channel absent.
    pub fn absent() -> Self {
        Self {
            base_color: ChannelRef::Absent,
            metallic_roughness: ChannelRef::Absent,
            normal_map: ChannelRef::Absent,
            emissive: ChannelRef::Absent,
        }
    }
}

/// A named material slot and the faces bound to it.
#[derive(Debug, Clone)]
pub struct MaterialSlot {
    pub name: String,
    /// Contiguous face ranges bound to this slot. One range per source
    /// primitive, in load order.
    pub face_ranges: Vec<Range<u32>>,
    pub channels: ChannelBindings,
}

impl MaterialSlot {
    /// Total number of faces bound to this slot.
    pub fn face_count(&self) -> usize {
        self.face_ranges.iter().map(|r| r.len()).sum()
    }
}

/// An immutable mesh scene: geometry, per-vertex normals if the asset
/// carried them, material slots, and the embedded image arena.
#[derive(Debug, Clone)]
pub struct GeometryModel {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    material_slots: Vec<MaterialSlot>,
    images: Vec<ImageResource>,
}

impl GeometryModel {
    /// Build a model, enforcing the structural invariants:
    /// every face index is in vertex bounds, normals (when present) are
    /// per-vertex, every slot's face ranges lie inside the face list, and
    /// every image channel ref points into the arena.
    pub fn new(
        vertices: Vec<[f32; 3]>,
        faces: Vec<[u32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        material_slots: Vec<MaterialSlot>,
        images: Vec<ImageResource>,
    ) -> Result<Self, AssetError> {
        let vertex_count = vertices.len() as u32;
        for (i, face) in faces.iter().enumerate() {
            if face.iter().any(|&v| v >= vertex_count) {
                return Err(AssetError::Load(format!(
                    "face {i} references vertex out of bounds (vertex count {vertex_count})"
                )));
            }
        }
        if let Some(ref normals) = normals {
            if normals.len() != vertices.len() {
                return Err(AssetError::Load(format!(
                    "normal count {} does not match vertex count {}",
                    normals.len(),
                    vertices.len()
                )));
            }
        }
        let face_count = faces.len() as u32;
        for slot in &material_slots {
            for range in &slot.face_ranges {
                if range.start > range.end || range.end > face_count {
                    return Err(AssetError::Load(format!(
                        "material slot '{}' binds face range {}..{} outside face count {}",
                        slot.name, range.start, range.end, face_count
                    )));
                }
            }
            for channel in [
                &slot.channels.base_color,
                &slot.channels.metallic_roughness,
                &slot.channels.normal_map,
                &slot.channels.emissive,
            ] {
                if let ChannelRef::Image(index) = channel {
                    if *index >= images.len() {
                        return Err(AssetError::Load(format!(
                            "material slot '{}' references image {} outside arena of {}",
                            slot.name,
                            index,
                            images.len()
                        )));
                    }
                }
            }
        }
        Ok(Self {
            vertices,
            faces,
            normals,
            material_slots,
            images,
        })
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn material_slots(&self) -> &[MaterialSlot] {
        &self.material_slots
    }

    pub fn images(&self) -> &[ImageResource] {
        &self.images
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The three corner positions of face `index`.
    #[inline]
    pub fn face_positions(&self, index: usize) -> [[f32; 3]; 3] {
        let [a, b, c] = self.faces[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }
}
