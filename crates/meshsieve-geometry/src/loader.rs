//! GLB loading: raw bytes to [`GeometryModel`].
//!
//! Accessor data is read directly against the GLB binary chunk rather than
//! through higher-level import helpers, so malformed offsets degrade into
//! load errors instead of panics. All primitives of all meshes are
//! concatenated into one model with base-vertex offsets; triangle strips
//! and fans are expanded with a fixed rule so everything downstream sees
//! plain triangles.

use crate::model::{
    ChannelBindings, ChannelRef, GeometryModel, ImageResource, MaterialSlot,
};
use gltf::mesh::Mode;
use meshsieve_core::AssetError;
use std::collections::HashMap;
use std::path::Path;

/// Load a GLB file from disk.
pub fn load_glb_file(path: &Path) -> Result<GeometryModel, AssetError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AssetError::Load(format!("{}: {e}", path.display())))?;
    load_glb(&bytes)
}

/// Load a GLB asset from raw bytes.
pub fn load_glb(bytes: &[u8]) -> Result<GeometryModel, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .map_err(|e| AssetError::Load(format!("not a readable GLB: {e}")))?;
    let doc = &gltf.document;
    let blob = gltf
        .blob
        .as_deref()
        .or_else(|| extract_binary_chunk(bytes))
        .unwrap_or(&[]);

    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut normals_complete = true;

    // gltf material index -> slot under construction
    let mut slots: HashMap<Option<usize>, MaterialSlot> = HashMap::new();
    let mut slot_order: Vec<Option<usize>> = Vec::new();
    let mut arena = ImageArena::default();

    for mesh in doc.meshes() {
        for primitive in mesh.primitives() {
            match primitive.mode() {
                Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan => {}
                other => {
                    return Err(AssetError::UnsupportedTopology(format!(
                        "primitive mode {other:?} has no triangulable faces"
                    )));
                }
            }

            let Some(positions_accessor) = primitive.get(&gltf::Semantic::Positions) else {
                continue;
            };
            let base_vertex = vertices.len() as u32;
            let positions = read_vec3(&positions_accessor, blob);
            let position_count = positions.len();
            vertices.extend(positions);

            if let Some(normals_accessor) = primitive.get(&gltf::Semantic::Normals) {
                let read = read_vec3(&normals_accessor, blob);
                if read.len() == position_count {
                    normals.extend(read);
                } else {
                    normals_complete = false;
                }
            } else {
                normals_complete = false;
            }

            let indices = match primitive.indices() {
                Some(accessor) => read_indices(&accessor, blob),
                None => (0..position_count as u32).collect(),
            };

            let face_start = faces.len() as u32;
            expand_triangles(primitive.mode(), &indices, base_vertex, &mut faces);
            let face_range = face_start..faces.len() as u32;

            let material = primitive.material();
            let key = material.index();
            let slot = slots.entry(key).or_insert_with(|| {
                slot_order.push(key);
                MaterialSlot {
                    name: material
                        .name()
                        .map(str::to_owned)
                        .unwrap_or_else(|| match key {
                            Some(i) => format!("material_{i}"),
                            None => "default".to_owned(),
                        }),
                    face_ranges: Vec::new(),
                    channels: resolve_channel_refs(&material, blob, &mut arena),
                }
            });
            slot.face_ranges.push(face_range);
        }
    }

    let normals = (normals_complete && normals.len() == vertices.len()).then_some(normals);
    let material_slots = slot_order
        .into_iter()
        .filter_map(|key| slots.remove(&key))
        .collect();

    GeometryModel::new(vertices, faces, normals, material_slots, arena.images)
}

/// Expand an index list into triangles. Strips alternate winding so every
/// face keeps the source orientation; fans pivot on the first index. Strip
/// and fan triangles that collapse onto a repeated index (restart padding)
/// are dropped; explicit `Triangles` are kept exactly as authored.
fn expand_triangles(mode: Mode, indices: &[u32], base_vertex: u32, faces: &mut Vec<[u32; 3]>) {
    match mode {
        Mode::Triangles => {
            for tri in indices.chunks_exact(3) {
                faces.push([
                    tri[0] + base_vertex,
                    tri[1] + base_vertex,
                    tri[2] + base_vertex,
                ]);
            }
        }
        Mode::TriangleStrip => {
            for i in 0..indices.len().saturating_sub(2) {
                let (a, b, c) = if i % 2 == 0 {
                    (indices[i], indices[i + 1], indices[i + 2])
                } else {
                    (indices[i + 1], indices[i], indices[i + 2])
                };
                if a != b && b != c && a != c {
                    faces.push([a + base_vertex, b + base_vertex, c + base_vertex]);
                }
            }
        }
        Mode::TriangleFan => {
            for i in 1..indices.len().saturating_sub(1) {
                let (a, b, c) = (indices[0], indices[i], indices[i + 1]);
                if a != b && b != c && a != c {
                    faces.push([a + base_vertex, b + base_vertex, c + base_vertex]);
                }
            }
        }
        _ => unreachable!("non-triangle modes rejected before expansion"),
    }
}

/// Arena builder that deduplicates embedded images by gltf index and by
/// content hash, so byte-identical images share one entry.
#[derive(Default)]
struct ImageArena {
    images: Vec<ImageResource>,
    by_gltf_index: HashMap<usize, usize>,
    by_key: HashMap<String, usize>,
}

impl ImageArena {
    fn intern(&mut self, image: &gltf::image::Image, blob: &[u8]) -> ChannelRef {
        if let Some(&index) = self.by_gltf_index.get(&image.index()) {
            return ChannelRef::Image(index);
        }
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let Some(bytes) = slice_view(blob, view.offset(), view.length()) else {
                    return ChannelRef::Unresolvable(format!(
                        "image {} buffer view out of bounds",
                        image.index()
                    ));
                };
                let resource = ImageResource::new(mime_type, bytes.to_vec());
                let index = match self.by_key.get(&resource.key) {
                    Some(&existing) => existing,
                    None => {
                        self.by_key.insert(resource.key.clone(), self.images.len());
                        self.images.push(resource);
                        self.images.len() - 1
                    }
                };
                self.by_gltf_index.insert(image.index(), index);
                ChannelRef::Image(index)
            }
            gltf::image::Source::Uri { uri, .. } => ChannelRef::Unresolvable(format!(
                "image {} references external uri '{uri}'",
                image.index()
            )),
        }
    }
}

fn slice_view(blob: &[u8], offset: usize, length: usize) -> Option<&[u8]> {
    blob.get(offset..offset.checked_add(length)?)
}

/// Map one glTF material onto the four semantic channel roles.
///
/// Textured channels intern their image into the arena. Untextured base
/// color and metallic-roughness fall back to the factor constants the
/// format defines; an untextured emissive is absent unless its factor is
/// non-zero; a normal map is only ever a texture.
fn resolve_channel_refs(
    material: &gltf::Material,
    blob: &[u8],
    arena: &mut ImageArena,
) -> ChannelBindings {
    let pbr = material.pbr_metallic_roughness();

    let base_color = match pbr.base_color_texture() {
        Some(info) => arena.intern(&info.texture().source(), blob),
        None => {
            let f = pbr.base_color_factor();
            ChannelRef::Constant([f[0] as f64, f[1] as f64, f[2] as f64, f[3] as f64])
        }
    };

    let metallic_roughness = match pbr.metallic_roughness_texture() {
        Some(info) => arena.intern(&info.texture().source(), blob),
        None => ChannelRef::Constant([
            pbr.metallic_factor() as f64,
            pbr.roughness_factor() as f64,
            0.0,
            1.0,
        ]),
    };

    let normal_map = match material.normal_texture() {
        Some(normal) => arena.intern(&normal.texture().source(), blob),
        None => ChannelRef::Absent,
    };

    let emissive = match material.emissive_texture() {
        Some(info) => arena.intern(&info.texture().source(), blob),
        None => {
            let f = material.emissive_factor();
            if f.iter().any(|&v| v > 0.0) {
                ChannelRef::Constant([f[0] as f64, f[1] as f64, f[2] as f64, 1.0])
            } else {
                ChannelRef::Absent
            }
        }
    };

    ChannelBindings {
        base_color,
        metallic_roughness,
        normal_map,
        emissive,
    }
}

/// Extract the binary chunk from raw GLB bytes.
///
/// Layout: 12-byte header, then length-prefixed chunks; the JSON chunk
/// comes first, the binary chunk (if any) second.
fn extract_binary_chunk(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() <= 12 {
        return None;
    }
    let json_len = u32::from_le_bytes(bytes.get(12..16)?.try_into().ok()?) as usize;
    let bin_header = 12 + 8 + json_len;
    let bin_len =
        u32::from_le_bytes(bytes.get(bin_header..bin_header + 4)?.try_into().ok()?) as usize;
    let bin_start = bin_header + 8;
    bytes.get(bin_start..bin_start.checked_add(bin_len)?)
}

/// Read an accessor of vec3 f32 values against the binary chunk, honoring
/// byte stride. Truncated buffers yield short reads, caught later by the
/// model's count invariants.
fn read_vec3(accessor: &gltf::Accessor, data: &[u8]) -> Vec<[f32; 3]> {
    let mut out = Vec::with_capacity(accessor.count());
    let Some(view) = accessor.view() else {
        return out;
    };
    let offset = view.offset() + accessor.offset();
    let stride = view.stride().unwrap_or(12);
    for i in 0..accessor.count() {
        let start = offset + i * stride;
        if start + 12 > data.len() {
            break;
        }
        let x = f32::from_le_bytes(data[start..start + 4].try_into().unwrap());
        let y = f32::from_le_bytes(data[start + 4..start + 8].try_into().unwrap());
        let z = f32::from_le_bytes(data[start + 8..start + 12].try_into().unwrap());
        out.push([x, y, z]);
    }
    out
}

/// Read an index accessor (u8/u16/u32 components) against the binary chunk.
fn read_indices(accessor: &gltf::Accessor, data: &[u8]) -> Vec<u32> {
    use gltf::accessor::DataType;

    let mut out = Vec::with_capacity(accessor.count());
    let Some(view) = accessor.view() else {
        return out;
    };
    let component_size = match accessor.data_type() {
        DataType::U8 => 1,
        DataType::U16 => 2,
        DataType::U32 => 4,
        _ => return out,
    };
    let offset = view.offset() + accessor.offset();
    let stride = view.stride().unwrap_or(component_size);
    for i in 0..accessor.count() {
        let start = offset + i * stride;
        if start + component_size > data.len() {
            break;
        }
        let index = match accessor.data_type() {
            DataType::U8 => data[start] as u32,
            DataType::U16 => u16::from_le_bytes(data[start..start + 2].try_into().unwrap()) as u32,
            DataType::U32 => u32::from_le_bytes(data[start..start + 4].try_into().unwrap()),
            _ => unreachable!(),
        };
        out.push(index);
    }
    out
}
