//! Loader tests against hand-assembled GLB files.
//!
//! Fixtures are built chunk by chunk (12-byte header, JSON chunk, BIN
//! chunk) so the tests exercise the same byte layout real assets have.

use meshsieve_geometry::{load_glb, ChannelRef};
use serde_json::json;

const JSON_CHUNK: u32 = 0x4E4F_534A;
const BIN_CHUNK: u32 = 0x004E_4942;

/// Assemble a GLB from a glTF JSON document and a binary chunk.
fn build_glb(json: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(json).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin.to_vec();
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&JSON_CHUNK.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&BIN_CHUNK.to_le_bytes());
    out.extend_from_slice(&bin_bytes);
    out
}

fn cube_positions() -> Vec<[f32; 3]> {
    vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ]
}

fn cube_indices() -> Vec<u16> {
    vec![
        0, 2, 1, 0, 3, 2, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 1, 5, 0, 5, 4, // -Y
        3, 6, 2, 3, 7, 6, // +Y
        0, 4, 7, 0, 7, 3, // -X
        1, 2, 6, 1, 6, 5, // +X
    ]
}

/// A cube GLB with one material; `image_bytes` embeds a base-color texture.
fn cube_glb(image_bytes: Option<&[u8]>) -> Vec<u8> {
    let positions = cube_positions();
    let indices = cube_indices();

    let mut bin = Vec::new();
    for p in &positions {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    let pos_len = bin.len();
    for i in &indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    let idx_len = bin.len() - pos_len;

    let mut buffer_views = vec![
        json!({"buffer": 0, "byteOffset": 0, "byteLength": pos_len}),
        json!({"buffer": 0, "byteOffset": pos_len, "byteLength": idx_len}),
    ];
    let mut material = json!({
        "name": "cube_material",
        "pbrMetallicRoughness": {
            "baseColorFactor": [0.8, 0.1, 0.1, 1.0],
            "metallicFactor": 0.0,
            "roughnessFactor": 0.9
        }
    });

    if let Some(bytes) = image_bytes {
        let offset = bin.len();
        bin.extend_from_slice(bytes);
        buffer_views.push(json!({
            "buffer": 0, "byteOffset": offset, "byteLength": bytes.len()
        }));
        material["pbrMetallicRoughness"]["baseColorTexture"] = json!({"index": 0});
    }

    let mut doc = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{
            "primitives": [{
                "attributes": {"POSITION": 0},
                "indices": 1,
                "material": 0,
                "mode": 4
            }]
        }],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": positions.len(),
                "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0]
            },
            {
                "bufferView": 1, "componentType": 5123, "count": indices.len(),
                "type": "SCALAR"
            }
        ],
        "bufferViews": buffer_views,
        "buffers": [{"byteLength": bin.len()}],
        "materials": [material]
    });
    if image_bytes.is_some() {
        doc["textures"] = json!([{"source": 0}]);
        doc["images"] = json!([{"bufferView": 2, "mimeType": "image/png"}]);
    }
    build_glb(&doc, &bin)
}

#[test]
fn test_cube_geometry_loads() {
    let model = load_glb(&cube_glb(None)).unwrap();
    assert_eq!(model.vertex_count(), 8);
    assert_eq!(model.face_count(), 12);
    assert!(model.normals().is_none());
    assert_eq!(model.faces()[0], [0, 2, 1]);
}

#[test]
fn test_material_without_texture_yields_factor_constants() {
    let model = load_glb(&cube_glb(None)).unwrap();
    let slots = model.material_slots();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].name, "cube_material");
    assert_eq!(slots[0].face_count(), 12);

    match slots[0].channels.base_color {
        ChannelRef::Constant(rgba) => {
            assert!((rgba[0] - 0.8).abs() < 1e-6);
            assert!((rgba[3] - 1.0).abs() < 1e-6);
        }
        ref other => panic!("expected constant base color, got {other:?}"),
    }
    match slots[0].channels.metallic_roughness {
        ChannelRef::Constant(mr) => {
            assert!(mr[0].abs() < 1e-6);
            assert!((mr[1] - 0.9).abs() < 1e-6);
        }
        ref other => panic!("expected constant metallic-roughness, got {other:?}"),
    }
    assert!(slots[0].channels.normal_map.is_absent());
    assert!(slots[0].channels.emissive.is_absent());
}

#[test]
fn test_embedded_texture_lands_in_arena() {
    let fake_png = b"\x89PNG\r\n\x1a\nnot-really-a-png";
    let model = load_glb(&cube_glb(Some(fake_png))).unwrap();
    assert_eq!(model.images().len(), 1);
    assert_eq!(model.images()[0].mime, "image/png");
    assert_eq!(model.images()[0].bytes, fake_png);

    match model.material_slots()[0].channels.base_color {
        ChannelRef::Image(index) => assert_eq!(index, 0),
        ref other => panic!("expected image base color, got {other:?}"),
    }
}

#[test]
fn test_points_primitive_is_unsupported_topology() {
    let positions = cube_positions();
    let mut bin = Vec::new();
    for p in &positions {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    let doc = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{
            "primitives": [{"attributes": {"POSITION": 0}, "mode": 0}]
        }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": positions.len(),
            "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0]
        }],
        "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": bin.len()}],
        "buffers": [{"byteLength": bin.len()}]
    });
    let err = load_glb(&build_glb(&doc, &bin)).unwrap_err();
    assert!(matches!(
        err,
        meshsieve_core::AssetError::UnsupportedTopology(_)
    ));
}

#[test]
fn test_unindexed_triangles_load_sequentially() {
    let positions = [
        [0.0f32, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let mut bin = Vec::new();
    for p in &positions {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    let doc = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{
            "primitives": [{"attributes": {"POSITION": 0}, "mode": 4}]
        }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": positions.len(),
            "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": bin.len()}],
        "buffers": [{"byteLength": bin.len()}]
    });
    let model = load_glb(&build_glb(&doc, &bin)).unwrap();
    assert_eq!(model.face_count(), 1);
    assert_eq!(model.faces()[0], [0, 1, 2]);
}
