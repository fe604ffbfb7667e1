//! Conversion of a validated model into Wavefront OBJ.
//!
//! The emit step is a pure structural remap: vertex order and face winding
//! are preserved exactly, nothing is welded, split, or re-indexed. Floats
//! are written with fixed precision so the same model always serializes to
//! the same bytes.

use crate::model::GeometryModel;
use meshsieve_core::AssetError;
use std::fmt::Write as _;
use std::path::Path;

/// The portable-format representation of a converted mesh.
///
/// Produced once per passing asset and written once.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedMesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
}

impl ConvertedMesh {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Serialize to OBJ text. Face indices are 1-based per the format;
    /// winding carries over from the source unchanged.
    pub fn to_obj_string(&self) -> String {
        let mut out = String::new();
        for p in &self.positions {
            let _ = writeln!(out, "v {:.6} {:.6} {:.6}", p[0], p[1], p[2]);
        }
        for n in &self.normals {
            let _ = writeln!(out, "vn {:.6} {:.6} {:.6}", n[0], n[1], n[2]);
        }
        for f in &self.faces {
            let (a, b, c) = (f[0] + 1, f[1] + 1, f[2] + 1);
            if self.normals.is_empty() {
                let _ = writeln!(out, "f {a} {b} {c}");
            } else {
                let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
            }
        }
        out
    }

    /// Write the OBJ file. Create-once: the driver derives a fresh path per
    /// asset, so an existing file is simply replaced on re-run.
    pub fn write_obj(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_obj_string())
    }
}

/// Remap a model into [`ConvertedMesh`].
///
/// Models are triangle-only by construction (the loader rejects
/// non-triangulable primitives with `UnsupportedTopology` before a model
/// exists), so the only failure left here is a mesh with nothing to emit.
pub fn emit(model: &GeometryModel) -> Result<ConvertedMesh, AssetError> {
    if model.face_count() == 0 {
        return Err(AssetError::UnsupportedTopology(
            "model has no faces to convert".to_string(),
        ));
    }
    Ok(ConvertedMesh {
        positions: model.vertices().to_vec(),
        normals: model.normals().map(<[_]>::to_vec).unwrap_or_default(),
        faces: model.faces().to_vec(),
    })
}
