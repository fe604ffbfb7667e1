//! Single-asset mesh conversion command.

use anyhow::{Context, Result};
use colored::Colorize;
use meshsieve_geometry::{emitter, loader};
use std::path::Path;
use std::process::ExitCode;

/// Convert one GLB file to OBJ, bypassing the validation gate.
pub fn run(input: &str, output: &str) -> Result<ExitCode> {
    let model = loader::load_glb_file(Path::new(input))
        .with_context(|| format!("failed to load {input}"))?;
    let mesh = emitter::emit(&model)
        .with_context(|| format!("cannot convert {input}"))?;
    mesh.write_obj(Path::new(output))
        .with_context(|| format!("writing {output}"))?;

    println!(
        "{} {} ({} vertices, {} faces{})",
        "Converted:".green().bold(),
        output,
        mesh.vertex_count(),
        mesh.face_count(),
        if mesh.has_normals() { ", normals" } else { "" }
    );
    Ok(ExitCode::SUCCESS)
}
