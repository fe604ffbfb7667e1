//! Single-asset validation command.

use anyhow::{Context, Result};
use colored::Colorize;
use meshsieve_core::VerdictRecord;
use meshsieve_geometry::{loader, validator};
use std::path::Path;
use std::process::ExitCode;

/// Validate one GLB file and print the verdict.
pub fn run(input: &str, config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let config = super::load_config(config_path)?;
    let path = Path::new(input);
    let asset_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string();

    let model = loader::load_glb_file(path)
        .with_context(|| format!("failed to load {input}"))?;
    let verdict = validator::validate(&model, &config, &asset_id)
        .with_context(|| format!("validation aborted for {input}"))?;

    if json_output {
        let record = VerdictRecord::new(&asset_id, &verdict);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "{} {} ({} vertices, {} faces)",
            "Asset:".cyan().bold(),
            asset_id,
            model.vertex_count(),
            model.face_count()
        );
        if verdict.pass {
            println!("{}", "PASS".green().bold());
        } else {
            println!("{}", "FAIL".red().bold());
            for failure in &verdict.failed_checks {
                let context = match (&failure.measured, &failure.threshold) {
                    (Some(measured), Some(threshold)) => {
                        format!(" [{measured}, expected {threshold}]")
                    }
                    _ => String::new(),
                };
                println!(
                    "  {} {}: {}{}",
                    "x".red(),
                    failure.name,
                    failure.detail,
                    context.dimmed()
                );
            }
        }
    }

    Ok(if verdict.pass {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
