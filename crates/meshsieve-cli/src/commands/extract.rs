//! Single-asset texture extraction command.
//!
//! Extraction without the validation gate, for inspecting what the
//! pipeline would pull out of an asset.

use anyhow::{Context, Result};
use colored::Colorize;
use meshsieve_core::ChannelStatus;
use meshsieve_geometry::loader;
use meshsieve_texture::{normalize, resolve, DecodeCache, PngConfig};
use std::path::Path;
use std::process::ExitCode;

/// Extract the PBR channels of one GLB file into `out_dir`.
pub fn run(
    input: &str,
    out_dir: &str,
    config_path: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    let config = super::load_config(config_path)?;
    let path = Path::new(input);
    let asset_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string();

    let model = loader::load_glb_file(path)
        .with_context(|| format!("failed to load {input}"))?;

    let cache = DecodeCache::new();
    let bindings = resolve(&model, &cache)
        .with_context(|| format!("failed to resolve materials of {input}"))?;
    let texture_set = normalize(&bindings, &config);

    let out_dir = Path::new(out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let manifest = texture_set
        .save(out_dir, &asset_id, &PngConfig::default())
        .context("writing channel files")?;
    manifest.save(&out_dir.join("textures.json"))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        println!(
            "{} {} material slot(s), {} shared image(s) decoded",
            "Extracted:".cyan().bold(),
            bindings.len(),
            cache.decode_count()
        );
        for entry in &manifest.channels {
            let status = match entry.status {
                ChannelStatus::Present => "present".green(),
                ChannelStatus::Absent => "absent".dimmed(),
                ChannelStatus::Flagged => "flagged".yellow(),
            };
            let file = entry.file.as_deref().unwrap_or("-");
            println!("  {:<20} {status:<8} {file}", entry.role.to_string());
            if let Some(flag) = &entry.flag {
                println!("    {} {}", "!".yellow(), flag);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
