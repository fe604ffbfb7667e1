//! Batch run command.

use crate::batch::{discover_assets, run_batch};
use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

/// Run the full pipeline over every `.glb` under `input_dir`.
pub fn run(
    input_dir: &str,
    out_root: &str,
    config_path: Option<&str>,
    jobs: Option<usize>,
    json_output: bool,
) -> Result<ExitCode> {
    let config = super::load_config(config_path)?;
    let assets = discover_assets(Path::new(input_dir))?;

    if !json_output {
        println!("{} {}", "Input:".cyan().bold(), input_dir);
        println!("{} {}", "Output root:".cyan().bold(), out_root);
        println!(
            "{} {} asset(s) discovered",
            "Batch:".cyan().bold(),
            assets.len()
        );
    }

    let summary = run_batch(&assets, &config, Path::new(out_root), jobs)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "discovered": summary.discovered,
                "skipped": summary.skipped,
                "passed": summary.passed,
                "rejected": summary.rejected,
                "failed": summary.failed,
                "elapsed_secs": summary.elapsed_secs,
            }))?
        );
    } else {
        let (hours, rem) = (summary.elapsed_secs / 3600, summary.elapsed_secs % 3600);
        let (minutes, seconds) = (rem / 60, rem % 60);
        println!(
            "{} {} passed, {} rejected, {} failed, {} skipped",
            "Done:".green().bold(),
            summary.passed.to_string().green(),
            summary.rejected.to_string().yellow(),
            summary.failed.to_string().red(),
            summary.skipped
        );
        println!(
            "{} {hours:02}h {minutes:02}min {seconds:02}s",
            "Elapsed:".dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}
