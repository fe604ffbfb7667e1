//! Meshsieve CLI - batch triage for 3D assets
//!
//! This binary validates GLB assets by geometric quality, extracts PBR
//! material channels from the ones that pass, and converts their geometry
//! to OBJ.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use meshsieve_cli::commands;

/// Meshsieve - mesh quality triage and PBR extraction
#[derive(Parser)]
#[command(name = "meshsieve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch pipeline over a directory of GLB assets
    Run {
        /// Directory scanned recursively for .glb files
        #[arg(short, long)]
        input_dir: String,

        /// Output root; per-asset directories and the verdict log land here
        #[arg(short, long)]
        out_root: String,

        /// Path to a threshold config file (JSON; defaults apply if omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of worker threads (default: one per core)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output machine-readable JSON instead of colored text
        #[arg(long)]
        json: bool,
    },

    /// Validate a single GLB file and print the verdict
    Validate {
        /// Path to the GLB file
        #[arg(short, long)]
        input: String,

        /// Path to a threshold config file (JSON; defaults apply if omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON instead of colored text
        #[arg(long)]
        json: bool,
    },

    /// Extract PBR channels of a single GLB file (no validation gate)
    Extract {
        /// Path to the GLB file
        #[arg(short, long)]
        input: String,

        /// Directory for channel PNGs and the manifest
        #[arg(short, long)]
        out_dir: String,

        /// Path to a threshold config file (JSON; defaults apply if omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Output machine-readable JSON instead of colored text
        #[arg(long)]
        json: bool,
    },

    /// Convert a single GLB file to OBJ (no validation gate)
    Convert {
        /// Path to the GLB file
        #[arg(short, long)]
        input: String,

        /// Path of the OBJ file to write
        #[arg(short, long)]
        output: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run {
            input_dir,
            out_root,
            config,
            jobs,
            json,
        } => commands::run::run(input_dir, out_root, config.as_deref(), *jobs, *json),
        Commands::Validate {
            input,
            config,
            json,
        } => commands::validate::run(input, config.as_deref(), *json),
        Commands::Extract {
            input,
            out_dir,
            config,
            json,
        } => commands::extract::run(input, out_dir, config.as_deref(), *json),
        Commands::Convert { input, output } => commands::convert::run(input, output),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::from(2)
        }
    }
}
