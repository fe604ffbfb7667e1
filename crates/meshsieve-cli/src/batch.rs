//! Batch runner: discovery, resume, worker pool, verdict log.
//!
//! Assets are discovered once, filtered against the existing verdict log,
//! then fanned out over a worker pool: one asset's full state-machine run
//! per unit of work, no ordering guarantees between assets. The decode
//! cache and the verdict log are the only shared state; both live exactly
//! as long as the batch.

use crate::driver::{AssetState, PipelineDriver};
use anyhow::{Context, Result};
use meshsieve_core::{PipelineConfig, VerdictLog, VerdictRecord};
use meshsieve_texture::DecodeCache;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use walkdir::WalkDir;

/// One unit of work: an asset id and its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub asset_id: String,
    pub path: PathBuf,
}

/// Counters reported at the end of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub skipped: usize,
    pub passed: usize,
    pub rejected: usize,
    pub failed: usize,
    pub elapsed_secs: u64,
}

/// Find every `.glb` under `input_dir`, sorted by asset id so discovery
/// order is stable. The asset id is the file stem.
pub fn discover_assets(input_dir: &Path) -> Result<Vec<AssetEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = entry.with_context(|| format!("scanning {}", input_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_glb = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("glb"));
        if !is_glb {
            continue;
        }
        let Some(asset_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        entries.push(AssetEntry {
            asset_id: asset_id.to_string(),
            path: path.to_path_buf(),
        });
    }
    entries.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
    Ok(entries)
}

/// Run a batch over `assets`, writing outputs and the verdict log under
/// `out_root`. Idempotent resume: an asset already logged `pass=false` is
/// skipped entirely; one logged `pass=true` is skipped only if its output
/// files still exist.
pub fn run_batch(
    assets: &[AssetEntry],
    config: &PipelineConfig,
    out_root: &Path,
    jobs: Option<usize>,
) -> Result<BatchSummary> {
    let start = Instant::now();
    std::fs::create_dir_all(out_root)
        .with_context(|| format!("creating output root {}", out_root.display()))?;

    let log = VerdictLog::open(&out_root.join("verdicts.jsonl"))
        .context("opening verdict log")?;

    // Batch-scoped shared state; dropped when the batch ends.
    let cache = DecodeCache::new();
    let driver = PipelineDriver::new(config, &cache, out_root);

    let (pending, skipped): (Vec<&AssetEntry>, Vec<&AssetEntry>) =
        assets.iter().partition(|entry| {
            match log.status(&entry.asset_id) {
                None => true,
                Some(false) => false,
                Some(true) => !driver
                    .expected_outputs(&entry.asset_id)
                    .iter()
                    .all(|p| p.exists()),
            }
        });

    let log = Mutex::new(log);
    let process = |entry: &&AssetEntry| -> AssetState {
        let outcome = driver.process(&entry.asset_id, &entry.path);
        let record = match (&outcome.state, &outcome.verdict) {
            (AssetState::Failed { reason, detail }, _) => {
                VerdictRecord::failed_with_error(&entry.asset_id, reason, detail)
            }
            (_, Some(verdict)) => VerdictRecord::new(&entry.asset_id, verdict),
            // A run can only end without a verdict by failing first.
            (state, None) => unreachable!("non-failed outcome without verdict: {state:?}"),
        };
        if let Err(error) = log.lock().expect("verdict log poisoned").append(&record) {
            eprintln!("warning: could not record verdict for {}: {error}", entry.asset_id);
        }
        outcome.state
    };

    let states: Vec<AssetState> = match jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("building worker pool")?
            .install(|| pending.par_iter().map(process).collect()),
        None => pending.par_iter().map(process).collect(),
    };

    let mut summary = BatchSummary {
        discovered: assets.len(),
        skipped: skipped.len(),
        elapsed_secs: start.elapsed().as_secs(),
        ..Default::default()
    };
    for state in &states {
        match state {
            AssetState::Persisted => summary.passed += 1,
            AssetState::Rejected => summary.rejected += 1,
            AssetState::Failed { .. } => summary.failed += 1,
        }
    }
    Ok(summary)
}
