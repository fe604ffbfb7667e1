//! Validation verdicts and the append-only verdict log.
//!
//! A verdict is the validator's complete answer for one asset: pass/fail
//! plus one entry per failed check, in check order, with the measured value
//! and the threshold it was compared against. The log is a JSONL file with
//! one record per asset, which is what makes interrupted batches resumable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// The fixed check battery, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    FaceCount,
    DegenerateFaces,
    NormalConsistency,
    SelfIntersection,
}

impl CheckKind {
    /// Stable name used in verdict records.
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::FaceCount => "face-count",
            CheckKind::DegenerateFaces => "degenerate-faces",
            CheckKind::NormalConsistency => "normal-consistency",
            CheckKind::SelfIntersection => "self-intersection",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One failed check with its diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Which check failed.
    pub name: CheckKind,
    /// Human-readable reason.
    pub detail: String,
    /// Measured value that triggered the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<String>,
    /// Threshold the measurement was compared against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
}

impl CheckFailure {
    pub fn new(name: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            name,
            detail: detail.into(),
            measured: None,
            threshold: None,
        }
    }

    /// Builder method to record the measured value.
    pub fn with_measured(mut self, value: impl Into<String>) -> Self {
        self.measured = Some(value.into());
        self
    }

    /// Builder method to record the threshold.
    pub fn with_threshold(mut self, value: impl Into<String>) -> Self {
        self.threshold = Some(value.into());
        self
    }
}

/// The validator's complete answer for one asset.
///
/// Immutable once built; the driver only reads `pass` to branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// True if every check passed.
    pub pass: bool,
    /// Every failed check, in check order. Empty on pass.
    pub failed_checks: Vec<CheckFailure>,
}

impl ValidationVerdict {
    /// Build a verdict from the accumulated failures of a full check run.
    pub fn from_failures(failed_checks: Vec<CheckFailure>) -> Self {
        Self {
            pass: failed_checks.is_empty(),
            failed_checks,
        }
    }

    pub fn passed() -> Self {
        Self::from_failures(Vec::new())
    }

    /// True if the named check is among the failures.
    pub fn failed(&self, check: CheckKind) -> bool {
        self.failed_checks.iter().any(|f| f.name == check)
    }
}

/// One line of the verdict log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub asset_id: String,
    pub pass: bool,
    pub failed_checks: Vec<CheckFailure>,
    /// Set when the asset failed outside validation (load error, topology
    /// error, ...). Such records are fails with no check entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerdictRecord {
    pub fn new(asset_id: impl Into<String>, verdict: &ValidationVerdict) -> Self {
        Self {
            asset_id: asset_id.into(),
            pass: verdict.pass,
            failed_checks: verdict.failed_checks.clone(),
            error: None,
        }
    }

    /// Record for an asset that failed outside validation. Logged as a
    /// fail so resume skips it like any other failure.
    pub fn failed_with_error(asset_id: impl Into<String>, reason: &str, detail: &str) -> Self {
        Self {
            asset_id: asset_id.into(),
            pass: false,
            failed_checks: Vec::new(),
            error: Some(format!("{reason}: {detail}")),
        }
    }
}

/// Append-only JSONL verdict log with resume support.
///
/// Opening reads any existing records so `status()` can answer "was this
/// asset already judged". Appends are flushed per record; a crash loses at
/// most the asset in flight.
#[derive(Debug)]
pub struct VerdictLog {
    path: PathBuf,
    file: File,
    seen: HashMap<String, bool>,
}

impl VerdictLog {
    /// Open (or create) the log at `path`, loading existing records.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let mut seen = HashMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                // Tolerate a torn final line from a crashed run.
                if let Ok(record) = serde_json::from_str::<VerdictRecord>(&line) {
                    seen.insert(record.asset_id, record.pass);
                }
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            seen,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Some(pass)` if the asset already has a record.
    pub fn status(&self, asset_id: &str) -> Option<bool> {
        self.seen.get(asset_id).copied()
    }

    /// Number of assets already recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Append one record and flush it.
    pub fn append(&mut self, record: &VerdictRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        self.seen.insert(record.asset_id.clone(), record.pass);
        Ok(())
    }
}
