//! Per-item outcomes and the end-of-run summary.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a single work item did not produce an output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    /// The generator call itself returned an error.
    Invocation(String),
    /// The generator answered but reported no artifact.
    Unsuccessful(Option<String>),
    /// The generator reported success, but the file is not there.
    MissingArtifact(PathBuf),
    /// Copying or moving the artifact into the output directory failed.
    Transfer(String),
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invocation(msg) => write!(f, "error: {msg}"),
            Self::Unsuccessful(Some(msg)) => write!(f, "generation failed: {msg}"),
            Self::Unsuccessful(None) => f.write_str("generation failed"),
            Self::MissingArtifact(path) => write!(f, "file not found: {}", path.display()),
            Self::Transfer(msg) => write!(f, "could not place file: {msg}"),
        }
    }
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The artifact now lives at `target`.
    Placed {
        /// Final location inside the output directory.
        target: PathBuf,
    },
    /// The item failed; the batch carried on.
    Failed(ItemFailure),
}

impl ItemOutcome {
    /// Returns true if the item produced a file.
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed { .. })
    }
}

/// Aggregate result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Number of work items in the batch.
    pub total: usize,
    /// Items whose file was placed.
    pub succeeded: usize,
    /// Names of failed items, in processing order.
    pub failed: Vec<String>,
    /// Where files were placed.
    pub output_dir: PathBuf,
}

impl JobSummary {
    /// Starts an empty summary for a batch of `total` items.
    pub fn new(total: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            total,
            succeeded: 0,
            failed: Vec::new(),
            output_dir: output_dir.into(),
        }
    }

    pub(crate) fn record(&mut self, name: &str, outcome: &ItemOutcome) {
        debug_assert!(self.processed() < self.total);
        if outcome.is_placed() {
            self.succeeded += 1;
        } else {
            self.failed.push(name.to_string());
        }
    }

    /// Number of items that have an outcome so far.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// True when every item was attempted and none produced a file.
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed: {}", self.processed())?;
        writeln!(f, "Succeeded: {}/{}", self.succeeded, self.total)?;
        if !self.failed.is_empty() {
            writeln!(f, "Failed: {}", self.failed.join(", "))?;
        }
        write!(f, "Output directory: {}", self.output_dir.display())
    }
}
