//! Core data models for the converter

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::OUTPUT_EXTENSION;
use crate::error::DiscoveryError;

/// One candidate input file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceItem {
    /// Canonical path to the file
    pub path: PathBuf,
    /// File extension (lowercase, without dot)
    pub extension: String,
}

impl SourceItem {
    /// Create an item from a path, deriving the extension
    pub fn new(path: PathBuf) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        Self { path, extension }
    }

    /// Path the converted file is written to
    pub fn destination(&self) -> PathBuf {
        self.path.with_extension(OUTPUT_EXTENSION)
    }
}

/// Terminal classification of one conversion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// A verified destination was written
    Converted,
    /// Nothing was done (destination already present)
    Skipped,
    /// The attempt failed, the source is untouched
    Failed,
}

impl OutcomeStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Converted => "converted",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one conversion attempt, returned by value from the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Classification
    pub status: OutcomeStatus,
    /// Source file the attempt was made for
    pub source: PathBuf,
    /// Destination on success, reason otherwise
    pub message: String,
    /// Destination file, when one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Non-fatal problem attached to a successful conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Outcome {
    /// A verified conversion
    pub fn converted(source: &Path, destination: PathBuf) -> Self {
        Self {
            status: OutcomeStatus::Converted,
            source: source.to_path_buf(),
            message: destination.display().to_string(),
            destination: Some(destination),
            warning: None,
        }
    }

    /// A skipped item
    pub fn skipped(source: &Path, reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Skipped,
            source: source.to_path_buf(),
            message: reason.into(),
            destination: None,
            warning: None,
        }
    }

    /// A failed item
    pub fn failed(source: &Path, reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            source: source.to_path_buf(),
            message: reason.into(),
            destination: None,
            warning: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    /// Attach a warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.status, self.source.display(), self.message)?;
        if let Some(warning) = &self.warning {
            write!(f, " (warning: {})", warning)?;
        }
        Ok(())
    }
}

/// A failed item and its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Source file
    pub path: PathBuf,
    /// Human-readable reason
    pub message: String,
}

/// Running counters for a conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Items converted
    pub converted: u64,
    /// Items skipped
    pub skipped: u64,
    /// Items that failed
    pub failed: u64,
    /// Items never started because the run was cancelled
    pub not_attempted: u64,
    /// Failure details, in completion order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
    /// Warnings attached to converted items
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FailureRecord>,
}

impl RunStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items that reached a terminal outcome
    pub fn completed(&self) -> u64 {
        self.converted + self.skipped + self.failed
    }

    /// Every item accounted for, attempted or not
    pub fn total(&self) -> u64 {
        self.completed() + self.not_attempted
    }

    /// Check if no item failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for this tally
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            2
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Number of items discovered
    pub discovered: u64,
    /// Final counters
    pub stats: RunStats,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
    /// Per-root discovery problems (non-fatal)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discovery_errors: Vec<DiscoveryError>,
    /// Total run duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Process exit code for this run
    pub fn exit_code(&self) -> i32 {
        self.stats.exit_code()
    }
}
