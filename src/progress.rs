//! Progress reporting module for conversion runs
//!
//! This module provides the JSON-lines messages written to stderr when
//! progress reporting is enabled, and the reporter that throttles them.

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::ColorMode;
use crate::models::{Outcome, RunStats};

/// Start message sent once conversion begins
#[derive(Debug, Clone, Serialize)]
pub struct StartMessage {
    /// Message type identifier
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Number of items queued for conversion
    pub total: u64,
    /// Number of parallel workers
    pub workers: usize,
    /// Color mode in effect
    pub mode: ColorMode,
}

impl StartMessage {
    /// Create a new start message
    pub fn new(seq: u64, ts: u64, total: u64, workers: usize, mode: ColorMode) -> Self {
        Self {
            msg_type: "start",
            seq,
            ts,
            total,
            workers,
            mode,
        }
    }
}

/// Progress message with the running tally
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMessage {
    /// Message type identifier ("p" for progress)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Items converted so far
    #[serde(rename = "c")]
    pub converted: u64,
    /// Items skipped so far
    #[serde(rename = "s")]
    pub skipped: u64,
    /// Items failed so far
    #[serde(rename = "f")]
    pub failed: u64,
    /// Number of items queued for conversion
    pub total: u64,
    /// Source of the most recent completion
    pub path: String,
}

impl ProgressMessage {
    /// Create a new progress message
    pub fn new(seq: u64, ts: u64, stats: &RunStats, total: u64, path: String) -> Self {
        Self {
            msg_type: "p",
            seq,
            ts,
            converted: stats.converted,
            skipped: stats.skipped,
            failed: stats.failed,
            total,
            path,
        }
    }
}

/// Failure message, sent for every failed item
#[derive(Debug, Clone, Serialize)]
pub struct FailureMessage {
    /// Message type identifier ("fail")
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Source that failed
    pub path: String,
    /// Failure reason
    pub message: String,
}

impl FailureMessage {
    /// Create a new failure message
    pub fn new(seq: u64, ts: u64, path: String, message: String) -> Self {
        Self {
            msg_type: "fail",
            seq,
            ts,
            path,
            message,
        }
    }
}

/// Done message sent when the run completes
#[derive(Debug, Clone, Serialize)]
pub struct DoneMessage {
    /// Message type identifier ("done" for completion)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    #[serde(rename = "c")]
    pub converted: u64,
    #[serde(rename = "s")]
    pub skipped: u64,
    #[serde(rename = "f")]
    pub failed: u64,
    /// Items never started because of cancellation
    #[serde(rename = "na")]
    pub not_attempted: u64,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Total run duration in milliseconds
    pub ms: u64,
}

impl DoneMessage {
    /// Create a new done message
    pub fn new(seq: u64, ts: u64, stats: &RunStats, cancelled: bool, ms: u64) -> Self {
        Self {
            msg_type: "done",
            seq,
            ts,
            converted: stats.converted,
            skipped: stats.skipped,
            failed: stats.failed,
            not_attempted: stats.not_attempted,
            cancelled,
            ms,
        }
    }
}

/// Progress reporter for outputting conversion progress to stderr
///
/// Only the thread that drains completions reports, so the throttle state
/// lives in a `Cell`.
pub struct ProgressReporter {
    /// Whether progress reporting is enabled
    enabled: bool,
    /// Reporting interval in milliseconds
    interval_ms: u64,
    /// Last report time
    last_report: std::cell::Cell<Instant>,
    /// Sequence number for messages
    seq: AtomicU64,
    /// Start time of the reporter
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new ProgressReporter
    ///
    /// # Arguments
    /// * `enabled` - Whether progress reporting is enabled
    /// * `interval_ms` - Minimum interval between progress messages in milliseconds
    pub fn new(enabled: bool, interval_ms: u64) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            interval_ms,
            last_report: std::cell::Cell::new(now),
            seq: AtomicU64::new(0),
            start_time: now,
        }
    }

    /// Reporter that never writes anything
    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    /// Check if enough time has passed since the last report
    pub fn should_report(&self) -> bool {
        if !self.enabled {
            return false;
        }
        let elapsed = self.last_report.get().elapsed().as_millis() as u64;
        elapsed >= self.interval_ms
    }

    /// Get the next sequence number (monotonically increasing)
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Get the current timestamp in milliseconds since reporter creation
    pub fn current_timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    fn output_to_stderr<T: Serialize>(&self, msg: &T) {
        if let Ok(json) = serde_json::to_string(msg) {
            eprintln!("{}", json);
            std::io::stderr().flush().ok();
        }
    }

    /// Report that conversion is starting
    pub fn report_start(&self, total: u64, workers: usize, mode: ColorMode) {
        if !self.enabled {
            return;
        }

        let msg = StartMessage::new(self.next_seq(), self.current_timestamp(), total, workers, mode);
        self.output_to_stderr(&msg);
    }

    /// Report one completed item.
    ///
    /// Failures are written immediately; the running tally respects the
    /// interval. Returns true if a tally message was sent.
    pub fn report_outcome(&self, outcome: &Outcome, stats: &RunStats, total: u64) -> bool {
        if !self.enabled {
            return false;
        }

        if outcome.is_failed() {
            let msg = FailureMessage::new(
                self.next_seq(),
                self.current_timestamp(),
                outcome.source.to_string_lossy().to_string(),
                outcome.message.clone(),
            );
            self.output_to_stderr(&msg);
        }

        if !self.should_report() {
            return false;
        }

        let msg = ProgressMessage::new(
            self.next_seq(),
            self.current_timestamp(),
            stats,
            total,
            outcome.source.to_string_lossy().to_string(),
        );
        self.output_to_stderr(&msg);
        self.last_report.set(Instant::now());
        true
    }

    /// Report run completion
    pub fn report_done(&self, stats: &RunStats, cancelled: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        let msg = DoneMessage::new(
            self.next_seq(),
            self.current_timestamp(),
            stats,
            cancelled,
            duration_ms,
        );
        self.output_to_stderr(&msg);
    }
}
