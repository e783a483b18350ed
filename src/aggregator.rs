//! Outcome aggregation.
//!
//! The aggregator lives on the scheduler's draining thread; workers never
//! touch it.

use crate::models::{FailureRecord, Outcome, OutcomeStatus, RunStats};

/// Accumulates outcomes into a running tally
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: RunStats,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome, incrementing exactly one counter
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome.status {
            OutcomeStatus::Converted => {
                self.stats.converted += 1;
                if let Some(warning) = &outcome.warning {
                    self.stats.warnings.push(FailureRecord {
                        path: outcome.source.clone(),
                        message: warning.clone(),
                    });
                }
            }
            OutcomeStatus::Skipped => self.stats.skipped += 1,
            OutcomeStatus::Failed => {
                self.stats.failed += 1;
                self.stats.failures.push(FailureRecord {
                    path: outcome.source.clone(),
                    message: outcome.message.clone(),
                });
            }
        }
    }

    /// Record items that were never started
    pub fn record_not_attempted(&mut self, count: u64) {
        self.stats.not_attempted += count;
    }

    /// Live tally
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Consume the aggregator, returning the final tally
    pub fn finish(self) -> RunStats {
        self.stats
    }
}
