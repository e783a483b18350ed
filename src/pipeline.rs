//! Pipeline driver: Discovery -> Scheduler -> Aggregator.
//!
//! [`run`] is the one-call entry point. The binary calls [`discover`] and
//! [`convert`] separately so it can ask for confirmation in between.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::aggregator::Aggregator;
use crate::codec::ImageCodec;
use crate::config::RunConfig;
use crate::discovery::{self, Discovery, DESTINATION_COLLISION};
use crate::error::PipelineError;
use crate::models::{Outcome, RunSummary, SourceItem};
use crate::progress::ProgressReporter;
use crate::scheduler::{CancelToken, Scheduler};

/// Resolve the configured roots into source items
pub fn discover(config: &RunConfig) -> Result<Discovery, PipelineError> {
    let found = discovery::discover(&config.roots, &config.extensions)?;
    for err in &found.errors {
        warn!("Discovery: {}", err);
    }
    info!(
        "Discovered {} file(s) under {} root(s)",
        found.items.len(),
        config.roots.len()
    );
    Ok(found)
}

/// Convert `items` and return the run summary.
///
/// Every item ends up in exactly one of converted, skipped, failed or not
/// attempted. Items that do not own their destination fail without being
/// dispatched.
pub fn convert(
    config: &RunConfig,
    items: Vec<SourceItem>,
    codec: Arc<dyn ImageCodec>,
    cancel: CancelToken,
    reporter: &ProgressReporter,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    let total = items.len() as u64;
    let workers = config.effective_workers();

    let scheduler = Scheduler::new(workers, config.conversion.clone(), codec, cancel.clone())?;

    info!(
        "Converting {} file(s) with {} worker(s), quality {}, color mode {}",
        total,
        scheduler.workers(),
        config.conversion.quality,
        config.conversion.color_mode
    );
    reporter.report_start(total, scheduler.workers(), config.conversion.color_mode);

    let mut aggregator = Aggregator::new();
    let (items, collided) = discovery::split_collisions(items);
    for item in collided {
        let outcome = Outcome::failed(&item.path, DESTINATION_COLLISION);
        warn!("{}", outcome);
        aggregator.record(&outcome);
        reporter.report_outcome(&outcome, aggregator.stats(), total);
    }

    let not_attempted = scheduler.run(items, |outcome| {
        if outcome.is_failed() {
            warn!("{}", outcome);
        } else {
            info!("{}", outcome);
        }
        aggregator.record(&outcome);
        reporter.report_outcome(&outcome, aggregator.stats(), total);
    });
    aggregator.record_not_attempted(not_attempted.len() as u64);

    let stats = aggregator.finish();
    let duration_ms = start.elapsed().as_millis() as u64;
    let cancelled = cancel.is_cancelled();
    reporter.report_done(&stats, cancelled, duration_ms);

    info!(
        "Done in {}ms: {} converted, {} skipped, {} failed, {} not attempted",
        duration_ms, stats.converted, stats.skipped, stats.failed, stats.not_attempted
    );

    Ok(RunSummary {
        discovered: total,
        stats,
        cancelled,
        discovery_errors: Vec::new(),
        duration_ms,
    })
}

/// Discover and convert in one call
pub fn run(
    config: &RunConfig,
    codec: Arc<dyn ImageCodec>,
    cancel: CancelToken,
    reporter: &ProgressReporter,
) -> Result<RunSummary, PipelineError> {
    let found = discover(config)?;
    let mut summary = convert(config, found.items, codec, cancel, reporter)?;
    summary.discovery_errors = found.errors;
    Ok(summary)
}
