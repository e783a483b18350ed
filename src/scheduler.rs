//! Scheduler - drives source items through a bounded worker pool.
//!
//! At most `workers` items are in flight. Completions are drained on the
//! calling thread, which is also where the next item is dispatched, so
//! cancellation is observed between dispatches. A conversion that has
//! started always runs to the end; only items that have not started yet are
//! given back as "not attempted".

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use crate::codec::ImageCodec;
use crate::config::ConversionConfig;
use crate::error::PipelineError;
use crate::models::{Outcome, SourceItem};
use crate::worker;

/// Cooperative cancellation flag shared with the driver
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Message sent back by a pool job
enum Completion {
    /// The item went through the worker
    Finished(Outcome),
    /// The job saw the cancellation flag before starting
    Abandoned(SourceItem),
}

/// Bounded pool of conversion workers
pub struct Scheduler {
    pool: rayon::ThreadPool,
    workers: usize,
    config: Arc<ConversionConfig>,
    codec: Arc<dyn ImageCodec>,
    cancel: CancelToken,
}

impl Scheduler {
    /// Create a scheduler with `workers` threads (at least one)
    pub fn new(
        workers: usize,
        config: ConversionConfig,
        codec: Arc<dyn ImageCodec>,
        cancel: CancelToken,
    ) -> Result<Self, PipelineError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("heic2jpg-worker-{}", idx))
            .build()?;

        Ok(Self {
            pool,
            workers,
            config: Arc::new(config),
            codec,
            cancel,
        })
    }

    /// Number of parallel workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every item, calling `on_outcome` for each completion in completion
    /// order. Returns the items that were never attempted, in input order
    /// for undispatched items.
    pub fn run<F>(&self, items: Vec<SourceItem>, mut on_outcome: F) -> Vec<SourceItem>
    where
        F: FnMut(Outcome),
    {
        let (tx, rx) = mpsc::channel::<Completion>();
        let mut pending = items.into_iter();
        let mut in_flight = 0usize;
        let mut not_attempted = Vec::new();

        loop {
            while in_flight < self.workers && !self.cancel.is_cancelled() {
                match pending.next() {
                    Some(item) => {
                        self.dispatch(item, tx.clone());
                        in_flight += 1;
                    }
                    None => break,
                }
            }

            if in_flight == 0 {
                break;
            }

            match rx.recv() {
                Ok(Completion::Finished(outcome)) => {
                    in_flight -= 1;
                    on_outcome(outcome);
                }
                Ok(Completion::Abandoned(item)) => {
                    in_flight -= 1;
                    not_attempted.push(item);
                }
                // `tx` is still held here, so the channel cannot close
                Err(_) => break,
            }
        }

        if self.cancel.is_cancelled() {
            log::info!(
                "Cancelled with {} item(s) not attempted",
                not_attempted.len() + pending.len()
            );
        }
        not_attempted.extend(pending);
        not_attempted
    }

    fn dispatch(&self, item: SourceItem, tx: mpsc::Sender<Completion>) {
        let config = Arc::clone(&self.config);
        let codec = Arc::clone(&self.codec);
        let cancel = self.cancel.clone();

        self.pool.spawn(move || {
            if cancel.is_cancelled() {
                let _ = tx.send(Completion::Abandoned(item));
                return;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                worker::convert(&item, &config, codec.as_ref())
            }))
            .unwrap_or_else(|_| {
                log::error!("Worker panicked while converting {}", item.path.display());
                Outcome::failed(&item.path, "worker panicked")
            });

            let _ = tx.send(Completion::Finished(outcome));
        });
    }
}
