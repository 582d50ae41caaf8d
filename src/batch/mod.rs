//! Bounded-concurrency batch execution.
//!
//! [`run_batch`] fans an ordered list of work items out across a pool of at
//! most `concurrency` in-flight operations, isolates per-item failures, and
//! reports live progress through [`BatchObserver`]s.
//!
//! Ordering is deliberately asymmetric and must stay that way:
//!
//! - `results` holds success values **by original input index**, so callers
//!   can zip them back to their inputs no matter which items finished first.
//! - `errors` holds failures **in completion order**, because failures are
//!   exceptional events best read chronologically for diagnostics.
//!
//! Do not "fix" one side to match the other; both orderings are part of the
//! public contract.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{FastConvertError, Result};

pub mod concurrency;
pub mod progress;
pub mod task;

pub use concurrency::{
    recommend_concurrency, recommend_concurrency_with, FixedParallelism, ParallelismProvider,
    SizingOptions, SystemParallelism, DEFAULT_PARALLELISM,
};
pub use progress::{BatchObserver, ErrorReport, ProgressBarObserver, ProgressUpdate, TraceObserver};
pub use task::{run_task, with_timeout, TaskOutcome};

/// Configuration for one [`run_batch`] invocation
pub struct BatchConfig<I, T> {
    /// Maximum in-flight operations; clamped to `[1, host units]`.
    /// `None` uses the host parallelism.
    pub concurrency: Option<usize>,
    observers: Vec<Arc<dyn BatchObserver<I, T>>>,
    parallelism: Arc<dyn ParallelismProvider>,
}

impl<I, T> BatchConfig<I, T> {
    pub fn new() -> Self {
        Self {
            concurrency: None,
            observers: Vec::new(),
            parallelism: Arc::new(SystemParallelism),
        }
    }

    /// Pin the concurrency level (still clamped to the host)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Attach an observer; observers compose and fire in registration order
    pub fn observer(mut self, observer: Arc<dyn BatchObserver<I, T>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Inject a parallelism provider (tests use [`FixedParallelism`])
    pub fn parallelism(mut self, provider: Arc<dyn ParallelismProvider>) -> Self {
        self.parallelism = provider;
        self
    }
}

impl<I, T> Default for BatchConfig<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One failed item, annotated with how far the batch had progressed when it
/// failed. `index` references the item's original input position.
#[derive(Debug)]
pub struct ErrorRecord<I> {
    pub item: I,
    pub index: usize,
    pub error: FastConvertError,
    pub completed: usize,
    pub total: usize,
}

/// Aggregate of all outcomes for one batch run
#[derive(Debug)]
pub struct BatchResult<I, T> {
    /// Success values in original input order; failed items are excluded,
    /// not padded with placeholders
    pub results: Vec<T>,
    /// Failures in the order they actually occurred
    pub errors: Vec<ErrorRecord<I>>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl<I, T> BatchResult<I, T> {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
            total: 0,
            successful: 0,
            failed: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of items that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.successful as f64 / self.total as f64 * 100.0
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Mutable batch state; updated exactly once per settled item, under one lock
struct BatchState<I, T> {
    slots: Vec<Option<T>>,
    errors: Vec<ErrorRecord<I>>,
    completed: usize,
}

/// Run every item through `op` with bounded concurrency.
///
/// At most the effective concurrency operations are outstanding at any
/// instant; a freed slot immediately admits the next queued item rather than
/// waiting for a whole "wave" to drain. A failing item never cancels,
/// blocks, or retries other items, and no per-item error is ever re-thrown
/// from this function. Retry policy, if any, belongs to the caller.
///
/// An empty `items` list returns immediately without invoking `op`.
pub async fn run_batch<I, T, F, Fut>(
    items: Vec<I>,
    op: F,
    config: BatchConfig<I, T>,
) -> BatchResult<I, T>
where
    I: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let started = Instant::now();
    let total = items.len();

    if total == 0 {
        return BatchResult::empty();
    }

    let effective = concurrency::effective_concurrency(config.concurrency, config.parallelism.as_ref());
    debug!("dispatching {} items across {} slots", total, effective);

    let op = Arc::new(op);
    let observers: Arc<[Arc<dyn BatchObserver<I, T>>]> = config.observers.into();
    let semaphore = Arc::new(Semaphore::new(effective));
    let state = Arc::new(Mutex::new(BatchState {
        slots: (0..total).map(|_| None).collect(),
        errors: Vec::new(),
        completed: 0,
    }));

    let mut handles = Vec::with_capacity(total);
    for (index, item) in items.iter().cloned().enumerate() {
        let op = Arc::clone(&op);
        let observers = Arc::clone(&observers);
        let semaphore = Arc::clone(&semaphore);
        let state = Arc::clone(&state);

        handles.push(tokio::spawn(async move {
            // Slot gate: the permit is held until this task settles its
            // outcome, so the next queued item is admitted only afterwards
            let _permit = semaphore.acquire_owned().await.unwrap();
            let outcome = task::run_task(index, item, op.as_ref()).await;
            settle(&state, &observers, total, outcome);
        }));
    }

    for (index, handle) in handles.into_iter().enumerate() {
        if let Err(join_error) = handle.await {
            // A panicked worker still settles its item exactly once
            let outcome = TaskOutcome::Failure {
                index,
                item: items[index].clone(),
                error: FastConvertError::batch(format!(
                    "worker for item {} did not settle: {}",
                    index, join_error
                )),
                duration: Duration::ZERO,
            };
            settle(&state, &observers, total, outcome);
        }
    }

    let (slots, errors) = {
        let mut state = state.lock().unwrap();
        debug_assert_eq!(state.completed, total);
        (
            std::mem::take(&mut state.slots),
            std::mem::take(&mut state.errors),
        )
    };

    let results: Vec<T> = slots.into_iter().flatten().collect();
    let successful = results.len();
    let failed = errors.len();
    debug_assert_eq!(successful + failed, total);

    BatchResult {
        results,
        errors,
        total,
        successful,
        failed,
        elapsed: started.elapsed(),
    }
}

/// Record one settled outcome and notify observers.
///
/// The lock is the sole critical section per outcome: the completed counter
/// increment, the index-addressed result write (or completion-ordered error
/// append), and the observer callbacks all happen inside it, which is what
/// keeps callback order identical to completion order.
fn settle<I, T>(
    state: &Mutex<BatchState<I, T>>,
    observers: &[Arc<dyn BatchObserver<I, T>>],
    total: usize,
    outcome: TaskOutcome<I, T>,
) {
    let mut state = state.lock().unwrap();
    state.completed += 1;
    let completed = state.completed;

    match outcome {
        TaskOutcome::Success { index, item, value, .. } => {
            let update = ProgressUpdate {
                item: &item,
                index,
                completed,
                total,
                value: &value,
                percentage: completed as f64 / total as f64 * 100.0,
            };
            for observer in observers {
                observer.on_progress(&update);
            }
            state.slots[index] = Some(value);
        }
        TaskOutcome::Failure { index, item, error, .. } => {
            let record = ErrorRecord {
                item,
                index,
                error,
                completed,
                total,
            };
            let report = ErrorReport {
                item: &record.item,
                index,
                error: &record.error,
                completed,
                total,
            };
            for observer in observers {
                observer.on_error(&report);
            }
            state.errors.push(record);
        }
    }
}

/// Split a sequence into groups of at most `size` items, preserving order.
///
/// A `size` of zero is treated as one. Ten items grouped by three yield
/// groups of `[3, 3, 3, 1]`; a group size at or above the sequence length
/// yields a single group; empty input yields no groups.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}
