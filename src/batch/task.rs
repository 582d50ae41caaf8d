//! Single-task execution with timing and uniform failure capture.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{FastConvertError, Result};

/// The settled result of running one work item through an operation.
///
/// Exactly one outcome is produced per input item, and outcomes are
/// immutable once created.
#[derive(Debug)]
pub enum TaskOutcome<I, T> {
    /// The operation completed normally
    Success {
        index: usize,
        item: I,
        value: T,
        duration: Duration,
    },
    /// The operation returned an error
    Failure {
        index: usize,
        item: I,
        error: FastConvertError,
        duration: Duration,
    },
}

impl<I, T> TaskOutcome<I, T> {
    /// Original input position of the work item
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Wall-clock time spent on the operation, up to the point it settled
    pub fn duration(&self) -> Duration {
        match self {
            Self::Success { duration, .. } | Self::Failure { duration, .. } => *duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Run one item through `op`, measuring elapsed wall-clock time with a
/// monotonic clock and converting an `Err` into a [`TaskOutcome::Failure`].
///
/// An error from `op` never propagates out of the runner; this is the
/// per-item failure-isolation guarantee the batch scheduler builds on. The
/// runner performs no I/O of its own.
pub async fn run_task<I, T, F, Fut>(index: usize, item: I, op: &F) -> TaskOutcome<I, T>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();

    match op(item.clone()).await {
        Ok(value) => TaskOutcome::Success {
            index,
            item,
            value,
            duration: started.elapsed(),
        },
        Err(error) => TaskOutcome::Failure {
            index,
            item,
            error,
            duration: started.elapsed(),
        },
    }
}

/// Wrap an operation so any single invocation that runs longer than `limit`
/// settles as a timeout failure instead of holding its slot indefinitely.
///
/// The scheduler has no built-in cancellation; a hung operation would
/// otherwise starve throughput. The wrapped operation is a drop-in `op` for
/// [`run_batch`](crate::batch::run_batch).
pub fn with_timeout<I, T, F, Fut>(
    op: F,
    limit: Duration,
) -> impl Fn(I) -> BoxFuture<'static, Result<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    move |item| {
        let operation = op(item);
        async move {
            match tokio::time::timeout(limit, operation).await {
                Ok(settled) => settled,
                Err(_) => Err(FastConvertError::timeout(limit, None)),
            }
        }
        .boxed()
    }
}
