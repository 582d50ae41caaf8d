//! Observer interfaces for batch progress and failures.
//!
//! The scheduler never writes to the console; it notifies typed observers in
//! real-time completion order. Multiple observers can watch the same batch
//! (a progress bar and a logger, for instance) without the scheduler knowing
//! about either.

use std::fmt;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::error::FastConvertError;

/// Notification for one successfully settled work item.
///
/// `completed` counts every settled item so far (successes and failures);
/// across a batch of N items it takes each value in `1..=N` exactly once.
#[derive(Debug)]
pub struct ProgressUpdate<'a, I, T> {
    pub item: &'a I,
    pub index: usize,
    pub completed: usize,
    pub total: usize,
    pub value: &'a T,
    /// `completed / total * 100`, full float precision, never rounded
    pub percentage: f64,
}

/// Notification for one failed work item
#[derive(Debug)]
pub struct ErrorReport<'a, I> {
    pub item: &'a I,
    pub index: usize,
    pub error: &'a FastConvertError,
    pub completed: usize,
    pub total: usize,
}

/// Observer of batch execution events.
///
/// Callbacks are invoked in real-time completion order, which may differ
/// from input order. Both methods default to no-ops so an observer can
/// subscribe to only the events it cares about.
pub trait BatchObserver<I, T>: Send + Sync {
    /// Called once per successful item, in completion order
    fn on_progress(&self, _update: &ProgressUpdate<'_, I, T>) {}

    /// Called once per failed item, in completion order
    fn on_error(&self, _report: &ErrorReport<'_, I>) {}
}

/// Terminal progress bar observer backed by indicatif
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    /// Create a bar sized for `total` items
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Finish the bar with a closing message
    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl<I: AsRef<Path>, T> BatchObserver<I, T> for ProgressBarObserver {
    fn on_progress(&self, update: &ProgressUpdate<'_, I, T>) {
        let name = update
            .item
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
        self.bar.inc(1);
    }

    fn on_error(&self, report: &ErrorReport<'_, I>) {
        let name = report
            .item
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(format!("failed: {}", name));
        self.bar.inc(1);
    }
}

/// Observer that forwards batch events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceObserver;

impl<I: fmt::Debug, T> BatchObserver<I, T> for TraceObserver {
    fn on_progress(&self, update: &ProgressUpdate<'_, I, T>) {
        debug!(
            "completed {:?} ({}/{}, {:.1}%)",
            update.item, update.completed, update.total, update.percentage
        );
    }

    fn on_error(&self, report: &ErrorReport<'_, I>) {
        warn!(
            "failed {:?} ({}/{}): {}",
            report.item,
            report.completed,
            report.total,
            report.error.user_message()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<usize>>,
    }

    impl BatchObserver<u32, u32> for Recorder {
        fn on_progress(&self, update: &ProgressUpdate<'_, u32, u32>) {
            self.seen.lock().unwrap().push(update.completed);
        }
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Silent;
        impl BatchObserver<u32, u32> for Silent {}

        let observer = Silent;
        let error = FastConvertError::validation("x", None);
        observer.on_progress(&ProgressUpdate {
            item: &1,
            index: 0,
            completed: 1,
            total: 1,
            value: &2,
            percentage: 100.0,
        });
        observer.on_error(&ErrorReport {
            item: &1,
            index: 0,
            error: &error,
            completed: 1,
            total: 1,
        });
    }

    #[test]
    fn test_custom_observer_receives_updates() {
        let recorder = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        recorder.on_progress(&ProgressUpdate {
            item: &7,
            index: 0,
            completed: 1,
            total: 2,
            value: &14,
            percentage: 50.0,
        });
        assert_eq!(*recorder.seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_progress_bar_observer_counts_both_outcomes() {
        let observer = ProgressBarObserver::new(2);
        let error = FastConvertError::validation("bad", None);
        let item = PathBuf::from("a.jpg");

        BatchObserver::<PathBuf, ()>::on_progress(
            &observer,
            &ProgressUpdate {
                item: &item,
                index: 0,
                completed: 1,
                total: 2,
                value: &(),
                percentage: 50.0,
            },
        );
        BatchObserver::<PathBuf, ()>::on_error(
            &observer,
            &ErrorReport {
                item: &item,
                index: 1,
                error: &error,
                completed: 2,
                total: 2,
            },
        );

        assert_eq!(observer.bar.position(), 2);
        observer.finish();
    }
}
