//! Concurrency sizing for batch runs.
//!
//! The scheduler never queries the host directly; it asks a
//! [`ParallelismProvider`] so tests can simulate arbitrary machines.

use sysinfo::{System, SystemExt};
use tracing::debug;

/// Fallback worker count when the host parallelism cannot be determined
pub const DEFAULT_PARALLELISM: usize = 4;

/// Reports the parallel-execution capacity of the host
pub trait ParallelismProvider: Send + Sync {
    /// Number of parallel-execution units available on the host
    fn available_parallelism(&self) -> usize;

    /// Estimate of currently available memory, in bytes
    fn available_memory(&self) -> u64;
}

/// Provider backed by the real host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemParallelism;

impl ParallelismProvider for SystemParallelism {
    fn available_parallelism(&self) -> usize {
        let detected = num_cpus::get();
        if detected > 0 {
            detected
        } else {
            DEFAULT_PARALLELISM
        }
    }

    fn available_memory(&self) -> u64 {
        let mut system = System::new();
        system.refresh_memory();
        system.available_memory()
    }
}

/// Fixed provider for simulating hosts of arbitrary size
#[derive(Debug, Clone, Copy)]
pub struct FixedParallelism {
    pub units: usize,
    pub memory: u64,
}

impl FixedParallelism {
    /// Create a provider reporting `units` cores and `memory` bytes available
    pub fn new(units: usize, memory: u64) -> Self {
        Self { units, memory }
    }
}

impl ParallelismProvider for FixedParallelism {
    fn available_parallelism(&self) -> usize {
        self.units.max(1)
    }

    fn available_memory(&self) -> u64 {
        self.memory
    }
}

/// Optional bounds for [`recommend_concurrency`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SizingOptions {
    /// Lower bound on the recommendation (default 1)
    pub min_concurrency: Option<usize>,
    /// Upper bound on the recommendation (default: host parallelism)
    pub max_concurrency: Option<usize>,
    /// Estimated memory cost per concurrent item, in bytes
    pub memory_per_item: Option<u64>,
}

impl SizingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lower bound
    pub fn min_concurrency(mut self, min: usize) -> Self {
        self.min_concurrency = Some(min);
        self
    }

    /// Set the upper bound
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Set the estimated per-item memory cost in bytes
    pub fn memory_per_item(mut self, bytes: u64) -> Self {
        self.memory_per_item = Some(bytes);
        self
    }
}

/// Recommend a concurrency level for `item_count` work items on this host.
///
/// Never recommends more workers than there is work, and caps the result so
/// `recommendation * memory_per_item` stays within available memory (floored
/// at 1 even under extreme pressure). When `max_concurrency` is below
/// `min_concurrency` the min bound wins; clamping is applied min-last.
pub fn recommend_concurrency(item_count: usize, options: &SizingOptions) -> usize {
    recommend_concurrency_with(&SystemParallelism, item_count, options)
}

/// [`recommend_concurrency`] against an injected provider
pub fn recommend_concurrency_with(
    provider: &dyn ParallelismProvider,
    item_count: usize,
    options: &SizingOptions,
) -> usize {
    let units = provider.available_parallelism().max(1);

    // Never more workers than there is work
    let mut recommendation = units.min(item_count).max(1);

    if let Some(per_item) = options.memory_per_item {
        if per_item > 0 {
            let affordable = (provider.available_memory() / per_item).max(1) as usize;
            if affordable < recommendation {
                debug!(
                    "memory pressure: capping concurrency {} -> {}",
                    recommendation, affordable
                );
                recommendation = affordable;
            }
        }
    }

    let floor = options.min_concurrency.unwrap_or(1).max(1);
    let ceiling = options.max_concurrency.unwrap_or(units).max(1);

    recommendation.min(ceiling).max(floor)
}

/// Resolve the slot count actually used for a batch run: the requested value
/// clamped to `[1, host units]`, or the host unit count when unspecified.
pub(crate) fn effective_concurrency(
    requested: Option<usize>,
    provider: &dyn ParallelismProvider,
) -> usize {
    let units = provider.available_parallelism().max(1);
    requested.unwrap_or(units).clamp(1, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_never_more_workers_than_work() {
        let host = FixedParallelism::new(16, 32 * GB);
        assert_eq!(
            recommend_concurrency_with(&host, 3, &SizingOptions::default()),
            3
        );
        assert_eq!(
            recommend_concurrency_with(&host, 1, &SizingOptions::default()),
            1
        );
    }

    #[test]
    fn test_host_bounds_large_batches() {
        let host = FixedParallelism::new(8, 32 * GB);
        assert_eq!(
            recommend_concurrency_with(&host, 1000, &SizingOptions::default()),
            8
        );
    }

    #[test]
    fn test_explicit_max_bound() {
        let host = FixedParallelism::new(16, 32 * GB);
        let options = SizingOptions::new().max_concurrency(4);
        assert_eq!(recommend_concurrency_with(&host, 100, &options), 4);
    }

    #[test]
    fn test_explicit_min_bound() {
        let host = FixedParallelism::new(16, 32 * GB);
        let options = SizingOptions::new().min_concurrency(2);
        assert_eq!(recommend_concurrency_with(&host, 1, &options), 2);
    }

    #[test]
    fn test_min_wins_over_max() {
        let host = FixedParallelism::new(16, 32 * GB);
        let options = SizingOptions::new().min_concurrency(6).max_concurrency(2);
        assert_eq!(recommend_concurrency_with(&host, 100, &options), 6);
    }

    #[test]
    fn test_memory_cap() {
        let host = FixedParallelism::new(8, GB);
        let options = SizingOptions::new().memory_per_item(512 * 1024 * 1024);
        assert_eq!(recommend_concurrency_with(&host, 100, &options), 2);
    }

    #[test]
    fn test_memory_pressure_floors_at_one() {
        let host = FixedParallelism::new(8, GB);
        let options = SizingOptions::new().memory_per_item(10 * GB);
        assert_eq!(recommend_concurrency_with(&host, 100, &options), 1);
    }

    #[test]
    fn test_zero_items_still_returns_one() {
        let host = FixedParallelism::new(8, GB);
        assert_eq!(
            recommend_concurrency_with(&host, 0, &SizingOptions::default()),
            1
        );
    }

    #[test]
    fn test_effective_concurrency_clamps() {
        let host = FixedParallelism::new(4, GB);
        assert_eq!(effective_concurrency(Some(100), &host), 4);
        assert_eq!(effective_concurrency(Some(0), &host), 1);
        assert_eq!(effective_concurrency(Some(2), &host), 2);
        assert_eq!(effective_concurrency(None, &host), 4);
    }

    #[test]
    fn test_system_provider_reports_something() {
        let provider = SystemParallelism;
        assert!(provider.available_parallelism() >= 1);
    }
}
