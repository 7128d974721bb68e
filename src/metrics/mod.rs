//! Lock-free performance counters for indexing and search operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

const SLOW_INDEXING_THRESHOLD_MS: u64 = 1000;
const SLOW_SEARCH_THRESHOLD_MS: u64 = 100;

/// Atomic counters tracking indexing and search activity.
///
/// All updates are lock-free; readers take a [`MetricsSnapshot`] at any time
/// without blocking writers. Memory usage is sampled opportunistically while
/// recording indexing operations, and the peak is maintained with a
/// compare-and-swap loop.
#[derive(Default)]
pub struct PerformanceMetrics {
    files_indexed: AtomicU64,
    search_queries: AtomicU64,
    indexing_time_ms: AtomicU64,
    search_time_ms: AtomicU64,
    peak_memory_bytes: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed file-indexing operation.
    pub fn record_indexing(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.files_indexed.fetch_add(1, Ordering::Relaxed);
        self.indexing_time_ms.fetch_add(millis, Ordering::Relaxed);
        self.sample_memory();

        if millis > SLOW_INDEXING_THRESHOLD_MS {
            warn!("Slow indexing operation: {}ms", millis);
        }
    }

    /// Record one completed search query.
    pub fn record_search(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.search_queries.fetch_add(1, Ordering::Relaxed);
        self.search_time_ms.fetch_add(millis, Ordering::Relaxed);

        if millis > SLOW_SEARCH_THRESHOLD_MS {
            warn!("Slow search operation: {}ms", millis);
        }
    }

    /// Take a consistent-enough snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.sample_memory();

        let files_indexed = self.files_indexed.load(Ordering::Relaxed);
        let search_queries = self.search_queries.load(Ordering::Relaxed);
        let total_indexing_ms = self.indexing_time_ms.load(Ordering::Relaxed);
        let total_search_ms = self.search_time_ms.load(Ordering::Relaxed);

        let avg_indexing_ms = if files_indexed == 0 {
            0
        } else {
            total_indexing_ms / files_indexed
        };
        let avg_search_ms = if search_queries == 0 {
            0
        } else {
            total_search_ms / search_queries
        };

        MetricsSnapshot {
            files_indexed,
            search_queries,
            total_indexing_ms,
            total_search_ms,
            avg_indexing_ms,
            avg_search_ms,
            current_memory_bytes: current_memory_bytes(),
            peak_memory_bytes: self.peak_memory_bytes.load(Ordering::Relaxed),
            healthy: avg_indexing_ms < SLOW_INDEXING_THRESHOLD_MS
                && avg_search_ms < SLOW_SEARCH_THRESHOLD_MS,
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.files_indexed.store(0, Ordering::Relaxed);
        self.search_queries.store(0, Ordering::Relaxed);
        self.indexing_time_ms.store(0, Ordering::Relaxed);
        self.search_time_ms.store(0, Ordering::Relaxed);
        self.peak_memory_bytes.store(0, Ordering::Relaxed);
    }

    fn sample_memory(&self) {
        let current = current_memory_bytes();
        let mut peak = self.peak_memory_bytes.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_memory_bytes.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
    }
}

/// Point-in-time view of the performance counters.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub files_indexed: u64,
    pub search_queries: u64,
    pub total_indexing_ms: u64,
    pub total_search_ms: u64,
    pub avg_indexing_ms: u64,
    pub avg_search_ms: u64,
    pub current_memory_bytes: u64,
    pub peak_memory_bytes: u64,
    pub healthy: bool,
}

impl MetricsSnapshot {
    /// Human-readable health status.
    pub fn health_summary(&self) -> String {
        if self.healthy {
            return "System is performing well".to_string();
        }

        let mut issues = Vec::new();
        if self.avg_search_ms >= SLOW_SEARCH_THRESHOLD_MS {
            issues.push(format!(
                "slow search performance ({}ms avg)",
                self.avg_search_ms
            ));
        }
        if self.avg_indexing_ms >= SLOW_INDEXING_THRESHOLD_MS {
            issues.push(format!(
                "slow indexing performance ({}ms avg)",
                self.avg_indexing_ms
            ));
        }
        format!("Performance issues detected: {}", issues.join(", "))
    }
}

/// Resident set size of the current process in bytes, or zero when the probe
/// is disabled or unsupported.
#[cfg(all(feature = "memory-probe", target_os = "linux"))]
fn current_memory_bytes() -> u64 {
    // /proc/self/statm: second field is resident pages; assumes 4 KiB pages
    std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|s| s.split_whitespace().nth(1)?.parse::<u64>().ok())
        .map(|pages| pages * 4096)
        .unwrap_or(0)
}

#[cfg(not(all(feature = "memory-probe", target_os = "linux")))]
fn current_memory_bytes() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counts_give_zero_averages() {
        let metrics = PerformanceMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_indexed, 0);
        assert_eq!(snapshot.avg_indexing_ms, 0);
        assert_eq!(snapshot.avg_search_ms, 0);
        assert!(snapshot.healthy);
    }

    #[test]
    fn test_averages_are_integer_division() {
        let metrics = PerformanceMetrics::new();
        metrics.record_indexing(Duration::from_millis(10));
        metrics.record_indexing(Duration::from_millis(25));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_indexed, 2);
        assert_eq!(snapshot.total_indexing_ms, 35);
        assert_eq!(snapshot.avg_indexing_ms, 17);
    }

    #[test]
    fn test_unhealthy_on_slow_search() {
        let metrics = PerformanceMetrics::new();
        metrics.record_search(Duration::from_millis(500));
        let snapshot = metrics.snapshot();
        assert!(!snapshot.healthy);
        assert!(snapshot.health_summary().contains("slow search"));
    }

    #[test]
    fn test_reset() {
        let metrics = PerformanceMetrics::new();
        metrics.record_indexing(Duration::from_millis(5));
        metrics.record_search(Duration::from_millis(5));
        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_indexed, 0);
        assert_eq!(snapshot.search_queries, 0);
        assert_eq!(snapshot.total_indexing_ms, 0);
        assert_eq!(snapshot.total_search_ms, 0);
    }

    #[test]
    fn test_peak_memory_never_decreases() {
        let metrics = PerformanceMetrics::new();
        metrics.record_indexing(Duration::from_millis(1));
        let first = metrics.snapshot().peak_memory_bytes;
        metrics.record_indexing(Duration::from_millis(1));
        let second = metrics.snapshot().peak_memory_bytes;
        assert!(second >= first);
    }
}
