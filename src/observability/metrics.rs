//! Guard metrics
//!
//! Counters only, monotonic, reset only on process start. All counters use
//! Relaxed atomics; metrics tolerate eventual consistency.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for every terminal guard state
#[derive(Debug, Default)]
pub struct GuardMetrics {
    /// Queries that entered the guard
    checks: AtomicU64,
    /// Queries passed without an explain round trip
    short_circuits: AtomicU64,
    /// Queries whose winning plan was accepted
    passes: AtomicU64,
    /// Queries rejected for a collection scan
    full_scan_rejections: AtomicU64,
    /// Queries rejected for an in-memory sort
    sort_rejections: AtomicU64,
    /// Explain round trips that failed
    execution_failures: AtomicU64,
}

impl GuardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_checks(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_short_circuits(&self) {
        self.short_circuits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_passes(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_full_scan_rejections(&self) {
        self.full_scan_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sort_rejections(&self) {
        self.sort_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_execution_failures(&self) {
        self.execution_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            short_circuits: self.short_circuits.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            full_scan_rejections: self.full_scan_rejections.load(Ordering::Relaxed),
            sort_rejections: self.sort_rejections.load(Ordering::Relaxed),
            execution_failures: self.execution_failures.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub checks: u64,
    pub short_circuits: u64,
    pub passes: u64,
    pub full_scan_rejections: u64,
    pub sort_rejections: u64,
    pub execution_failures: u64,
}

impl MetricsSnapshot {
    /// Queries rejected for either reason
    pub fn rejections(&self) -> u64 {
        self.full_scan_rejections + self.sort_rejections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let snapshot = GuardMetrics::new().snapshot();
        assert_eq!(snapshot.checks, 0);
        assert_eq!(snapshot.rejections(), 0);
    }

    #[test]
    fn test_increment_counters() {
        let metrics = GuardMetrics::new();
        metrics.increment_checks();
        metrics.increment_checks();
        metrics.increment_short_circuits();
        metrics.increment_full_scan_rejections();
        metrics.increment_sort_rejections();
        metrics.increment_execution_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks, 2);
        assert_eq!(snapshot.short_circuits, 1);
        assert_eq!(snapshot.rejections(), 2);
        assert_eq!(snapshot.execution_failures, 1);
        assert_eq!(snapshot.passes, 0);
    }

    #[test]
    fn test_to_json() {
        let metrics = GuardMetrics::new();
        metrics.increment_passes();

        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["passes"], 1);
        assert_eq!(parsed["sort_rejections"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(GuardMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_checks();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().checks, 800);
    }
}
