//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared by a dispatcher and all of its workers
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Workers currently alive
    active_workers: AtomicUsize,
    /// Highest number of workers alive at once
    peak_active_workers: AtomicUsize,
    /// Total dispatches started
    dispatch_count: AtomicU64,
    /// Dispatches that ended on the deadline
    timeout_count: AtomicU64,
    /// Dispatches rejected before any worker was spawned
    rejected_count: AtomicU64,
    /// Outcomes observed by a collector
    collected_count: AtomicU64,
    /// Outcomes published by workers, observed or not
    published_count: AtomicU64,
    /// Published successes
    success_count: AtomicU64,
    /// Published failures
    failure_count: AtomicU64,
    /// Workers stopped by deadline cancellation
    cancelled_count: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of live workers
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    /// Get peak number of live workers
    pub fn peak_active_workers(&self) -> usize {
        self.peak_active_workers.load(Ordering::SeqCst)
    }

    /// Register a worker start; returns the new live count
    pub(crate) fn worker_started(&self) -> usize {
        let active = self.active_workers.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active_workers.fetch_max(active, Ordering::SeqCst);
        active
    }

    /// Register a worker exit; returns the new live count
    pub(crate) fn worker_exited(&self) -> usize {
        self.active_workers.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_dispatch_count(&self) {
        self.dispatch_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeout_count(&self) -> u64 {
        self.timeout_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_timeout_count(&self) {
        self.timeout_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn collected_count(&self) -> u64 {
        self.collected_count.load(Ordering::Relaxed)
    }

    pub(crate) fn add_collected(&self, n: usize) {
        self.collected_count.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn published_count(&self) -> u64 {
        self.published_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_published(&self, success: bool) {
        self.published_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_cancelled_count(&self) {
        self.cancelled_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_workers: self.active_workers(),
            peak_active_workers: self.peak_active_workers(),
            dispatch_count: self.dispatch_count(),
            timeout_count: self.timeout_count(),
            rejected_count: self.rejected_count(),
            collected_count: self.collected_count(),
            published_count: self.published_count(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            cancelled_count: self.cancelled_count(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub active_workers: usize,
    pub peak_active_workers: usize,
    pub dispatch_count: u64,
    pub timeout_count: u64,
    pub rejected_count: u64,
    pub collected_count: u64,
    pub published_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub cancelled_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_gauge_tracks_peak() {
        let metrics = DispatcherMetrics::new();
        assert_eq!(metrics.worker_started(), 1);
        assert_eq!(metrics.worker_started(), 2);
        assert_eq!(metrics.worker_exited(), 1);
        assert_eq!(metrics.worker_started(), 2);
        assert_eq!(metrics.worker_exited(), 1);
        assert_eq!(metrics.worker_exited(), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_workers, 0);
        assert_eq!(snapshot.peak_active_workers, 2);
    }

    #[test]
    fn test_published_split() {
        let metrics = DispatcherMetrics::new();
        metrics.inc_published(true);
        metrics.inc_published(false);
        metrics.inc_published(true);
        assert_eq!(metrics.published_count(), 3);
        assert_eq!(metrics.success_count(), 2);
        assert_eq!(metrics.failure_count(), 1);
    }
}
