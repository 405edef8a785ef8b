//! Observability counters for admission decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters of admission outcomes across all hosts.
///
/// Cloning shares the underlying counters. All updates are relaxed atomic
/// increments, so recording never blocks a request.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Requests admitted, including disabled and unknown hosts
    requests_admitted: AtomicU64,
    /// Requests rejected
    requests_rejected: AtomicU64,
    /// Decisions asked for hosts with no record
    unknown_hosts: AtomicU64,
}

impl Metrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_host(&self) {
        self.inner.unknown_hosts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total requests admitted.
    pub fn requests_admitted(&self) -> u64 {
        self.inner.requests_admitted.load(Ordering::Relaxed)
    }

    /// Total requests rejected.
    pub fn requests_rejected(&self) -> u64 {
        self.inner.requests_rejected.load(Ordering::Relaxed)
    }

    /// Total decisions made for unregistered hosts.
    pub fn unknown_hosts(&self) -> u64 {
        self.inner.unknown_hosts.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_admitted: self.requests_admitted(),
            requests_rejected: self.requests_rejected(),
            unknown_hosts: self.unknown_hosts(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total requests admitted
    pub requests_admitted: u64,
    /// Total requests rejected
    pub requests_rejected: u64,
    /// Total decisions made for unregistered hosts
    pub unknown_hosts: u64,
}

impl MetricsSnapshot {
    /// Share of decisions that rejected (0.0 to 1.0), 0.0 before any request.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.requests_rejected as f64 / total as f64
        }
    }

    /// Admitted plus rejected.
    pub fn total_requests(&self) -> u64 {
        self.requests_admitted.saturating_add(self.requests_rejected)
    }
}
