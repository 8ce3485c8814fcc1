//! Router metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one inbound router
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Raw envelopes received from the transport
    received_count: AtomicU64,
    /// Envelopes routed to a typed message
    routed_count: AtomicU64,
    /// Envelopes rejected (any reason)
    rejected_count: AtomicU64,
}

impl RouterMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get received count
    pub fn received_count(&self) -> u64 {
        self.received_count.load(Ordering::Relaxed)
    }

    /// Increment received count
    pub fn inc_received(&self) {
        self.received_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get routed count
    pub fn routed_count(&self) -> u64 {
        self.routed_count.load(Ordering::Relaxed)
    }

    /// Increment routed count
    pub fn inc_routed(&self) {
        self.routed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get rejected count
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Increment rejected count
    pub fn inc_rejected(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received_count: self.received_count(),
            routed_count: self.routed_count(),
            rejected_count: self.rejected_count(),
        }
    }
}

/// Snapshot of router metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub received_count: u64,
    pub routed_count: u64,
    pub rejected_count: u64,
}
