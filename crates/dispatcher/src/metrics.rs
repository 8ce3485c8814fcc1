//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages accepted (delivered or durably enqueued)
    accepted_count: AtomicU64,
    /// Messages parked in the retry queue
    queued_count: AtomicU64,
    /// Messages that failed outright
    failed_count: AtomicU64,
    /// Successful immediate-tier sends
    immediate_sent: AtomicU64,
    /// Immediate-tier send failures
    immediate_failures: AtomicU64,
    /// Durable-tier enqueues
    durable_enqueued: AtomicU64,
    /// Retry-queue drain passes
    drain_count: AtomicU64,
    /// Current retry queue depth
    retry_depth: AtomicUsize,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get accepted count
    pub fn accepted_count(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    /// Increment accepted count
    pub fn inc_accepted(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get queued count
    pub fn queued_count(&self) -> u64 {
        self.queued_count.load(Ordering::Relaxed)
    }

    /// Increment queued count
    pub fn inc_queued(&self) {
        self.queued_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failed count
    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// Increment failed count
    pub fn inc_failed(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get immediate send count
    pub fn immediate_sent(&self) -> u64 {
        self.immediate_sent.load(Ordering::Relaxed)
    }

    /// Increment immediate send count
    pub fn inc_immediate_sent(&self) {
        self.immediate_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get immediate failure count
    pub fn immediate_failures(&self) -> u64 {
        self.immediate_failures.load(Ordering::Relaxed)
    }

    /// Increment immediate failure count
    pub fn inc_immediate_failure(&self) {
        self.immediate_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get durable enqueue count
    pub fn durable_enqueued(&self) -> u64 {
        self.durable_enqueued.load(Ordering::Relaxed)
    }

    /// Increment durable enqueue count
    pub fn inc_durable_enqueued(&self) {
        self.durable_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get drain pass count
    pub fn drain_count(&self) -> u64 {
        self.drain_count.load(Ordering::Relaxed)
    }

    /// Increment drain pass count
    pub fn inc_drain(&self) {
        self.drain_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current retry queue depth
    pub fn retry_depth(&self) -> usize {
        self.retry_depth.load(Ordering::Relaxed)
    }

    /// Set current retry queue depth
    pub fn set_retry_depth(&self, depth: usize) {
        self.retry_depth.store(depth, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted_count: self.accepted_count(),
            queued_count: self.queued_count(),
            failed_count: self.failed_count(),
            immediate_sent: self.immediate_sent(),
            immediate_failures: self.immediate_failures(),
            durable_enqueued: self.durable_enqueued(),
            drain_count: self.drain_count(),
            retry_depth: self.retry_depth(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub accepted_count: u64,
    pub queued_count: u64,
    pub failed_count: u64,
    pub immediate_sent: u64,
    pub immediate_failures: u64,
    pub durable_enqueued: u64,
    pub drain_count: u64,
    pub retry_depth: usize,
}
