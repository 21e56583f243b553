//! Queue counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Total successful pushes
    pushed: AtomicU64,
    /// Total successful pops
    popped: AtomicU64,
    /// Pushes that gave up because the queue stayed full
    push_timeouts: AtomicU64,
    /// Pops that gave up because the queue stayed empty
    pop_timeouts: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    pub fn inc_pushed(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn popped(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    pub fn inc_popped(&self) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn push_timeouts(&self) -> u64 {
        self.push_timeouts.load(Ordering::Relaxed)
    }

    pub fn inc_push_timeouts(&self) {
        self.push_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pop_timeouts(&self) -> u64 {
        self.pop_timeouts.load(Ordering::Relaxed)
    }

    pub fn inc_pop_timeouts(&self) {
        self.pop_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            pushed: self.pushed(),
            popped: self.popped(),
            push_timeouts: self.push_timeouts(),
            pop_timeouts: self.pop_timeouts(),
        }
    }
}

/// Snapshot of queue counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub pushed: u64,
    pub popped: u64,
    pub push_timeouts: u64,
    pub pop_timeouts: u64,
}
