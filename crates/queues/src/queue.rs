//! BoundedQueue - fixed capacity FIFO with timed push/pop

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use metrics::counter;
use tracing::trace;

use crate::error::{PushTimeout, QueueError};
use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};

/// Bounded, internally synchronized FIFO queue
///
/// Safe for concurrent push and pop from any number of threads. Both
/// channel ends live inside the queue, so it never disconnects while it
/// exists.
///
/// `can_push`/`can_pop` are advisory: another producer or consumer may act
/// between the check and the following timed call, which must therefore be
/// allowed to fail.
pub struct BoundedQueue<T> {
    name: String,
    capacity: usize,
    tx: Sender<T>,
    rx: Receiver<T>,
    metrics: QueueMetrics,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` elements
    ///
    /// # Errors
    /// [`QueueError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, QueueError> {
        let name = name.into();
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity { name });
        }
        let (tx, rx) = channel::bounded(capacity);
        Ok(Self {
            name,
            capacity,
            tx,
            rx,
            metrics: QueueMetrics::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered elements, always in `[0, capacity]`
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// At least one element is buffered (advisory)
    pub fn can_pop(&self) -> bool {
        !self.rx.is_empty()
    }

    /// There is room for at least one more element (advisory)
    pub fn can_push(&self) -> bool {
        !self.tx.is_full()
    }

    /// Remove the oldest element, waiting up to `timeout` for one to arrive
    ///
    /// A zero timeout tries once without waiting. Returns `None` on timeout.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let result = if timeout.is_zero() {
            self.rx.try_recv().ok()
        } else {
            match self.rx.recv_timeout(timeout) {
                Ok(value) => Some(value),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            }
        };

        match result {
            Some(value) => {
                self.metrics.inc_popped();
                Some(value)
            }
            None => {
                self.metrics.inc_pop_timeouts();
                trace!(queue = %self.name, timeout_us = timeout.as_micros() as u64, "pop timed out");
                None
            }
        }
    }

    /// Append `value`, waiting up to `timeout` for space
    ///
    /// # Errors
    /// On timeout the value is not enqueued and comes back inside
    /// [`PushTimeout`]; the caller decides whether it is dropped.
    pub fn push(&self, value: T, timeout: Duration) -> Result<(), PushTimeout<T>> {
        let result = if timeout.is_zero() {
            self.tx.try_send(value).map_err(|e| e.into_inner())
        } else {
            self.tx.send_timeout(value, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(v) | SendTimeoutError::Disconnected(v) => v,
            })
        };

        match result {
            Ok(()) => {
                self.metrics.inc_pushed();
                Ok(())
            }
            Err(value) => {
                self.metrics.inc_push_timeouts();
                counter!("daq_queue_push_timeouts_total", "queue" => self.name.clone()).increment(1);
                trace!(queue = %self.name, timeout_us = timeout.as_micros() as u64, "push timed out");
                Err(PushTimeout(value))
            }
        }
    }

    /// Current counters
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }
}

/// Type-erased view of a queue's state, for reporting
pub trait QueueStatus: Send + Sync {
    fn name(&self) -> &str;
    fn capacity(&self) -> usize;
    fn len(&self) -> usize;
    fn metrics_snapshot(&self) -> QueueMetricsSnapshot;
}

impl<T: Send> QueueStatus for BoundedQueue<T> {
    fn name(&self) -> &str {
        BoundedQueue::name(self)
    }

    fn capacity(&self) -> usize {
        BoundedQueue::capacity(self)
    }

    fn len(&self) -> usize {
        BoundedQueue::len(self)
    }

    fn metrics_snapshot(&self) -> QueueMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
