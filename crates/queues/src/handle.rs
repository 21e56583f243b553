//! Source and sink handles held by modules

use std::sync::Arc;
use std::time::Duration;

use crate::error::PushTimeout;
use crate::queue::BoundedQueue;

/// Pop side of a shared queue
pub struct QueueSource<T> {
    queue: Arc<BoundedQueue<T>>,
}

impl<T> QueueSource<T> {
    pub fn new(queue: Arc<BoundedQueue<T>>) -> Self {
        Self { queue }
    }

    /// Alias of the underlying queue
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn can_pop(&self) -> bool {
        self.queue.can_pop()
    }

    pub fn pop(&self, timeout: Duration) -> Option<T> {
        self.queue.pop(timeout)
    }
}

impl<T> Clone for QueueSource<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Push side of a shared queue
pub struct QueueSink<T> {
    queue: Arc<BoundedQueue<T>>,
}

impl<T> QueueSink<T> {
    pub fn new(queue: Arc<BoundedQueue<T>>) -> Self {
        Self { queue }
    }

    /// Alias of the underlying queue
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn can_push(&self) -> bool {
        self.queue.can_push()
    }

    pub fn push(&self, value: T, timeout: Duration) -> Result<(), PushTimeout<T>> {
        self.queue.push(value, timeout)
    }
}

impl<T> Clone for QueueSink<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> std::fmt::Debug for QueueSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueueSource").field(&self.name()).finish()
    }
}

impl<T> std::fmt::Debug for QueueSink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueueSink").field(&self.name()).finish()
    }
}
