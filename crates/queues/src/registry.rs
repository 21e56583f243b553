//! QueueRegistry - alias -> queue map owned by the process
//!
//! Queues of different element types live side by side; modules resolve
//! typed handles by alias, and a request for the wrong element type is an
//! error rather than a panic.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::QueueError;
use crate::handle::{QueueSink, QueueSource};
use crate::metrics::QueueMetricsSnapshot;
use crate::queue::{BoundedQueue, QueueStatus};

struct QueueEntry {
    value_type: &'static str,
    queue: Arc<dyn Any + Send + Sync>,
    status: Arc<dyn QueueStatus>,
}

/// Registry of named queues
///
/// Filled once while the graph is constructed, then shared read-only
/// (typically behind an `Arc`) with every module.
#[derive(Default)]
pub struct QueueRegistry {
    queues: BTreeMap<String, QueueEntry>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a queue of `T`
    ///
    /// # Errors
    /// `Duplicate` if the alias is taken, `ZeroCapacity` for capacity 0.
    pub fn create<T: Send + 'static>(
        &mut self,
        name: impl Into<String>,
        capacity: usize,
    ) -> Result<Arc<BoundedQueue<T>>, QueueError> {
        let queue = BoundedQueue::new(name, capacity)?;
        self.insert(queue)
    }

    /// Register an existing queue under its own name
    pub fn insert<T: Send + 'static>(
        &mut self,
        queue: BoundedQueue<T>,
    ) -> Result<Arc<BoundedQueue<T>>, QueueError> {
        let name = queue.name().to_string();
        if self.queues.contains_key(&name) {
            return Err(QueueError::Duplicate { name });
        }

        let queue = Arc::new(queue);
        debug!(
            queue = %name,
            capacity = queue.capacity(),
            value_type = type_name::<T>(),
            "registered queue"
        );
        self.queues.insert(
            name,
            QueueEntry {
                value_type: type_name::<T>(),
                queue: Arc::clone(&queue) as Arc<dyn Any + Send + Sync>,
                status: Arc::clone(&queue) as Arc<dyn QueueStatus>,
            },
        );
        Ok(queue)
    }

    /// Typed queue by alias
    ///
    /// # Errors
    /// `NotFound` or `TypeMismatch`.
    pub fn get<T: Send + 'static>(&self, name: &str) -> Result<Arc<BoundedQueue<T>>, QueueError> {
        let entry = self
            .queues
            .get(name)
            .ok_or_else(|| QueueError::not_found(name))?;

        Arc::clone(&entry.queue)
            .downcast::<BoundedQueue<T>>()
            .map_err(|_| QueueError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                actual: entry.value_type,
            })
    }

    /// Pop handle for the queue `name`
    pub fn source<T: Send + 'static>(&self, name: &str) -> Result<QueueSource<T>, QueueError> {
        self.get(name).map(QueueSource::new)
    }

    /// Push handle for the queue `name`
    pub fn sink<T: Send + 'static>(&self, name: &str) -> Result<QueueSink<T>, QueueError> {
        self.get(name).map(QueueSink::new)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Registered aliases, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    /// Point-in-time view of every queue, sorted by alias
    pub fn summaries(&self) -> Vec<QueueSummary> {
        self.queues
            .values()
            .map(|entry| QueueSummary {
                name: entry.status.name().to_string(),
                value_type: entry.value_type,
                capacity: entry.status.capacity(),
                len: entry.status.len(),
                metrics: entry.status.metrics_snapshot(),
            })
            .collect()
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("queues", &self.queues.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reporting view of one queue
#[derive(Debug, Clone)]
pub struct QueueSummary {
    pub name: String,
    pub value_type: &'static str,
    pub capacity: usize,
    pub len: usize,
    pub metrics: QueueMetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_handles_share_one_queue() {
        let mut registry = QueueRegistry::new();
        registry.create::<String>("text", 2).unwrap();

        let sink = registry.sink::<String>("text").unwrap();
        let source = registry.source::<String>("text").unwrap();

        sink.push("hello".to_string(), Duration::ZERO).unwrap();
        assert!(source.can_pop());
        assert_eq!(source.pop(Duration::ZERO).as_deref(), Some("hello"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut registry = QueueRegistry::new();
        registry.create::<i64>("q", 1).unwrap();

        let err = registry.create::<i64>("q", 5).unwrap_err();
        assert_eq!(err, QueueError::Duplicate { name: "q".into() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_errors() {
        let mut registry = QueueRegistry::new();
        registry.create::<Vec<i64>>("vectors", 3).unwrap();

        assert_eq!(
            registry.source::<i64>("missing").unwrap_err(),
            QueueError::not_found("missing")
        );
        assert!(matches!(
            registry.sink::<i64>("vectors").unwrap_err(),
            QueueError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_summaries_report_state() {
        let mut registry = QueueRegistry::new();
        let q = registry.create::<i64>("b", 2).unwrap();
        registry.create::<String>("a", 1).unwrap();

        q.push(1, Duration::ZERO).unwrap();

        let summaries = registry.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "a");
        assert_eq!(summaries[1].len, 1);
        assert_eq!(summaries[1].metrics.pushed, 1);
    }
}
