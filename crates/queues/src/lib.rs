//! # Queues
//!
//! Bounded, typed, in-memory FIFO queues connecting modules.
//!
//! Responsibilities:
//! - `BoundedQueue<T>`: fixed capacity, blocking-with-timeout push/pop,
//!   advisory `can_push`/`can_pop`
//! - Source/sink handles resolved by alias at configure time
//! - `QueueRegistry`: type-erased alias -> queue map owned by the process
//!
//! ## Usage Example
//!
//! ```
//! use std::time::Duration;
//! use queues::QueueRegistry;
//!
//! let mut registry = QueueRegistry::new();
//! registry.create::<i64>("numbers", 4).unwrap();
//!
//! let sink = registry.sink::<i64>("numbers").unwrap();
//! let source = registry.source::<i64>("numbers").unwrap();
//!
//! sink.push(7, Duration::from_millis(10)).unwrap();
//! assert_eq!(source.pop(Duration::ZERO), Some(7));
//! ```

mod error;
mod handle;
mod metrics;
mod queue;
mod registry;

pub use error::{PushTimeout, QueueError};
pub use handle::{QueueSink, QueueSource};
pub use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::{BoundedQueue, QueueStatus};
pub use registry::{QueueRegistry, QueueSummary};
