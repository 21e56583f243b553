//! DAQ module implementations
//!
//! - [`WorkerThread`]: restartable background loop used by active modules
//! - [`FanOutModule`]: distributes one input queue over many outputs
//! - [`FakeDataProducer`] / [`FakeDataConsumer`]: synthetic data for testing graphs
//! - [`DebugLoggingModule`]: logs commands, touches no queues
//! - [`ModuleRegistry`]: plugin name -> constructor

mod consumer;
mod debug_logging;
mod error;
mod fanout;
mod producer;
mod registry;
mod worker;

pub use consumer::{ConsumerStats, FakeDataConsumer};
pub use debug_logging::DebugLoggingModule;
pub use error::{RegistryError, WorkerError};
pub use fanout::{FanOutMode, FanOutModule, FanOutSettings, FanOutValue};
pub use producer::{FakeDataProducer, SequenceSettings};
pub use registry::{ModuleFactory, ModuleInit, ModuleRegistry};
pub use worker::{RunFlag, WorkerThread};
