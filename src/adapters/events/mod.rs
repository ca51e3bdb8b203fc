//! Event delivery adapters.
//!
//! - `OutboxWorker` - Background service draining the outbox into a publisher
//! - `InMemoryEventBus` - Recording publisher with failure injection, for tests
//! - `LoggingPublisher` - Publisher that only logs, for local runs

mod in_memory;
mod logging_publisher;
mod outbox_worker;

pub use in_memory::{InMemoryEventBus, PublishedEvent};
pub use logging_publisher::LoggingPublisher;
pub use outbox_worker::{OutboxWorker, OutboxWorkerConfig};
