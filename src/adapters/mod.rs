//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Durable repository, transactions and outbox
//! - `memory` - Non-durable repository for tests and local runs
//! - `events` - Outbox worker and publishers
//! - `observability` - `tracing`-backed persistence observer

pub mod events;
pub mod memory;
pub mod observability;
pub mod postgres;

pub use events::{InMemoryEventBus, LoggingPublisher, OutboxWorker, OutboxWorkerConfig};
pub use memory::InMemorySubscriptionRepository;
pub use observability::TracingObserver;
pub use postgres::{PostgresSubscriptionRepository, RetryPolicy};
