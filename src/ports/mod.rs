//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `SubscriptionRepository` - CRUD and filtered listing
//! - `SubscriptionStatsRepository` - Counts and price totals over the same filters
//! - `TransactionRunner` / `UnitOfWork` - Atomic aggregate + outbox writes
//! - `RepositoryError` - Failure taxonomy shared by all of the above
//!
//! ## Delivery Ports
//!
//! - `OutboxStore` - Pending events, drained by the outbox worker
//! - `EventPublisher` - External bus the worker publishes to
//! - `PersistenceObserver` - Structured sink for retries and delivery outcomes

mod event_publisher;
mod observer;
mod outbox_store;
mod repository_error;
mod subscription_repository;
mod transaction;

pub use event_publisher::{EventPublisher, PublishError};
pub use observer::{NoopObserver, PersistenceObserver};
pub use outbox_store::{OutboxRecord, OutboxStore};
pub use repository_error::{BoxError, RepositoryError};
pub use subscription_repository::{SubscriptionRepository, SubscriptionStatsRepository};
pub use transaction::{unit_of_work, TransactionRunner, TransactionWork, UnitOfWork};
