//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - Subscriptions, totals, transactions and outbox
//! - `RetryPolicy` / `with_retry` - Backoff for transient connection failures

mod errors;
mod retry;
mod subscription_repository;

pub use retry::{with_retry, RetryPolicy};
pub use subscription_repository::PostgresSubscriptionRepository;
