//! In-memory adapters - Non-durable implementations of repository ports.

mod subscription_repository;

pub use subscription_repository::InMemorySubscriptionRepository;
