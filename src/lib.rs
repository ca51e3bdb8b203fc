//! Subs - Subscription persistence service
//!
//! Stores user subscriptions to paid services with optimistic concurrency,
//! retries transient storage failures, and delivers domain events through a
//! transactional outbox.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
