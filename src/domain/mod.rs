//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, paging, errors, events)
//! - `subscription` - Subscription aggregate, temporal query model and events
//!
//! Nothing in this layer performs I/O.

pub mod foundation;
pub mod subscription;
