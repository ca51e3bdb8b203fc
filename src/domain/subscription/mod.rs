//! Subscription module - aggregate, query model and events.

mod aggregate;
mod events;
mod query;

pub use aggregate::Subscription;
pub use events::{SubscriptionCreated, SubscriptionDeleted};
pub use query::{Period, SortField, SubscriptionQuery};
