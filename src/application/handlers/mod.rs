//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    // Commands
    CreateSubscriptionCommand, CreateSubscriptionHandler,
    DeleteSubscriptionCommand, DeleteSubscriptionHandler,
    UpdateSubscriptionCommand, UpdateSubscriptionHandler,
    // Queries
    GetSubscriptionHandler, GetSubscriptionQuery,
    ListSubscriptionsHandler, ListSubscriptionsQuery, ListSubscriptionsResult,
    TotalCostHandler, TotalCostQuery,
    // Filters
    periods, SubscriptionFilter,
};
