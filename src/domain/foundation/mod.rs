//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, paging requests, events and error
//! types that form the vocabulary of the subscriptions domain.

mod errors;
mod events;
mod ids;
mod paging;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{domain_event, DomainEvent, SerializableDomainEvent};
pub use ids::{EventId, SubscriptionId, UserId};
pub use paging::{Pagination, SortDirection, Sorting, DEFAULT_PAGE_SIZE};
pub use timestamp::Timestamp;
