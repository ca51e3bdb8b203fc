//! Outbox ports - events awaiting delivery.
//!
//! Records are written inside the transaction that changed the aggregate
//! (see [`UnitOfWork::create_event`](super::UnitOfWork::create_event)) and
//! drained by the outbox worker. A record leaves the store only after the
//! publisher has acknowledged it.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::foundation::{EventId, SerializableDomainEvent, Timestamp};

/// An undelivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub id: EventId,
    /// Event type; also the publish topic.
    pub event_type: String,
    /// Serialized event body.
    pub payload: Vec<u8>,
    pub created_at: Timestamp,
}

impl OutboxRecord {
    pub fn new(event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            payload,
            created_at: Timestamp::now(),
        }
    }

    /// Build a record from a domain event, keeping its id and time.
    pub fn from_event<E: SerializableDomainEvent>(event: &E) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: event.event_id(),
            event_type: event.event_type().to_string(),
            payload: event.to_payload()?,
            created_at: event.occurred_at(),
        })
    }
}

/// Read/remove side of the outbox, used by the delivery worker.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Up to `limit` records, oldest first.
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxRecord>, RepositoryError>;

    /// Remove a delivered record. Removing an absent record is not an error.
    async fn remove(&self, id: EventId) -> Result<(), RepositoryError>;
}
