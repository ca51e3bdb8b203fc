//! Subscription domain events.
//!
//! Only the identifying fields are serialized into the outbox payload;
//! event id and occurrence time live in their own outbox columns.

use serde::Serialize;

use super::Subscription;
use crate::domain::foundation::{domain_event, EventId, SubscriptionId, Timestamp, UserId};

/// Published when a subscription has been created.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCreated {
    #[serde(skip)]
    pub event_id: EventId,
    pub id: SubscriptionId,
    pub user_id: UserId,
    #[serde(skip)]
    pub occurred_at: Timestamp,
}

impl SubscriptionCreated {
    pub fn new(subscription: &Subscription) -> Self {
        Self {
            event_id: EventId::new(),
            id: subscription.id(),
            user_id: subscription.user_id(),
            occurred_at: Timestamp::now(),
        }
    }
}

domain_event!(
    SubscriptionCreated,
    event_type = "subscription_created",
    aggregate_id = id,
    occurred_at = occurred_at,
    event_id = event_id
);

/// Published when a subscription has been deleted.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDeleted {
    #[serde(skip)]
    pub event_id: EventId,
    pub id: SubscriptionId,
    #[serde(skip)]
    pub occurred_at: Timestamp,
}

impl SubscriptionDeleted {
    pub fn new(id: SubscriptionId) -> Self {
        Self {
            event_id: EventId::new(),
            id,
            occurred_at: Timestamp::now(),
        }
    }
}

domain_event!(
    SubscriptionDeleted,
    event_type = "subscription_deleted",
    aggregate_id = id,
    occurred_at = occurred_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, SerializableDomainEvent};

    #[test]
    fn created_payload_carries_ids() {
        let sub = Subscription::create(
            None,
            UserId::generate(),
            "Netflix",
            100,
            Timestamp::from_ymd(2025, 7, 1).unwrap(),
            None,
        )
        .unwrap();
        let event = SubscriptionCreated::new(&sub);

        let payload: serde_json::Value = serde_json::from_slice(&event.to_payload().unwrap()).unwrap();

        assert_eq!(event.event_type(), "subscription_created");
        assert_eq!(event.aggregate_id(), sub.id().to_string());
        assert_eq!(
            payload,
            serde_json::json!({ "id": sub.id().to_string(), "user_id": sub.user_id().to_string() })
        );
    }

    #[test]
    fn deleted_payload_carries_only_id() {
        let id = SubscriptionId::new();
        let event = SubscriptionDeleted::new(id);

        let payload: serde_json::Value = serde_json::from_slice(&event.to_payload().unwrap()).unwrap();

        assert_eq!(event.event_type(), "subscription_deleted");
        assert_eq!(payload, serde_json::json!({ "id": id.to_string() }));
    }
}
