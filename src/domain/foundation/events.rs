//! Domain event contract.
//!
//! - `DomainEvent` - Trait that all domain events implement
//! - `SerializableDomainEvent` - Payload encoding for any serializable event
//! - `domain_event!` - Macro to simplify DomainEvent implementations

use serde::Serialize;

use super::{EventId, Timestamp};

/// Trait that all domain events must implement.
///
/// The event type doubles as the publish topic once the event leaves the
/// outbox, so it must stay stable across releases.
pub trait DomainEvent: Send + Sync {
    /// Returns the event type string (e.g., "subscription_created").
    fn event_type(&self) -> &'static str;

    /// Returns the ID of the aggregate that emitted this event.
    fn aggregate_id(&self) -> String;

    /// Returns when the event occurred.
    fn occurred_at(&self) -> Timestamp;

    /// Returns the unique ID for this event instance.
    fn event_id(&self) -> EventId;
}

/// Extension trait that encodes serializable domain events as JSON bytes.
///
/// Automatically implemented for any type that implements both
/// `DomainEvent` and `Serialize`.
pub trait SerializableDomainEvent: DomainEvent + Serialize {
    /// Serializes the event body into the bytes stored in the outbox.
    fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<T: DomainEvent + Serialize> SerializableDomainEvent for T {}

/// Macro to implement DomainEvent trait with minimal boilerplate.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize)]
/// pub struct SubscriptionDeleted {
///     #[serde(skip)]
///     pub event_id: EventId,
///     pub id: SubscriptionId,
///     #[serde(skip)]
///     pub occurred_at: Timestamp,
/// }
///
/// domain_event!(
///     SubscriptionDeleted,
///     event_type = "subscription_deleted",
///     aggregate_id = id,
///     occurred_at = occurred_at,
///     event_id = event_id
/// );
/// ```
#[macro_export]
macro_rules! domain_event {
    (
        $event_name:ident,
        event_type = $event_type:expr,
        aggregate_id = $agg_id_field:ident,
        occurred_at = $occurred_field:ident,
        event_id = $event_id_field:ident
    ) => {
        impl $crate::domain::foundation::DomainEvent for $event_name {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn aggregate_id(&self) -> String {
                self.$agg_id_field.to_string()
            }

            fn occurred_at(&self) -> $crate::domain::foundation::Timestamp {
                self.$occurred_field
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.$event_id_field
            }
        }
    };
}

pub use domain_event;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct ThingHappened {
        #[serde(skip)]
        event_id: EventId,
        thing: u32,
        #[serde(skip)]
        at: Timestamp,
    }

    domain_event!(
        ThingHappened,
        event_type = "thing_happened",
        aggregate_id = thing,
        occurred_at = at,
        event_id = event_id
    );

    #[test]
    fn macro_implements_domain_event() {
        let event = ThingHappened {
            event_id: EventId::new(),
            thing: 7,
            at: Timestamp::now(),
        };

        assert_eq!(event.event_type(), "thing_happened");
        assert_eq!(event.aggregate_id(), "7");
        assert_eq!(event.event_id(), event.event_id);
    }

    #[test]
    fn payload_contains_only_serialized_fields() {
        let event = ThingHappened {
            event_id: EventId::new(),
            thing: 7,
            at: Timestamp::now(),
        };

        let payload = event.to_payload().unwrap();
        assert_eq!(payload, br#"{"thing":7}"#.to_vec());
    }
}
