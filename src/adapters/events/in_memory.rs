//! In-memory event bus implementation for testing.
//!
//! Records every publish in order and can be told to reject topics, which
//! lets tests exercise the outbox worker's failure paths deterministically.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::{EventPublisher, PublishError};

/// A publish the bus accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct BusState {
    published: Vec<PublishedEvent>,
    failing_topics: HashSet<String>,
    fail_all: bool,
}

/// In-memory event bus for testing.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// bus.fail_topic("subscription_deleted");
///
/// worker.poll_once().await?;
///
/// assert_eq!(bus.event_count(), 1);
/// assert!(bus.has_event("subscription_created"));
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    state: Mutex<BusState>,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Failure injection ===

    /// Reject every publish to `topic` until [`recover`](Self::recover).
    pub fn fail_topic(&self, topic: impl Into<String>) {
        self.state().failing_topics.insert(topic.into());
    }

    /// Reject every publish until [`recover`](Self::recover).
    pub fn fail_all(&self) {
        self.state().fail_all = true;
    }

    /// Accept publishes again.
    pub fn recover(&self) {
        let mut state = self.state();
        state.failing_topics.clear();
        state.fail_all = false;
    }

    // === Test Helpers ===

    /// Returns all accepted publishes in order.
    pub fn published_events(&self) -> Vec<PublishedEvent> {
        self.state().published.clone()
    }

    /// Returns accepted topics in order.
    pub fn topics(&self) -> Vec<String> {
        self.state()
            .published
            .iter()
            .map(|e| e.topic.clone())
            .collect()
    }

    /// Returns payloads published to `topic`.
    pub fn payloads_for(&self, topic: &str) -> Vec<Vec<u8>> {
        self.state()
            .published
            .iter()
            .filter(|e| e.topic == topic)
            .map(|e| e.payload.clone())
            .collect()
    }

    /// Clears all published events (for test isolation).
    pub fn clear(&self) {
        self.state().published.clear();
    }

    /// Returns count of published events.
    pub fn event_count(&self) -> usize {
        self.state().published.len()
    }

    /// Checks if a specific topic was published.
    pub fn has_event(&self, topic: &str) -> bool {
        self.state().published.iter().any(|e| e.topic == topic)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let mut state = self.state();
        if state.fail_all {
            return Err(PublishError::Unavailable("in-memory bus is failing".into()));
        }
        if state.failing_topics.contains(topic) {
            return Err(PublishError::Rejected {
                topic: topic.to_string(),
                reason: "topic is failing".into(),
            });
        }
        state.published.push(PublishedEvent {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_records_topic_and_payload() {
        let bus = InMemoryEventBus::new();

        bus.publish("subscription_created", b"{}").await.unwrap();

        assert_eq!(bus.event_count(), 1);
        assert!(bus.has_event("subscription_created"));
        assert_eq!(bus.payloads_for("subscription_created"), vec![b"{}".to_vec()]);
    }

    #[tokio::test]
    async fn failing_topic_is_rejected_and_not_recorded() {
        let bus = InMemoryEventBus::new();
        bus.fail_topic("subscription_deleted");

        let result = bus.publish("subscription_deleted", b"{}").await;

        assert!(matches!(result, Err(PublishError::Rejected { .. })));
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn fail_all_then_recover() {
        let bus = InMemoryEventBus::new();
        bus.fail_all();
        assert!(bus.publish("a", b"").await.is_err());

        bus.recover();
        assert!(bus.publish("a", b"").await.is_ok());
        assert_eq!(bus.topics(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn clear_resets_published() {
        let bus = InMemoryEventBus::new();
        bus.publish("a", b"").await.unwrap();
        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }
}
