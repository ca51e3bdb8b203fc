//! Observer that forwards persistence hooks as structured `tracing` events.

use std::time::Duration;

use crate::domain::foundation::EventId;
use crate::ports::PersistenceObserver;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl PersistenceObserver for TracingObserver {
    fn retry_scheduled(&self, operation: &str, attempt: u32, delay: Duration, error: &str) {
        tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error,
            "transient storage failure, retrying"
        );
    }

    fn retries_exhausted(&self, operation: &str, attempts: u32, error: &str) {
        tracing::error!(operation, attempts, error, "giving up after retries");
    }

    fn event_published(&self, id: EventId, event_type: &str) {
        tracing::debug!(event_id = %id, event_type, "outbox event published");
    }

    fn event_publish_failed(&self, id: EventId, event_type: &str, error: &str) {
        tracing::error!(event_id = %id, event_type, error, "failed to publish outbox event");
    }

    fn event_removal_failed(&self, id: EventId, error: &str) {
        tracing::warn!(
            event_id = %id,
            error,
            "published event could not be removed from outbox; it will be delivered again"
        );
    }

    fn batch_failed(&self, error: &str) {
        tracing::error!(error, "failed to fetch outbox batch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_do_not_panic_without_subscriber() {
        let observer = TracingObserver::new();
        observer.retry_scheduled("update", 1, Duration::from_secs(2), "connection reset");
        observer.retries_exhausted("update", 3, "connection reset");
        observer.event_published(EventId::new(), "subscription_created");
        observer.event_publish_failed(EventId::new(), "subscription_created", "broker down");
        observer.event_removal_failed(EventId::new(), "connection lost");
        observer.batch_failed("pool timed out");
    }
}
