//! PersistenceObserver port - structured sink for persistence and
//! delivery events.
//!
//! Repositories and the outbox worker receive an observer at construction
//! instead of logging through a global.

use std::time::Duration;

use crate::domain::foundation::EventId;

/// Hooks fired by the persistence core. All default to no-ops.
pub trait PersistenceObserver: Send + Sync {
    /// A transient failure will be retried after `delay`.
    fn retry_scheduled(&self, _operation: &str, _attempt: u32, _delay: Duration, _error: &str) {}

    /// The retry budget ran out.
    fn retries_exhausted(&self, _operation: &str, _attempts: u32, _error: &str) {}

    fn event_published(&self, _id: EventId, _event_type: &str) {}

    fn event_publish_failed(&self, _id: EventId, _event_type: &str, _error: &str) {}

    /// Published, but the outbox row could not be removed; it will be
    /// delivered again.
    fn event_removal_failed(&self, _id: EventId, _error: &str) {}

    /// Fetching a batch failed; the worker waits for the next tick.
    fn batch_failed(&self, _error: &str) {}
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PersistenceObserver for NoopObserver {}
