//! OutboxWorker - Background service for reliable event delivery.
//!
//! Second half of the transactional outbox:
//! 1. Writes store the aggregate and an outbox row in one transaction
//! 2. **OutboxWorker polls the outbox and publishes each row** ← This module
//!
//! ## Delivery Semantics
//!
//! At-least-once. A row is removed only after the publisher acknowledged
//! it. A failed publish leaves the row for a later tick and does not stop
//! the rest of the batch. If the removal after a successful publish fails,
//! the row is delivered again on a later tick.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | How often to check for pending events |
//! | `batch_size` | 100 | Max events to publish per poll cycle |
//!
//! ## Shutdown
//!
//! The loop stops as soon as its cancellation token fires, including in
//! the middle of a batch. Rows not yet removed stay pending.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ports::{EventPublisher, NoopObserver, OutboxStore, PersistenceObserver, RepositoryError};

/// Configuration for the OutboxWorker service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxWorkerConfig {
    /// How often to poll for pending events.
    pub poll_interval: Duration,

    /// Maximum events to process per poll cycle.
    pub batch_size: u32,
}

impl Default for OutboxWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 100,
        }
    }
}

impl OutboxWorkerConfig {
    /// Create config with custom poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create config with custom batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }
}

/// Background service that drains the outbox into an [`EventPublisher`].
pub struct OutboxWorker {
    outbox: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    observer: Arc<dyn PersistenceObserver>,
    config: OutboxWorkerConfig,
}

impl OutboxWorker {
    /// Create a new OutboxWorker with default configuration.
    pub fn new(outbox: Arc<dyn OutboxStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_config(outbox, publisher, OutboxWorkerConfig::default())
    }

    /// Create a new OutboxWorker with custom configuration.
    pub fn with_config(
        outbox: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        config: OutboxWorkerConfig,
    ) -> Self {
        Self {
            outbox,
            publisher,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PersistenceObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &OutboxWorkerConfig {
        &self.config
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// A failed fetch is reported to the observer and retried on the next
    /// tick; it never ends the loop.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = interval.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        result = self.process_batch() => {
                            if let Err(err) = result {
                                self.observer.batch_failed(&err.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Process a single batch of pending events, oldest first.
    ///
    /// Returns how many events were published. Only a failure to fetch the
    /// batch is an error; per-event failures go to the observer.
    pub async fn process_batch(&self) -> Result<usize, RepositoryError> {
        let records = self.outbox.fetch_pending(self.config.batch_size).await?;
        let mut published_count = 0;

        for record in records {
            if let Err(err) = self.publisher.publish(&record.event_type, &record.payload).await {
                self.observer
                    .event_publish_failed(record.id, &record.event_type, &err.to_string());
                continue;
            }

            published_count += 1;
            self.observer.event_published(record.id, &record.event_type);

            if let Err(err) = self.outbox.remove(record.id).await {
                self.observer.event_removal_failed(record.id, &err.to_string());
            }
        }

        Ok(published_count)
    }

    /// Run exactly one poll cycle (for testing).
    pub async fn poll_once(&self) -> Result<usize, RepositoryError> {
        self.process_batch().await
    }
}
