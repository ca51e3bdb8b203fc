//! EventPublisher port - Interface for publishing outbox events.
//!
//! The outbox worker is the only caller. It does not know about the
//! underlying transport (message broker, log sink, in-memory recorder).

use async_trait::async_trait;
use thiserror::Error;

/// Publish failure. The worker keeps the event and tries again later.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publisher unavailable: {0}")]
    Unavailable(String),

    #[error("publish to {topic} rejected: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Port for publishing events to an external bus.
///
/// Implementations must tolerate the same payload arriving more than once;
/// delivery is at-least-once.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}
