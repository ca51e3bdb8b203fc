//! Publisher that writes events to the log instead of a message bus.
//!
//! Used by the binary until a real broker is wired in.

use async_trait::async_trait;

use crate::ports::{EventPublisher, PublishError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPublisher;

impl LoggingPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        tracing::info!(
            topic,
            payload = %String::from_utf8_lossy(payload),
            "event published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_acknowledges() {
        let publisher = LoggingPublisher::new();
        assert!(publisher.publish("subscription_created", br#"{"id":"x"}"#).await.is_ok());
        assert!(publisher.publish("subscription_deleted", &[0xff, 0xfe]).await.is_ok());
    }
}
