//! Outbox worker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::events::OutboxWorkerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Run the delivery worker in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum events fetched per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl OutboxConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.batch_size == 0 || self.batch_size > 10_000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        Ok(())
    }

    pub fn worker_config(&self) -> OutboxWorkerConfig {
        OutboxWorkerConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_batch_size(self.batch_size)
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_batch_size() -> u32 {
    100
}
