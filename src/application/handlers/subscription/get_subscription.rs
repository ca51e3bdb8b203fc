//! GetSubscriptionHandler - Query handler for a single subscription.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub id: SubscriptionId,
}

pub struct GetSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        query: GetSubscriptionQuery,
    ) -> Result<Subscription, DomainError> {
        self.repository
            .get_by_id(cancel, query.id)
            .await
            .map_err(|e| {
                tracing::error!(entity_id = %query.id, error = %e, "loading subscription failed");
                DomainError::from(e)
            })
    }
}
