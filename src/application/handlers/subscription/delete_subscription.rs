//! DeleteSubscriptionHandler - Command handler for removing subscriptions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::SubscriptionDeleted;
use crate::ports::{unit_of_work, OutboxRecord, SubscriptionRepository, TransactionRunner};

/// Command to delete a subscription.
#[derive(Debug, Clone)]
pub struct DeleteSubscriptionCommand {
    pub id: SubscriptionId,
}

/// Handler for deleting subscriptions.
///
/// With an outbox-capable runner a `subscription_deleted` event is written
/// in the same transaction as the delete.
pub struct DeleteSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    outbox: Option<Arc<dyn TransactionRunner>>,
}

impl DeleteSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            repository,
            outbox: None,
        }
    }

    pub fn with_outbox(mut self, runner: Arc<dyn TransactionRunner>) -> Self {
        self.outbox = Some(runner);
        self
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        cmd: DeleteSubscriptionCommand,
    ) -> Result<(), DomainError> {
        let id = cmd.id;
        let result = match &self.outbox {
            Some(runner) => {
                let record = OutboxRecord::from_event(&SubscriptionDeleted::new(id))?;
                runner
                    .run_in_transaction(
                        cancel,
                        unit_of_work(move |uow| {
                            Box::pin(async move {
                                uow.delete(id).await?;
                                uow.create_event(&record).await
                            })
                        }),
                    )
                    .await
            }
            None => self.repository.delete(cancel, id).await,
        };

        result.map_err(|e| {
            tracing::error!(entity_id = %id, error = %e, "deleting subscription failed");
            DomainError::from(e)
        })?;

        tracing::info!(entity_id = %id, "subscription deleted");
        Ok(())
    }
}
