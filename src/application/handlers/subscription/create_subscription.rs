//! CreateSubscriptionHandler - Command handler for new subscriptions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionCreated};
use crate::ports::{unit_of_work, OutboxRecord, SubscriptionRepository, TransactionRunner};

/// Command to create a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub user_id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub start_date: Timestamp,
    pub end_date: Option<Timestamp>,
}

/// Handler for creating subscriptions.
///
/// With an outbox-capable runner the row and its `subscription_created`
/// event are written in one transaction. Without one, the subscription is
/// created through the plain repository and no event is recorded.
pub struct CreateSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    outbox: Option<Arc<dyn TransactionRunner>>,
}

impl CreateSubscriptionHandler {
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
        cmd: CreateSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let subscription = UserId::new(cmd.user_id)
            .and_then(|user_id| {
                Subscription::create(
                    None,
                    user_id,
                    cmd.service_name,
                    cmd.price,
                    cmd.start_date,
                    cmd.end_date,
                )
            })
            .map_err(|e| {
                tracing::error!(error = %e, "subscription validation failed");
                DomainError::from(e)
            })?;

        let result = match &self.outbox {
            Some(runner) => {
                let record = OutboxRecord::from_event(&SubscriptionCreated::new(&subscription))?;
                let staged = subscription.clone();
                runner
                    .run_in_transaction(
                        cancel,
                        unit_of_work(move |uow| {
                            Box::pin(async move {
                                uow.create(&staged).await?;
                                uow.create_event(&record).await
                            })
                        }),
                    )
                    .await
            }
            None => self.repository.create(cancel, &subscription).await.map(|_| ()),
        };

        if let Err(e) = result {
            tracing::error!(entity_id = %subscription.id(), error = %e, "creating subscription failed");
            return Err(e.into());
        }

        tracing::info!(entity_id = %subscription.id(), "subscription created");
        Ok(subscription)
    }
}
