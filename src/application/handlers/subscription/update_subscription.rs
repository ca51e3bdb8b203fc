//! UpdateSubscriptionHandler - Command handler for partial subscription changes.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

/// Command to change some fields of a subscription.
///
/// `end_date` wins over `clear_end_date` when both are set.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscriptionCommand {
    pub id: SubscriptionId,
    pub price: Option<i64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub clear_end_date: bool,
}

/// Handler for updating subscriptions.
///
/// Reads the current state, applies the changes through the aggregate and
/// writes back under the version that was read. A concurrent writer makes
/// this fail with `CONCURRENT_MODIFICATION`; the caller decides whether to
/// retry.
pub struct UpdateSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl UpdateSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// Business rule: a price change cannot come with an earlier start.
    fn validate(subscription: &Subscription, cmd: &UpdateSubscriptionCommand) -> Result<(), DomainError> {
        if let (Some(_), Some(start)) = (cmd.price, cmd.start_date) {
            if start < subscription.start_date() {
                return Err(DomainError::invalid_command(
                    "start_date",
                    "start date cannot move earlier while the price changes",
                ));
            }
        }
        Ok(())
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        cmd: UpdateSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .repository
            .get_by_id(cancel, cmd.id)
            .await
            .map_err(|e| {
                tracing::error!(entity_id = %cmd.id, error = %e, "loading subscription failed");
                DomainError::from(e)
            })?;

        Self::validate(&subscription, &cmd)?;

        if let Some(price) = cmd.price {
            let old_price = subscription.price();
            subscription.change_price(price)?;
            tracing::info!(
                entity_id = %cmd.id,
                field_name = "price",
                old_value = old_price,
                new_value = price,
                "price changed"
            );
        }

        if cmd.clear_end_date && cmd.end_date.is_none() {
            subscription.clear_end_date();
            tracing::info!(entity_id = %cmd.id, "end date cleared");
        }

        match (cmd.start_date, cmd.end_date) {
            (Some(start), Some(end)) => {
                // Moving both bounds past the current end needs the end first.
                if subscription.change_start_date(start).is_err() {
                    subscription.change_end_date(end)?;
                    subscription.change_start_date(start)?;
                } else {
                    subscription.change_end_date(end)?;
                }
                tracing::info!(entity_id = %cmd.id, "start and end dates changed");
            }
            (Some(start), None) => {
                subscription.change_start_date(start)?;
                tracing::info!(entity_id = %cmd.id, "start date changed");
            }
            (None, Some(end)) => {
                subscription.change_end_date(end)?;
                tracing::info!(entity_id = %cmd.id, "end date changed");
            }
            (None, None) => {}
        }

        self.repository
            .update(cancel, &subscription)
            .await
            .map_err(|e| {
                tracing::error!(entity_id = %cmd.id, error = %e, "updating subscription failed");
                DomainError::from(e)
            })?;

        Ok(subscription)
    }
}
