//! Subscription handlers.
//!
//! ## Commands
//! - Creating subscriptions (with a `subscription_created` outbox event when available)
//! - Partially updating price and dates
//! - Deleting subscriptions (with a `subscription_deleted` outbox event when available)
//!
//! ## Queries
//! - Get one subscription
//! - List with filters, paging and sorting
//! - Total cost over a filter

mod create_subscription;
mod delete_subscription;
mod filter;
mod get_subscription;
mod list_subscriptions;
mod total_cost;
mod update_subscription;

// Commands
pub use create_subscription::{CreateSubscriptionCommand, CreateSubscriptionHandler};
pub use delete_subscription::{DeleteSubscriptionCommand, DeleteSubscriptionHandler};
pub use update_subscription::{UpdateSubscriptionCommand, UpdateSubscriptionHandler};

// Queries
pub use filter::{periods, SubscriptionFilter};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use list_subscriptions::{ListSubscriptionsHandler, ListSubscriptionsQuery, ListSubscriptionsResult};
pub use total_cost::{TotalCostHandler, TotalCostQuery};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use crate::domain::foundation::SubscriptionId;
    use crate::domain::subscription::Subscription;
    use crate::ports::{OutboxRecord, RepositoryError, TransactionRunner, TransactionWork, UnitOfWork};

    #[derive(Default)]
    struct Staged {
        created: Vec<SubscriptionId>,
        deleted: Vec<SubscriptionId>,
        events: Vec<OutboxRecord>,
        fail_events: bool,
    }

    #[async_trait]
    impl UnitOfWork for Staged {
        async fn create(&mut self, subscription: &Subscription) -> Result<SubscriptionId, RepositoryError> {
            self.created.push(subscription.id());
            Ok(subscription.id())
        }

        async fn delete(&mut self, id: SubscriptionId) -> Result<(), RepositoryError> {
            self.deleted.push(id);
            Ok(())
        }

        async fn create_event(&mut self, record: &OutboxRecord) -> Result<(), RepositoryError> {
            if self.fail_events {
                return Err(RepositoryError::database("events table unavailable"));
            }
            self.events.push(record.clone());
            Ok(())
        }
    }

    /// Runner that stages writes and keeps them only if the work succeeds.
    #[derive(Default)]
    pub(crate) struct StagingRunner {
        committed: Mutex<Staged>,
        fail_events: bool,
    }

    impl StagingRunner {
        pub(crate) fn failing_events() -> Self {
            Self {
                fail_events: true,
                ..Default::default()
            }
        }

        pub(crate) fn created(&self) -> Vec<SubscriptionId> {
            self.committed.lock().unwrap().created.clone()
        }

        pub(crate) fn deleted(&self) -> Vec<SubscriptionId> {
            self.committed.lock().unwrap().deleted.clone()
        }

        pub(crate) fn events(&self) -> Vec<OutboxRecord> {
            self.committed.lock().unwrap().events.clone()
        }
    }

    #[async_trait]
    impl TransactionRunner for StagingRunner {
        async fn run_in_transaction(
            &self,
            _cancel: &CancellationToken,
            work: TransactionWork,
        ) -> Result<(), RepositoryError> {
            let mut staged = Staged {
                fail_events: self.fail_events,
                ..Default::default()
            };
            let uow: &mut dyn UnitOfWork = &mut staged;
            work(uow).await?;

            let mut committed = self.committed.lock().unwrap();
            committed.created.extend(staged.created);
            committed.deleted.extend(staged.deleted);
            committed.events.extend(staged.events);
            Ok(())
        }
    }
}
