//! Transaction ports.
//!
//! A [`TransactionRunner`] opens a transaction, hands the work a
//! [`UnitOfWork`] bound to it, and commits only if the work returns `Ok`.
//! Any error rolls everything back: no aggregate write and no outbox row
//! from a failed unit survives.
//!
//! # Example
//!
//! ```ignore
//! let record = OutboxRecord::from_event(&SubscriptionCreated::new(&sub))?;
//! runner
//!     .run_in_transaction(
//!         &cancel,
//!         unit_of_work(move |uow| {
//!             Box::pin(async move {
//!                 uow.create(&sub).await?;
//!                 uow.create_event(&record).await
//!             })
//!         }),
//!     )
//!     .await?;
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::{OutboxRecord, RepositoryError};
use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::Subscription;

/// Writes available inside a transaction.
///
/// Statements run once; a failure aborts the whole unit.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn create(&mut self, subscription: &Subscription) -> Result<SubscriptionId, RepositoryError>;

    /// # Errors
    ///
    /// - `NotFound` if nothing was deleted
    async fn delete(&mut self, id: SubscriptionId) -> Result<(), RepositoryError>;

    /// Append an event to the outbox.
    async fn create_event(&mut self, record: &OutboxRecord) -> Result<(), RepositoryError>;
}

/// Work executed against a [`UnitOfWork`].
pub type TransactionWork = Box<
    dyn for<'a> FnOnce(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<(), RepositoryError>> + Send,
>;

/// Boxes a closure as [`TransactionWork`].
pub fn unit_of_work<F>(work: F) -> TransactionWork
where
    F: for<'a> FnOnce(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<(), RepositoryError>>
        + Send
        + 'static,
{
    Box::new(work)
}

#[async_trait]
pub trait TransactionRunner: Send + Sync {
    /// Run `work` atomically.
    ///
    /// Returns the work's error unchanged after rolling back.
    async fn run_in_transaction(
        &self,
        cancel: &CancellationToken,
        work: TransactionWork,
    ) -> Result<(), RepositoryError>;
}
