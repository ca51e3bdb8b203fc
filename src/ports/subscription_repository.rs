//! Subscription repository ports.
//!
//! Defines the contract for persisting, listing and aggregating
//! Subscription aggregates.
//!
//! # Design
//!
//! - **Detached copies**: aggregates handed out are copies; changes only
//!   take effect through `update`
//! - **Optimistic locking**: `update` succeeds only against the version the
//!   caller read (backends that cannot check this document it)
//! - **Cancellation**: every call takes a token; a cancelled token aborts
//!   pending retries and yields `RepositoryError::Cancelled`

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::RepositoryError;
use crate::domain::foundation::{Pagination, Sorting, SubscriptionId};
use crate::domain::subscription::{Subscription, SubscriptionQuery};

/// Repository port for Subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription and return its id.
    ///
    /// # Errors
    ///
    /// - `Duplicate` if the id is already taken
    async fn create(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<SubscriptionId, RepositoryError>;

    /// # Errors
    ///
    /// - `NotFound` if no row has this id
    async fn get_by_id(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<Subscription, RepositoryError>;

    /// Persist a mutated subscription.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the row was deleted
    /// - `ConcurrentModification` if the stored version differs from
    ///   `subscription.version()`
    async fn update(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError>;

    /// Hard delete.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing was deleted
    async fn delete(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<(), RepositoryError>;

    /// List subscriptions matching `query`.
    ///
    /// `None` pagination means the default page (first 100 rows).
    ///
    /// # Errors
    ///
    /// - `InvalidSortingField` if `sorting` names a field outside the allow-list
    async fn find(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
        pagination: Option<Pagination>,
        sorting: Option<&Sorting>,
    ) -> Result<Vec<Subscription>, RepositoryError>;
}

/// Aggregations over the same filter model as [`SubscriptionRepository::find`].
#[async_trait]
pub trait SubscriptionStatsRepository: Send + Sync {
    /// Number of subscriptions matching `query`.
    async fn calculate_total(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<u64, RepositoryError>;

    /// Sum of `price` over subscriptions matching `query`.
    async fn calculate_total_cost(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<i64, RepositoryError>;
}
