//! In-memory implementation of the subscription repository ports.
//!
//! Backs unit tests and non-durable deployments. Updates are
//! last-write-wins: the stored version is advanced but never compared, and
//! there is no outbox.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{
    Pagination, SortDirection, Sorting, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{SortField, Subscription, SubscriptionQuery};
use crate::ports::{RepositoryError, SubscriptionRepository, SubscriptionStatsRepository};

/// Subscriptions held in a process-local map behind one reader/writer lock.
///
/// The lock is held only while the map is read or changed.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions.
    pub async fn len(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscriptions.read().await.is_empty()
    }

    async fn matching(&self, query: &SubscriptionQuery) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .await
            .values()
            .filter(|sub| query.matches(sub))
            .cloned()
            .collect()
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), RepositoryError> {
    if cancel.is_cancelled() {
        return Err(RepositoryError::Cancelled);
    }
    Ok(())
}

fn creation_order(a: &Subscription, b: &Subscription) -> Ordering {
    a.created_at()
        .cmp(&b.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<SubscriptionId, RepositoryError> {
        ensure_active(cancel)?;
        let id = subscription.id();
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.contains_key(&id) {
            return Err(RepositoryError::Duplicate(id));
        }
        subscriptions.insert(id, subscription.clone());
        Ok(id)
    }

    async fn get_by_id(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<Subscription, RepositoryError> {
        ensure_active(cancel)?;
        self.subscriptions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError> {
        ensure_active(cancel)?;
        let id = subscription.id();
        let mut subscriptions = self.subscriptions.write().await;
        let stored = subscriptions
            .get(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        let updated = Subscription::reconstitute(
            id,
            subscription.user_id(),
            subscription.service_name(),
            subscription.price(),
            subscription.start_date(),
            subscription.end_date(),
            stored.created_at(),
            Timestamp::now(),
            stored.version() + 1,
        )?;
        subscriptions.insert(id, updated);
        Ok(())
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<(), RepositoryError> {
        ensure_active(cancel)?;
        self.subscriptions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn find(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
        pagination: Option<Pagination>,
        sorting: Option<&Sorting>,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        ensure_active(cancel)?;
        let sort = match sorting {
            Some(s) => Some((
                SortField::parse(&s.field)
                    .ok_or_else(|| RepositoryError::InvalidSortingField(s.field.clone()))?,
                s.direction,
            )),
            None => None,
        };
        let pagination = pagination.unwrap_or_default();

        let mut found = self.matching(query).await;
        match sort {
            Some((field, direction)) => found.sort_by(|a, b| {
                let ord = field.compare(a, b);
                let ord = match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                ord.then_with(|| a.id().cmp(&b.id()))
            }),
            None => found.sort_by(creation_order),
        }

        Ok(found
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect())
    }
}

#[async_trait]
impl SubscriptionStatsRepository for InMemorySubscriptionRepository {
    async fn calculate_total(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<u64, RepositoryError> {
        ensure_active(cancel)?;
        Ok(self.matching(query).await.len() as u64)
    }

    async fn calculate_total_cost(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<i64, RepositoryError> {
        ensure_active(cancel)?;
        self.matching(query)
            .await
            .iter()
            .try_fold(0i64, |total, sub| total.checked_add(sub.price()))
            .ok_or_else(|| RepositoryError::database("total cost is out of range for bigint"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn month(year: i32, month: u32) -> Timestamp {
        Timestamp::from_ymd(year, month, 1).unwrap()
    }

    fn sub(price: i64) -> Subscription {
        Subscription::create(None, UserId::generate(), "Netflix", price, month(2024, 1), None).unwrap()
    }

    #[tokio::test]
    async fn update_advances_version_without_checking_it() {
        let repo = InMemorySubscriptionRepository::new();
        let cancel = CancellationToken::new();
        let original = sub(100);
        repo.create(&cancel, &original).await.unwrap();

        let mut first = original.clone();
        first.change_price(200).unwrap();
        repo.update(&cancel, &first).await.unwrap();

        // Same stale version again: last write wins.
        let mut second = original.clone();
        second.change_price(300).unwrap();
        repo.update(&cancel, &second).await.unwrap();

        let stored = repo.get_by_id(&cancel, original.id()).await.unwrap();
        assert_eq!(stored.price(), 300);
        assert_eq!(stored.version(), 3);
        assert_eq!(stored.created_at(), original.created_at());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let repo = InMemorySubscriptionRepository::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = repo.create(&cancel, &sub(100)).await;
        assert!(matches!(result, Err(RepositoryError::Cancelled)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn total_cost_sums_matching_prices() {
        let repo = InMemorySubscriptionRepository::new();
        let cancel = CancellationToken::new();
        for price in [100, 250, 50] {
            repo.create(&cancel, &sub(price)).await.unwrap();
        }

        let query = SubscriptionQuery::new();
        assert_eq!(repo.calculate_total(&cancel, &query).await.unwrap(), 3);
        assert_eq!(repo.calculate_total_cost(&cancel, &query).await.unwrap(), 400);
    }

    #[tokio::test]
    async fn total_cost_overflow_is_database_error() {
        let repo = InMemorySubscriptionRepository::new();
        let cancel = CancellationToken::new();
        repo.create(&cancel, &sub(i64::MAX)).await.unwrap();
        repo.create(&cancel, &sub(1)).await.unwrap();

        let result = repo.calculate_total_cost(&cancel, &SubscriptionQuery::new()).await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }
}
