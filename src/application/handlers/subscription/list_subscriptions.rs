//! ListSubscriptionsHandler - Query handler for filtered, paged listings.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::SubscriptionFilter;
use crate::domain::foundation::{DomainError, Pagination, Sorting};
use crate::domain::subscription::Subscription;
use crate::ports::{SubscriptionRepository, SubscriptionStatsRepository};

#[derive(Debug, Clone, Default)]
pub struct ListSubscriptionsQuery {
    pub filter: SubscriptionFilter,
    pub pagination: Option<Pagination>,
    pub sorting: Option<Sorting>,
}

/// One page of results plus the number of matches across all pages.
#[derive(Debug, Clone)]
pub struct ListSubscriptionsResult {
    pub items: Vec<Subscription>,
    pub total: u64,
}

pub struct ListSubscriptionsHandler {
    repository: Arc<dyn SubscriptionRepository>,
    stats: Arc<dyn SubscriptionStatsRepository>,
}

impl ListSubscriptionsHandler {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        stats: Arc<dyn SubscriptionStatsRepository>,
    ) -> Self {
        Self { repository, stats }
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        query: ListSubscriptionsQuery,
    ) -> Result<ListSubscriptionsResult, DomainError> {
        let filter = query.filter.to_query().map_err(|e| {
            tracing::error!(error = %e, "invalid listing filter");
            DomainError::from(e)
        })?;

        let items = self
            .repository
            .find(cancel, &filter, query.pagination, query.sorting.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "listing subscriptions failed");
                DomainError::from(e)
            })?;

        let total = self
            .stats
            .calculate_total(cancel, &filter)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "counting subscriptions failed");
                DomainError::from(e)
            })?;

        Ok(ListSubscriptionsResult { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::foundation::{ErrorCode, Timestamp, UserId};

    fn month(year: i32, month: u32) -> Timestamp {
        Timestamp::from_ymd(year, month, 1).unwrap()
    }

    async fn seeded() -> Arc<InMemorySubscriptionRepository> {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let cancel = CancellationToken::new();
        for (i, price) in [300, 100, 200].into_iter().enumerate() {
            let sub = Subscription::create(
                None,
                UserId::generate(),
                "service",
                price,
                month(2024, 1 + i as u32),
                None,
            )
            .unwrap();
            repo.create(&cancel, &sub).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn pages_and_counts_all_matches() {
        let repo = seeded().await;
        let handler = ListSubscriptionsHandler::new(repo.clone(), repo);

        let result = handler
            .handle(
                &CancellationToken::new(),
                ListSubscriptionsQuery {
                    pagination: Some(Pagination::new(2, 0)),
                    sorting: Some(Sorting::desc("price")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let prices: Vec<i64> = result.items.iter().map(Subscription::price).collect();
        assert_eq!(prices, vec![300, 200]);
        assert_eq!(result.total, 3);
    }

    #[tokio::test]
    async fn reversed_period_is_invalid_period() {
        let repo = seeded().await;
        let handler = ListSubscriptionsHandler::new(repo.clone(), repo);

        let err = handler
            .handle(
                &CancellationToken::new(),
                ListSubscriptionsQuery {
                    filter: SubscriptionFilter {
                        start_from: Some(month(2024, 3)),
                        start_to: Some(month(2024, 1)),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPeriod);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let repo = seeded().await;
        let handler = ListSubscriptionsHandler::new(repo.clone(), repo);

        let err = handler
            .handle(
                &CancellationToken::new(),
                ListSubscriptionsQuery {
                    sorting: Some(Sorting::asc("user_id")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidSortingField);
    }
}
