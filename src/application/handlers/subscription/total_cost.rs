//! TotalCostHandler - Sum of prices over matching subscriptions.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::SubscriptionFilter;
use crate::domain::foundation::DomainError;
use crate::ports::SubscriptionStatsRepository;

#[derive(Debug, Clone, Default)]
pub struct TotalCostQuery {
    pub filter: SubscriptionFilter,
}

pub struct TotalCostHandler {
    stats: Arc<dyn SubscriptionStatsRepository>,
}

impl TotalCostHandler {
    pub fn new(stats: Arc<dyn SubscriptionStatsRepository>) -> Self {
        Self { stats }
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        query: TotalCostQuery,
    ) -> Result<i64, DomainError> {
        let filter = query.filter.to_query()?;
        self.stats
            .calculate_total_cost(cancel, &filter)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "calculating total cost failed");
                DomainError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::subscription::Subscription;
    use crate::ports::SubscriptionRepository;

    #[tokio::test]
    async fn sums_prices_for_one_user() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let cancel = CancellationToken::new();
        let user = UserId::generate();
        let start = Timestamp::from_ymd(2024, 1, 1).unwrap();

        for (owner, price) in [(user, 400), (user, 250), (UserId::generate(), 999)] {
            let sub = Subscription::create(None, owner, "Netflix", price, start, None).unwrap();
            repo.create(&cancel, &sub).await.unwrap();
        }

        let total = TotalCostHandler::new(repo)
            .handle(
                &cancel,
                TotalCostQuery {
                    filter: SubscriptionFilter {
                        user_id: Some(user),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(total, 650);
    }
}
