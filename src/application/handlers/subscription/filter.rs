//! Optional bounds as received from a caller, turned into a `SubscriptionQuery`.

use crate::domain::foundation::{Timestamp, UserId, ValidationError};
use crate::domain::subscription::{Period, SubscriptionQuery};

/// Flat filter shared by listing and total-cost queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<UserId>,
    pub service_name: Option<String>,
    pub start_from: Option<Timestamp>,
    pub start_to: Option<Timestamp>,
    pub end_from: Option<Timestamp>,
    pub end_to: Option<Timestamp>,
    pub with_nil_end: Option<bool>,
}

/// Builds the start and end periods. A period is only present when at
/// least one of its bounds is.
///
/// # Errors
///
/// Returns `InvalidPeriod` if either range is reversed.
pub fn periods(
    start_from: Option<Timestamp>,
    start_to: Option<Timestamp>,
    end_from: Option<Timestamp>,
    end_to: Option<Timestamp>,
) -> Result<(Option<Period>, Option<Period>), ValidationError> {
    let build = |from: Option<Timestamp>, to: Option<Timestamp>| {
        if from.is_none() && to.is_none() {
            Ok(None)
        } else {
            Period::new(from, to).map(Some)
        }
    };
    Ok((build(start_from, start_to)?, build(end_from, end_to)?))
}

impl SubscriptionFilter {
    pub fn to_query(&self) -> Result<SubscriptionQuery, ValidationError> {
        let (start_period, end_period) =
            periods(self.start_from, self.start_to, self.end_from, self.end_to)?;

        let mut query = SubscriptionQuery::new();
        if let Some(user_id) = self.user_id {
            query = query.with_user_id(user_id);
        }
        if let Some(service_name) = &self.service_name {
            query = query.with_service_name(service_name.clone());
        }
        if let Some(period) = start_period {
            query = query.with_start_period(period);
        }
        if let Some(period) = end_period {
            query = query.with_end_period(period);
        }
        if let Some(include) = self.with_nil_end {
            query = query.with_end_include_null(include);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> Timestamp {
        Timestamp::from_ymd(year, month, 1).unwrap()
    }

    #[test]
    fn no_bounds_means_no_periods() {
        assert_eq!(periods(None, None, None, None), Ok((None, None)));
    }

    #[test]
    fn single_bound_makes_half_open_period() {
        let (start, end) = periods(Some(month(2023, 11)), None, None, Some(month(2024, 2))).unwrap();
        assert_eq!(start, Some(Period::since(month(2023, 11))));
        assert_eq!(end, Some(Period::until(month(2024, 2))));
    }

    #[test]
    fn reversed_end_range_is_rejected() {
        assert_eq!(
            periods(None, None, Some(month(2024, 2)), Some(month(2024, 1))),
            Err(ValidationError::InvalidPeriod)
        );
    }

    #[test]
    fn filter_carries_every_criterion() {
        let user_id = UserId::generate();
        let filter = SubscriptionFilter {
            user_id: Some(user_id),
            service_name: Some("Netflix".into()),
            start_from: Some(month(2023, 1)),
            end_to: Some(month(2024, 1)),
            with_nil_end: Some(true),
            ..Default::default()
        };

        let query = filter.to_query().unwrap();

        assert_eq!(query.user_id(), Some(user_id));
        assert_eq!(query.service_name(), Some("Netflix"));
        assert_eq!(query.start_period(), Some(&Period::since(month(2023, 1))));
        assert_eq!(query.end_period(), Some(&Period::until(month(2024, 1))));
        assert_eq!(query.end_include_null(), Some(true));
    }
}
