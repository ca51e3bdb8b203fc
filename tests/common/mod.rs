//! Shared fixtures for repository integration tests.
//!
//! Every fixture seeds rows under a fresh user so queries can be scoped to
//! that user and suites can share one database.

#![allow(dead_code)]

use tokio_util::sync::CancellationToken;

use subs::domain::foundation::{Timestamp, UserId};
use subs::domain::subscription::{Period, Subscription, SubscriptionQuery};
use subs::ports::{SubscriptionRepository, SubscriptionStatsRepository};

pub fn month(year: i32, month: u32) -> Timestamp {
    Timestamp::from_ymd(year, month, 1).unwrap()
}

pub fn subscription(user: UserId, start: Timestamp, end: Option<Timestamp>) -> Subscription {
    Subscription::create(None, user, "service", 100, start, end).unwrap()
}

pub async fn seed<R>(repo: &R, user: UserId, rows: &[(Timestamp, Option<Timestamp>)])
where
    R: SubscriptionRepository + ?Sized,
{
    let cancel = CancellationToken::new();
    for (start, end) in rows {
        repo.create(&cancel, &subscription(user, *start, *end))
            .await
            .unwrap();
    }
}

/// Six open-ended rows and six closed rows around late 2023.
pub fn matrix_rows() -> Vec<(Timestamp, Option<Timestamp>)> {
    vec![
        (month(2024, 1), None),
        (month(2023, 12), None),
        (month(2023, 11), None),
        (month(2023, 10), None),
        (month(2023, 9), None),
        (month(2023, 8), None),
        (month(2023, 11), Some(month(2023, 12))),
        (month(2023, 10), Some(month(2023, 11))),
        (month(2023, 9), Some(month(2023, 10))),
        (month(2023, 12), Some(month(2024, 1))),
        (month(2023, 10), Some(month(2023, 12))),
        (month(2024, 2), Some(month(2024, 3))),
    ]
}

/// One filter combination and the number of matrix rows it selects.
pub struct MatrixCase {
    pub name: &'static str,
    pub start: Option<Period>,
    pub end: Option<Period>,
    pub include_null: Option<bool>,
    pub expected: u64,
}

pub fn matrix_cases() -> Vec<MatrixCase> {
    let start_from = month(2023, 11);
    let start_to = month(2023, 12);
    let end_from = month(2023, 12);
    let end_to = month(2024, 2);

    let start_since = Some(Period::since(start_from));
    let start_until = Some(Period::until(start_to));
    let start_both = Some(Period::new(Some(start_from), Some(start_to)).unwrap());
    let end_since = Some(Period::since(end_from));
    let end_until = Some(Period::until(end_to));
    let end_both = Some(Period::new(Some(end_from), Some(end_to)).unwrap());

    let case = |name, start, end, include_null, expected| MatrixCase {
        name,
        start,
        end,
        include_null,
        expected,
    };

    vec![
        case("start from", start_since, None, None, 6),
        case("start from, no nulls", start_since, None, Some(false), 3),
        case("start to", start_until, None, None, 10),
        case("start to, no nulls", start_until, None, Some(false), 5),
        case("start range", start_both, None, None, 4),
        case("end to", None, end_until, None, 5),
        case("end to, with nulls", None, end_until, Some(true), 11),
        case("end to, no nulls", None, end_until, Some(false), 5),
        case("end from", None, end_since, None, 10),
        case("end from, with nulls", None, end_since, Some(true), 10),
        case("end from, no nulls", None, end_since, Some(false), 4),
        case("start range, end from", start_both, end_since, None, 4),
        case("start range, end to", start_both, end_until, None, 2),
        case("start from, end range", start_since, end_both, None, 2),
        case("start to, end range", start_until, end_both, None, 3),
        case("start range, end range", start_both, end_both, None, 2),
        case("end range, no nulls", None, end_both, Some(false), 3),
        case("end range, with nulls", None, end_both, Some(true), 9),
    ]
}

pub fn case_query(user: UserId, case: &MatrixCase) -> SubscriptionQuery {
    let mut query = SubscriptionQuery::new().with_user_id(user);
    if let Some(period) = case.start {
        query = query.with_start_period(period);
    }
    if let Some(period) = case.end {
        query = query.with_end_period(period);
    }
    if let Some(include) = case.include_null {
        query = query.with_end_include_null(include);
    }
    query
}

/// Seeds the matrix rows and checks every case through `find` and
/// `calculate_total`.
pub async fn assert_matrix<R>(repo: &R)
where
    R: SubscriptionRepository + SubscriptionStatsRepository + ?Sized,
{
    let cancel = CancellationToken::new();
    let user = UserId::generate();
    seed(repo, user, &matrix_rows()).await;

    for case in matrix_cases() {
        let query = case_query(user, &case);
        let found = repo.find(&cancel, &query, None, None).await.unwrap();
        let total = repo.calculate_total(&cancel, &query).await.unwrap();

        assert_eq!(found.len() as u64, case.expected, "find: {}", case.name);
        assert_eq!(total, case.expected, "calculate_total: {}", case.name);
        assert!(
            found.iter().all(|sub| query.matches(sub)),
            "rows outside the filter: {}",
            case.name
        );
    }
}

/// Rows sitting exactly on period bounds.
pub async fn assert_boundaries<R>(repo: &R)
where
    R: SubscriptionRepository + SubscriptionStatsRepository + ?Sized,
{
    let cancel = CancellationToken::new();
    let user = UserId::generate();
    seed(
        repo,
        user,
        &[
            (month(2023, 11), None),
            (month(2023, 12), Some(month(2024, 1))),
            (month(2024, 1), None),
        ],
    )
    .await;

    let base = SubscriptionQuery::new().with_user_id(user);
    let cases = [
        (base.clone().with_start_period(Period::since(month(2023, 11))), 3),
        (base.clone().with_start_period(Period::until(month(2023, 12))), 2),
        (
            base.clone()
                .with_end_period(Period::since(month(2023, 12)))
                .with_end_include_null(true),
            3,
        ),
        (base.clone().with_end_period(Period::until(month(2023, 12))), 0),
        (base.clone().with_end_period(Period::until(month(2024, 1))), 1),
        (
            base.clone()
                .with_start_period(Period::new(Some(month(2023, 11)), Some(month(2023, 12))).unwrap())
                .with_end_period(Period::new(Some(month(2023, 12)), Some(month(2023, 12))).unwrap())
                .with_end_include_null(true),
            1,
        ),
    ];

    for (i, (query, expected)) in cases.iter().enumerate() {
        let total = repo.calculate_total(&cancel, query).await.unwrap();
        assert_eq!(total, *expected, "boundary case {i}");
    }
}

/// Rows created and queried with dates in the middle of a month.
pub async fn assert_mid_month_bounds<R>(repo: &R)
where
    R: SubscriptionRepository + SubscriptionStatsRepository + ?Sized,
{
    let cancel = CancellationToken::new();
    let user = UserId::generate();
    let day = |year, month, day| Timestamp::from_ymd(year, month, day).unwrap();
    seed(
        repo,
        user,
        &[
            (day(2023, 11, 20), None),
            (day(2023, 12, 5), Some(day(2024, 1, 28))),
        ],
    )
    .await;

    let base = SubscriptionQuery::new().with_user_id(user);
    let cases = [
        (base.clone().with_start_period(Period::since(day(2023, 11, 20))), 2),
        (base.clone().with_start_period(Period::until(day(2023, 11, 20))), 1),
        (base.clone().with_end_period(Period::until(day(2024, 1, 15))), 1),
        (base.clone().with_end_period(Period::since(day(2024, 1, 31))), 2),
        (
            base.clone()
                .with_start_period(Period::new(Some(day(2023, 12, 31)), Some(day(2023, 12, 1))).unwrap()),
            1,
        ),
    ];

    for (i, (query, expected)) in cases.iter().enumerate() {
        let found = repo.find(&cancel, query, None, None).await.unwrap();
        let total = repo.calculate_total(&cancel, query).await.unwrap();
        assert_eq!(found.len() as u64, *expected, "mid-month find {i}");
        assert_eq!(total, *expected, "mid-month total {i}");
    }

    let cost = repo
        .calculate_total_cost(&cancel, &cases[0].0)
        .await
        .unwrap();
    assert_eq!(cost, 200);
}
