//! PostgreSQL implementation of the subscription ports.
//!
//! One adapter covers CRUD, filtered listing, totals, transactions and the
//! outbox table. Every statement run outside a transaction goes through
//! [`with_retry`]; statements inside a transaction run once.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::errors::{classify, is_unique_violation};
use super::retry::{with_retry, RetryPolicy};
use crate::domain::foundation::{
    EventId, Pagination, SortDirection, Sorting, SubscriptionId, Timestamp, UserId,
    ValidationError,
};
use crate::domain::subscription::{SortField, Subscription, SubscriptionQuery};
use crate::ports::{
    NoopObserver, OutboxRecord, OutboxStore, PersistenceObserver, RepositoryError,
    SubscriptionRepository, SubscriptionStatsRepository, TransactionRunner, TransactionWork,
    UnitOfWork,
};

const SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        service_name TEXT NOT NULL,
        price BIGINT NOT NULL CHECK (price > 0),
        start_date TIMESTAMPTZ NOT NULL,
        end_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_id ON subscriptions (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_service_name ON subscriptions (service_name)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_start_date ON subscriptions (start_date)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_end_date ON subscriptions (end_date)",
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY,
        type TEXT NOT NULL,
        payload BYTEA NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_created_at ON events (created_at)",
];

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, user_id, service_name, price, start_date, end_date, created_at, updated_at, version
    FROM subscriptions
"#;

const SELECT_SUBSCRIPTION_BY_ID: &str = r#"
    SELECT id, user_id, service_name, price, start_date, end_date, created_at, updated_at, version
    FROM subscriptions
    WHERE id = $1
"#;

/// PostgreSQL adapter for subscriptions and their outbox.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
    retry: RetryPolicy,
    observer: Arc<dyn PersistenceObserver>,
}

impl PostgresSubscriptionRepository {
    /// Creates a repository with the default retry policy and no observer.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PersistenceObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the subscriptions and events tables with their indexes.
    ///
    /// Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(classify)?;
        }
        tracing::info!("subscription schema is up to date");
        Ok(())
    }

    fn observer(&self) -> &dyn PersistenceObserver {
        self.observer.as_ref()
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    service_name: String,
    price: i64,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i32,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt =
            |e: ValidationError| RepositoryError::CorruptRow(format!("subscription {}: {}", id, e));
        let user_id = UserId::new(row.user_id).map_err(corrupt)?;

        Subscription::reconstitute(
            SubscriptionId::from_uuid(id),
            user_id,
            row.service_name,
            row.price,
            Timestamp::from_datetime(row.start_date),
            row.end_date.map(Timestamp::from_datetime),
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
            row.version,
        )
        .map_err(corrupt)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    event_type: String,
    payload: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for OutboxRecord {
    fn from(row: EventRow) -> Self {
        OutboxRecord {
            id: EventId::from_uuid(row.id),
            event_type: row.event_type,
            payload: row.payload,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

async fn insert_subscription<'e, E>(
    executor: E,
    subscription: &Subscription,
) -> Result<SubscriptionId, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let id = subscription.id();
    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, user_id, service_name, price, start_date, end_date, created_at, updated_at, version
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(*id.as_uuid())
    .bind(*subscription.user_id().as_uuid())
    .bind(subscription.service_name())
    .bind(subscription.price())
    .bind(*subscription.start_date().as_datetime())
    .bind(subscription.end_date().map(|end| *end.as_datetime()))
    .bind(*subscription.created_at().as_datetime())
    .bind(*subscription.updated_at().as_datetime())
    .bind(subscription.version())
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepositoryError::Duplicate(id)
        } else {
            classify(e)
        }
    })?;

    Ok(id)
}

async fn delete_subscription<'e, E>(executor: E, id: SubscriptionId) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(*id.as_uuid())
        .execute(executor)
        .await
        .map_err(classify)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id));
    }
    Ok(())
}

async fn insert_event<'e, E>(executor: E, record: &OutboxRecord) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO events (id, type, payload, created_at) VALUES ($1, $2, $3, $4)")
        .bind(*record.id.as_uuid())
        .bind(&record.event_type)
        .bind(&record.payload)
        .bind(*record.created_at.as_datetime())
        .execute(executor)
        .await
        .map_err(classify)?;
    Ok(())
}

/// Appends the WHERE clause for `query`.
///
/// Shared by listing, counting and summing so the three never disagree on
/// which rows match.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &SubscriptionQuery) {
    qb.push(" WHERE TRUE");

    if let Some(user_id) = query.user_id() {
        qb.push(" AND user_id = ").push_bind(*user_id.as_uuid());
    }
    if let Some(service_name) = query.service_name() {
        qb.push(" AND service_name = ").push_bind(service_name.to_string());
    }
    if let Some(period) = query.start_period() {
        if let Some(from) = period.from() {
            qb.push(" AND start_date >= ").push_bind(*from.as_datetime());
        }
        if let Some(to) = period.to() {
            qb.push(" AND start_date <= ").push_bind(*to.as_datetime());
        }
    }

    if query.include_null_end() {
        qb.push(" AND (end_date IS NULL OR (TRUE");
    } else {
        qb.push(" AND (end_date IS NOT NULL AND (TRUE");
    }
    if let Some(period) = query.end_period() {
        if let Some(from) = period.from() {
            qb.push(" AND end_date >= ").push_bind(*from.as_datetime());
        }
        if let Some(to) = period.to() {
            qb.push(" AND end_date <= ").push_bind(*to.as_datetime());
        }
    }
    qb.push("))");
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: Option<(SortField, SortDirection)>) {
    match sort {
        Some((field, direction)) => {
            qb.push(format!(" ORDER BY {} {}, id", field.column(), direction.as_sql()));
        }
        None => {
            qb.push(" ORDER BY created_at, id");
        }
    }
}

fn resolve_sort(sorting: Option<&Sorting>) -> Result<Option<(SortField, SortDirection)>, RepositoryError> {
    sorting
        .map(|s| {
            SortField::parse(&s.field)
                .map(|field| (field, s.direction))
                .ok_or_else(|| RepositoryError::InvalidSortingField(s.field.clone()))
        })
        .transpose()
}

fn find_query(
    query: &SubscriptionQuery,
    pagination: Pagination,
    sort: Option<(SortField, SortDirection)>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_SUBSCRIPTION);
    push_filters(&mut qb, query);
    push_order(&mut qb, sort);
    qb.push(" LIMIT ").push_bind(i64::from(pagination.limit));
    qb.push(" OFFSET ").push_bind(i64::from(pagination.offset));
    qb
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<SubscriptionId, RepositoryError> {
        let pool = &self.pool;
        with_retry(&self.retry, cancel, self.observer(), "create", move || {
            insert_subscription(pool, subscription)
        })
        .await
    }

    async fn get_by_id(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<Subscription, RepositoryError> {
        let pool = &self.pool;
        let row = with_retry(&self.retry, cancel, self.observer(), "get_by_id", move || async move {
            sqlx::query_as::<_, SubscriptionRow>(SELECT_SUBSCRIPTION_BY_ID)
                .bind(*id.as_uuid())
                .fetch_optional(pool)
                .await
                .map_err(classify)
        })
        .await?;

        row.ok_or(RepositoryError::NotFound(id))?.try_into()
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError> {
        let pool = &self.pool;
        let id = subscription.id();
        let version = subscription.version();

        with_retry(&self.retry, cancel, self.observer(), "update", move || async move {
            let result = sqlx::query(
                r#"
                UPDATE subscriptions SET
                    user_id = $3,
                    service_name = $4,
                    price = $5,
                    start_date = $6,
                    end_date = $7,
                    updated_at = NOW(),
                    version = version + 1
                WHERE id = $1 AND version = $2
                "#,
            )
            .bind(*id.as_uuid())
            .bind(version)
            .bind(*subscription.user_id().as_uuid())
            .bind(subscription.service_name())
            .bind(subscription.price())
            .bind(*subscription.start_date().as_datetime())
            .bind(subscription.end_date().map(|end| *end.as_datetime()))
            .execute(pool)
            .await
            .map_err(classify)?;

            if result.rows_affected() > 0 {
                return Ok(());
            }

            // Nothing matched: either the row is gone or someone else bumped
            // the version since the caller read it.
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM subscriptions WHERE id = $1)")
                    .bind(*id.as_uuid())
                    .fetch_one(pool)
                    .await
                    .map_err(classify)?;

            if exists {
                Err(RepositoryError::ConcurrentModification { id, version })
            } else {
                Err(RepositoryError::NotFound(id))
            }
        })
        .await
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        id: SubscriptionId,
    ) -> Result<(), RepositoryError> {
        let pool = &self.pool;
        with_retry(&self.retry, cancel, self.observer(), "delete", move || {
            delete_subscription(pool, id)
        })
        .await
    }

    async fn find(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
        pagination: Option<Pagination>,
        sorting: Option<&Sorting>,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        let sort = resolve_sort(sorting)?;
        let pagination = pagination.unwrap_or_default();
        let pool = &self.pool;

        let rows = with_retry(&self.retry, cancel, self.observer(), "find", move || async move {
            let mut qb = find_query(query, pagination, sort);
            qb.build_query_as::<SubscriptionRow>()
                .fetch_all(pool)
                .await
                .map_err(classify)
        })
        .await?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}

#[async_trait]
impl SubscriptionStatsRepository for PostgresSubscriptionRepository {
    async fn calculate_total(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<u64, RepositoryError> {
        let pool = &self.pool;
        let count = with_retry(&self.retry, cancel, self.observer(), "calculate_total", move || async move {
            let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM subscriptions");
            push_filters(&mut qb, query);
            qb.build_query_scalar::<i64>()
                .fetch_one(pool)
                .await
                .map_err(classify)
        })
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn calculate_total_cost(
        &self,
        cancel: &CancellationToken,
        query: &SubscriptionQuery,
    ) -> Result<i64, RepositoryError> {
        let pool = &self.pool;
        with_retry(&self.retry, cancel, self.observer(), "calculate_total_cost", move || async move {
            let mut qb = QueryBuilder::new("SELECT COALESCE(SUM(price), 0)::BIGINT FROM subscriptions");
            push_filters(&mut qb, query);
            qb.build_query_scalar::<i64>()
                .fetch_one(pool)
                .await
                .map_err(classify)
        })
        .await
    }
}

/// Unit of work bound to an open Postgres transaction.
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create(&mut self, subscription: &Subscription) -> Result<SubscriptionId, RepositoryError> {
        insert_subscription(&mut *self.tx, subscription).await
    }

    async fn delete(&mut self, id: SubscriptionId) -> Result<(), RepositoryError> {
        delete_subscription(&mut *self.tx, id).await
    }

    async fn create_event(&mut self, record: &OutboxRecord) -> Result<(), RepositoryError> {
        insert_event(&mut *self.tx, record).await
    }
}

#[async_trait]
impl TransactionRunner for PostgresSubscriptionRepository {
    async fn run_in_transaction(
        &self,
        cancel: &CancellationToken,
        work: TransactionWork,
    ) -> Result<(), RepositoryError> {
        let pool = &self.pool;
        let tx = with_retry(&self.retry, cancel, self.observer(), "begin", move || async move {
            pool.begin().await.map_err(classify)
        })
        .await?;

        let mut uow = PgUnitOfWork { tx };
        let handle: &mut dyn UnitOfWork = &mut uow;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RepositoryError::Cancelled),
            result = work(handle) => result,
        };

        match outcome {
            Ok(()) => uow.tx.commit().await.map_err(classify),
            Err(err) => {
                if let Err(rollback_err) = uow.tx.rollback().await {
                    // Dropping the connection rolls back server-side anyway.
                    tracing::warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl OutboxStore for PostgresSubscriptionRepository {
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, type, payload, created_at
            FROM events
            ORDER BY created_at ASC, id
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(OutboxRecord::from).collect())
    }

    async fn remove(&self, id: EventId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}
