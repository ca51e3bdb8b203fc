//! Subscription aggregate entity.
//!
//! A Subscription is a user's paid access to a named service over a range of
//! calendar months.
//!
//! # Design Decisions
//!
//! - **Month granularity**: start and end dates are truncated to the first
//!   instant of their month on every write and comparison
//! - **Fail without mutation**: every mutator validates the would-be state
//!   first and leaves the aggregate untouched on error
//! - **Optimistic locking**: `version` starts at 1 and is advanced by the
//!   repository on each persisted update

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Subscription aggregate.
///
/// # Invariants
///
/// - `service_name` is not blank
/// - `price > 0`
/// - `start_date` and `end_date` sit on the first instant of a month
/// - if present, `end_date > start_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    id: SubscriptionId,
    user_id: UserId,
    service_name: String,
    price: i64,
    start_date: Timestamp,
    end_date: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: i32,
}

impl Subscription {
    /// Create a new subscription at version 1.
    ///
    /// A random id is assigned when `id` is `None`.
    ///
    /// # Errors
    ///
    /// - `InvalidServiceName` if the name is blank
    /// - `InvalidPrice` if `price <= 0`
    /// - `InvalidDates` if the normalized end is not after the normalized start
    pub fn create(
        id: Option<SubscriptionId>,
        user_id: UserId,
        service_name: impl Into<String>,
        price: i64,
        start_date: Timestamp,
        end_date: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        Self::reconstitute(
            id.unwrap_or_default(),
            user_id,
            service_name,
            price,
            start_date,
            end_date,
            now,
            now,
            1,
        )
    }

    /// Rebuild a subscription from stored fields.
    ///
    /// Runs the same checks as [`Subscription::create`], so a row that
    /// violates an invariant never turns into an aggregate.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SubscriptionId,
        user_id: UserId,
        service_name: impl Into<String>,
        price: i64,
        start_date: Timestamp,
        end_date: Option<Timestamp>,
        created_at: Timestamp,
        updated_at: Timestamp,
        version: i32,
    ) -> Result<Self, ValidationError> {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(ValidationError::InvalidServiceName);
        }
        validate_price(price)?;

        let start_date = start_date.start_of_month();
        let end_date = end_date.map(|end| end.start_of_month());
        validate_dates(start_date, end_date)?;

        Ok(Self {
            id,
            user_id,
            service_name,
            price,
            start_date,
            end_date,
            created_at,
            updated_at,
            version,
        })
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn start_date(&self) -> Timestamp {
        self.start_date
    }

    pub fn end_date(&self) -> Option<Timestamp> {
        self.end_date
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Version the caller read; used as the optimistic-locking guard.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Whether the subscription covers the month containing `at`.
    ///
    /// Both ends are inclusive.
    pub fn is_active(&self, at: Timestamp) -> bool {
        let at = at.start_of_month();
        if at < self.start_date {
            return false;
        }
        match self.end_date {
            None => true,
            Some(end) => at <= end,
        }
    }

    /// Change the monthly price.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrice` if `price <= 0`.
    pub fn change_price(&mut self, price: i64) -> Result<(), ValidationError> {
        validate_price(price)?;
        self.price = price;
        self.touch();
        Ok(())
    }

    /// Move the start month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDates` if the new start is not before the current end.
    pub fn change_start_date(&mut self, start: Timestamp) -> Result<(), ValidationError> {
        let start = start.start_of_month();
        validate_dates(start, self.end_date)?;
        self.start_date = start;
        self.touch();
        Ok(())
    }

    /// Set or move the end month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDates` if the new end is not after the start.
    pub fn change_end_date(&mut self, end: Timestamp) -> Result<(), ValidationError> {
        let end = end.start_of_month();
        validate_dates(self.start_date, Some(end))?;
        self.end_date = Some(end);
        self.touch();
        Ok(())
    }

    /// Make the subscription open-ended.
    pub fn clear_end_date(&mut self) {
        self.end_date = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

fn validate_price(price: i64) -> Result<(), ValidationError> {
    if price <= 0 {
        return Err(ValidationError::InvalidPrice { price });
    }
    Ok(())
}

fn validate_dates(start: Timestamp, end: Option<Timestamp>) -> Result<(), ValidationError> {
    match end {
        Some(end) if end <= start => Err(ValidationError::InvalidDates),
        _ => Ok(()),
    }
}
