//! Temporal query model: `Period`, `SubscriptionQuery`, and the sortable
//! field allow-list shared by every repository backend.

use std::cmp::Ordering;
use std::fmt;

use super::Subscription;
use crate::domain::foundation::{Timestamp, UserId, ValidationError};

/// Optional time range at month granularity. Both bounds are inclusive and
/// truncated to the first of their month; an absent bound is unbounded on
/// that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Period {
    from: Option<Timestamp>,
    to: Option<Timestamp>,
}

impl Period {
    /// # Errors
    ///
    /// Returns `InvalidPeriod` when both bounds are given and `to < from`.
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Result<Self, ValidationError> {
        let from = from.map(|t| t.start_of_month());
        let to = to.map(|t| t.start_of_month());
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(ValidationError::InvalidPeriod);
            }
        }
        Ok(Self { from, to })
    }

    /// Period with only a lower bound.
    pub fn since(from: Timestamp) -> Self {
        Self {
            from: Some(from.start_of_month()),
            to: None,
        }
    }

    /// Period with only an upper bound.
    pub fn until(to: Timestamp) -> Self {
        Self {
            from: None,
            to: Some(to.start_of_month()),
        }
    }

    pub fn from(&self) -> Option<Timestamp> {
        self.from
    }

    pub fn to(&self) -> Option<Timestamp> {
        self.to
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        let at = at.start_of_month();
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// Filter criteria over subscriptions.
///
/// All set criteria are combined with AND. See [`SubscriptionQuery::include_null_end`]
/// for how open-ended subscriptions are treated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionQuery {
    user_id: Option<UserId>,
    service_name: Option<String>,
    start_period: Option<Period>,
    end_period: Option<Period>,
    end_include_null: Option<bool>,
}

impl SubscriptionQuery {
    /// Query matching every subscription.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_start_period(mut self, period: Period) -> Self {
        self.start_period = Some(period);
        self
    }

    pub fn with_end_period(mut self, period: Period) -> Self {
        self.end_period = Some(period);
        self
    }

    pub fn with_end_include_null(mut self, include: bool) -> Self {
        self.end_include_null = Some(include);
        self
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn start_period(&self) -> Option<&Period> {
        self.start_period.as_ref()
    }

    pub fn end_period(&self) -> Option<&Period> {
        self.end_period.as_ref()
    }

    pub fn end_include_null(&self) -> Option<bool> {
        self.end_include_null
    }

    /// Whether subscriptions without an end date pass the end-date filter.
    ///
    /// An explicit flag wins. Otherwise open-ended subscriptions are kept
    /// unless the end period has an upper bound.
    pub fn include_null_end(&self) -> bool {
        self.end_include_null.unwrap_or_else(|| {
            self.end_period
                .as_ref()
                .map_or(true, |period| period.to().is_none())
        })
    }

    /// Evaluates the filter against one subscription.
    ///
    /// Backends that cannot push the filter down to storage use this; the
    /// SQL predicate builder mirrors it clause for clause.
    pub fn matches(&self, sub: &Subscription) -> bool {
        if let Some(user_id) = self.user_id {
            if sub.user_id() != user_id {
                return false;
            }
        }
        if let Some(name) = &self.service_name {
            if sub.service_name() != name {
                return false;
            }
        }
        if let Some(period) = &self.start_period {
            if !period.contains(sub.start_date()) {
                return false;
            }
        }
        match sub.end_date() {
            None => self.include_null_end(),
            Some(end) => self.end_period.map_or(true, |period| period.contains(end)),
        }
    }
}

/// Allow-listed sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Price,
    ServiceName,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Price,
        SortField::ServiceName,
        SortField::StartDate,
        SortField::EndDate,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    /// Looks up a caller-supplied field name. Returns `None` for anything
    /// outside the allow-list.
    pub fn parse(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == field)
    }

    /// Column name; identical to the accepted field name.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::ServiceName => "service_name",
            SortField::StartDate => "start_date",
            SortField::EndDate => "end_date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    /// Ascending comparison on this field. Missing end dates sort last,
    /// matching Postgres' default for `ASC`.
    pub fn compare(&self, a: &Subscription, b: &Subscription) -> Ordering {
        match self {
            SortField::Price => a.price().cmp(&b.price()),
            SortField::ServiceName => a.service_name().cmp(b.service_name()),
            SortField::StartDate => a.start_date().cmp(&b.start_date()),
            SortField::EndDate => match (a.end_date(), b.end_date()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
