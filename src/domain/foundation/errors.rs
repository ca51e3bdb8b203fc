//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Invariant violations raised by aggregate construction, mutation and
/// query value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user id is required")]
    MissingUserId,

    #[error("service name cannot be empty")]
    InvalidServiceName,

    #[error("price must be positive, got {price}")]
    InvalidPrice { price: i64 },

    #[error("end date must be after start date")]
    InvalidDates,

    #[error("invalid period: upper bound is before lower bound")]
    InvalidPeriod,
}

impl ValidationError {
    /// Stable error code for this violation.
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::MissingUserId => ErrorCode::MissingUserId,
            ValidationError::InvalidServiceName => ErrorCode::InvalidServiceName,
            ValidationError::InvalidPrice { .. } => ErrorCode::InvalidPrice,
            ValidationError::InvalidDates => ErrorCode::InvalidDates,
            ValidationError::InvalidPeriod => ErrorCode::InvalidPeriod,
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    MissingUserId,
    InvalidServiceName,
    InvalidPrice,
    InvalidDates,
    InvalidPeriod,
    InvalidSortingField,
    InvalidCommand,

    // Lookup and concurrency errors
    NotFound,
    AlreadyExists,
    ConcurrentModification,

    // Infrastructure errors
    RetriesExceeded,
    Cancelled,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Returns true for codes the caller can fix by changing its input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingUserId
                | ErrorCode::InvalidServiceName
                | ErrorCode::InvalidPrice
                | ErrorCode::InvalidDates
                | ErrorCode::InvalidPeriod
                | ErrorCode::InvalidSortingField
                | ErrorCode::InvalidCommand
                | ErrorCode::NotFound
                | ErrorCode::AlreadyExists
                | ErrorCode::ConcurrentModification
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MissingUserId => "MISSING_USER_ID",
            ErrorCode::InvalidServiceName => "INVALID_SERVICE_NAME",
            ErrorCode::InvalidPrice => "INVALID_PRICE",
            ErrorCode::InvalidDates => "INVALID_DATES",
            ErrorCode::InvalidPeriod => "INVALID_PERIOD",
            ErrorCode::InvalidSortingField => "INVALID_SORTING_FIELD",
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCode::RetriesExceeded => "RETRIES_EXCEEDED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
///
/// This is the shape handed to the transport layer; typed errors from the
/// domain and the repositories convert into it.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a command validation error for a specific field.
    pub fn invalid_command(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCommand, message).with_detail("field", field.into())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_invalid_price_displays_value() {
        let err = ValidationError::InvalidPrice { price: -5 };
        assert_eq!(format!("{}", err), "price must be positive, got -5");
    }

    #[test]
    fn validation_errors_map_to_distinct_codes() {
        assert_eq!(ValidationError::MissingUserId.code(), ErrorCode::MissingUserId);
        assert_eq!(ValidationError::InvalidServiceName.code(), ErrorCode::InvalidServiceName);
        assert_eq!(ValidationError::InvalidPrice { price: 0 }.code(), ErrorCode::InvalidPrice);
        assert_eq!(ValidationError::InvalidDates.code(), ErrorCode::InvalidDates);
        assert_eq!(ValidationError::InvalidPeriod.code(), ErrorCode::InvalidPeriod);
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::NotFound, "subscription not found");
        assert_eq!(format!("{}", err), "[NOT_FOUND] subscription not found");
    }

    #[test]
    fn domain_error_from_validation_keeps_code() {
        let err: DomainError = ValidationError::InvalidDates.into();
        assert_eq!(err.code, ErrorCode::InvalidDates);
        assert_eq!(err.message, "end date must be after start date");
    }

    #[test]
    fn invalid_command_records_field() {
        let err = DomainError::invalid_command("start_date", "cannot move earlier");
        assert_eq!(err.code, ErrorCode::InvalidCommand);
        assert_eq!(err.details.get("field"), Some(&"start_date".to_string()));
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(ErrorCode::ConcurrentModification.is_client_error());
        assert!(ErrorCode::InvalidSortingField.is_client_error());
        assert!(!ErrorCode::RetriesExceeded.is_client_error());
        assert!(!ErrorCode::DatabaseError.is_client_error());
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::ConcurrentModification), "CONCURRENT_MODIFICATION");
        assert_eq!(format!("{}", ErrorCode::RetriesExceeded), "RETRIES_EXCEEDED");
    }
}
