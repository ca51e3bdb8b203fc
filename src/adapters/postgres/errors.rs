//! Classification of sqlx errors into repository errors.

use crate::ports::RepositoryError;

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a driver error to `Transient` or `Database`.
pub(crate) fn classify(err: sqlx::Error) -> RepositoryError {
    if is_transient(&err) {
        RepositoryError::transient(err)
    } else {
        RepositoryError::database(err)
    }
}

/// Connection-level failures and serialization conflicts that may succeed
/// on a fresh attempt.
pub(crate) fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().map_or(false, |code| is_transient_sqlstate(&code)),
        _ => false,
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

// Class 08: connection exception. 40001/40P01: serialization failure and
// deadlock. 57P01-57P03: server shutting down or not yet accepting.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "40001" | "40P01" | "57P01" | "57P02" | "57P03")
}
