//! Error handling utilities for stores

use agora_core::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
///
/// Connection-level failures mean the store could not be reached; anything
/// else is the store refusing the statement.
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => DomainError::StoreUnavailable(e.to_string()),
        _ => DomainError::StoreRejected(e.to_string()),
    }
}
