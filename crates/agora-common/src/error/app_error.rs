//! Application error types
//!
//! Unified error handling for the engine. Every user-visible failure is
//! reported through a [`Notice`]; nothing here is fatal.

use agora_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("You must be signed in")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Store errors
    #[error("Store rejected the change: {0}")]
    StoreRejected(String),

    #[error("Local state was stale: {0}")]
    StaleState(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get error code for notices and logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StoreRejected(_) => "STORE_REJECTED",
            Self::StaleState(_) => "STALE_STATE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Whether the failure is swallowed without telling the user
    ///
    /// A missing user is a no-op and a stale local state is repaired by
    /// overwriting it with server truth.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Unauthenticated | Self::StaleState(_) => true,
            Self::Domain(DomainError::Unauthenticated) => true,
            _ => false,
        }
    }

    /// Check if the caller caused this error
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Unauthenticated
            | Self::InsufficientPermissions
            | Self::Validation(_)
            | Self::NotFound(_) => true,
            Self::Domain(e) => e.is_validation() || e.is_not_found() || e.is_authorization(),
            _ => false,
        }
    }

    /// The transient notification for this error, if any
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        if self.is_silent() {
            return None;
        }
        Some(Notice::error(self.error_code(), self.to_string()))
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, non-blocking user notification (a "toast")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        Self::error(err.error_code(), err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
