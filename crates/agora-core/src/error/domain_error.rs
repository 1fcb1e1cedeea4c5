//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::{ContentKind, ReactionType};
use crate::value_objects::EntityId;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Post not found: {0}")]
    PostNotFound(EntityId),

    #[error("Comment not found: {0}")]
    CommentNotFound(EntityId),

    #[error("Content not found: {0}")]
    ContentNotFound(EntityId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Reaction {reaction} is not offered on a {kind}")]
    ReactionNotOffered {
        reaction: ReactionType,
        kind: ContentKind,
    },

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Not content author")]
    NotContentAuthor,

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Store rejected the request: {0}")]
    StoreRejected(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Change feed error: {0}")]
    FeedError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for notices and logs
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::PostNotFound(_) => "UNKNOWN_POST",
            Self::CommentNotFound(_) => "UNKNOWN_COMMENT",
            Self::ContentNotFound(_) => "UNKNOWN_CONTENT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::ReactionNotOffered { .. } => "REACTION_NOT_OFFERED",

            // Authorization
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotContentAuthor => "NOT_CONTENT_AUTHOR",

            // Store
            Self::StoreRejected(_) => "STORE_REJECTED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::FeedError(_) => "FEED_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PostNotFound(_) | Self::CommentNotFound(_) | Self::ContentNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::ReactionNotOffered { .. }
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::NotContentAuthor)
    }

    /// Check if the remote store failed the call (network or rejection)
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreRejected(_) | Self::StoreUnavailable(_) | Self::FeedError(_)
        )
    }

    /// Not-found error for a content kind
    pub fn content_not_found(kind: ContentKind, id: EntityId) -> Self {
        match kind {
            ContentKind::Post => Self::PostNotFound(id),
            ContentKind::Comment => Self::CommentNotFound(id),
        }
    }
}
