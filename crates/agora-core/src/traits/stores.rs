//! Store traits (ports) - the remote store the engine writes through
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! (`agora-db`) provides PostgreSQL and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{ContentItem, ContentKind, ReactionCounts, ReactionSubject, ReactionType};
use crate::error::DomainError;
use crate::events::ChangeEvent;
use crate::value_objects::EntityId;

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Reaction Store
// ============================================================================

#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Persist a reaction edge for the user
    async fn insert_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()>;

    /// Remove a reaction edge held by the user
    async fn delete_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()>;

    /// Count edges on a subject grouped by reaction type
    async fn fetch_reaction_counts(&self, subject: &ReactionSubject) -> RepoResult<ReactionCounts>;

    /// The reaction the user currently holds on a subject
    async fn fetch_user_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
    ) -> RepoResult<Option<ReactionType>>;
}

// ============================================================================
// Content Store
// ============================================================================

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Find a post or comment by ID
    async fn find_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<Option<ContentItem>>;

    /// List posts in a group, newest first
    async fn list_posts(&self, group_id: EntityId) -> RepoResult<Vec<ContentItem>>;

    /// List comments under a post, oldest first
    async fn list_comments(&self, post_id: EntityId) -> RepoResult<Vec<ContentItem>>;

    /// Create a post or comment
    async fn create_content(&self, item: &ContentItem) -> RepoResult<()>;

    /// Replace content; the store stamps and returns `updated_at`
    async fn update_content(
        &self,
        kind: ContentKind,
        id: EntityId,
        new_content: &str,
    ) -> RepoResult<DateTime<Utc>>;

    /// Hard delete, cascading to reactions and (for posts) comments
    async fn delete_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<()>;
}

// ============================================================================
// Change Publisher
// ============================================================================

/// Sink stores push their committed writes into
///
/// Publishing never blocks and never fails; a feed with no subscribers drops
/// the event.
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}
