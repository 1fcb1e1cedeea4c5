//! Cache bridge trait - how mutations reach the surrounding query cache

use std::fmt;

use crate::entities::{ContentItem, ContentKind, ReactionSubject};
use crate::state::ReactionViewState;
use crate::value_objects::EntityId;

/// Key of one cached query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Reaction counts and the viewer's active reaction on a subject
    Reactions(ReactionSubject),
    /// A single post or comment
    Item(ContentKind, EntityId),
    /// Posts in a group
    PostList(EntityId),
    /// Comments under a post
    CommentList(EntityId),
}

impl CacheKey {
    /// The list an item is rendered in
    pub fn list_of(item: &ContentItem) -> Option<Self> {
        match item.kind {
            ContentKind::Post => item.group_id.map(Self::PostList),
            ContentKind::Comment => item.post_id.map(Self::CommentList),
        }
    }

    /// The item entry for a post or comment
    pub fn item(item: &ContentItem) -> Self {
        Self::Item(item.kind, item.id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reactions(subject) => write!(f, "reactions/{subject}"),
            Self::Item(kind, id) => write!(f, "{kind}/{id}"),
            Self::PostList(group) => write!(f, "groups/{group}/posts"),
            Self::CommentList(post) => write!(f, "posts/{post}/comments"),
        }
    }
}

/// A cached query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Reactions(ReactionViewState),
    Item(ContentItem),
    Items(Vec<ContentItem>),
}

/// Patch applied to a cache entry; receives the current entry, returns the new one
pub type CachePatch = Box<dyn FnOnce(Option<CacheEntry>) -> Option<CacheEntry> + Send>;

/// Read-through, optimistically patched mirror of the store
pub trait CacheBridge: Send + Sync {
    /// Read an entry
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Store a fetched entry
    fn put(&self, key: CacheKey, entry: CacheEntry);

    /// Drop an entry so the next read refetches
    fn invalidate(&self, key: &CacheKey);

    /// Apply a patch ahead of confirmation, remembering the pre-patch entry
    fn patch_optimistically(&self, key: &CacheKey, patch: CachePatch);

    /// Confirm optimistic patches, forgetting the pre-patch entries
    fn settle(&self, keys: &[CacheKey]);

    /// Restore the pre-patch entries of unconfirmed patches
    fn rollback(&self, keys: &[CacheKey]);
}
