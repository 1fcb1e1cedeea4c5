//! Content entities - user-authored posts and comments

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::EntityId;

/// Kind of user-authored content (also the kind of a reaction subject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    /// Storage name used in `reactions.subject_kind`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Parse the storage name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post or a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: EntityId,
    pub kind: ContentKind,
    pub author_id: EntityId,
    /// Group the post belongs to (posts only)
    pub group_id: Option<EntityId>,
    /// Parent post (comments only)
    pub post_id: Option<EntityId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create a new post
    pub fn new_post(id: EntityId, group_id: EntityId, author_id: EntityId, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind: ContentKind::Post,
            author_id,
            group_id: Some(group_id),
            post_id: None,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new comment on a post
    pub fn new_comment(id: EntityId, post_id: EntityId, author_id: EntityId, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind: ContentKind::Comment,
            author_id,
            group_id: None,
            post_id: Some(post_id),
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if content has been edited since creation
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.updated_at > self.created_at
    }

    /// Apply a confirmed edit
    pub fn apply_edit(&mut self, content: String, updated_at: DateTime<Utc>) {
        self.content = content;
        self.updated_at = updated_at;
    }

    /// Check if the user authored this item
    #[inline]
    pub fn is_authored_by(&self, user_id: EntityId) -> bool {
        self.author_id == user_id
    }
}
