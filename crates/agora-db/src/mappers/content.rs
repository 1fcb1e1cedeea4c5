//! Content entity <-> model mapper

use agora_core::{ContentItem, ContentKind, EntityId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{CommentModel, PostModel};

/// Convert PostModel to ContentItem entity
impl From<PostModel> for ContentItem {
    fn from(model: PostModel) -> Self {
        ContentItem {
            id: EntityId::new(model.id),
            kind: ContentKind::Post,
            author_id: EntityId::new(model.author_id),
            group_id: Some(EntityId::new(model.group_id)),
            post_id: None,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Convert CommentModel to ContentItem entity
impl From<CommentModel> for ContentItem {
    fn from(model: CommentModel) -> Self {
        ContentItem {
            id: EntityId::new(model.id),
            kind: ContentKind::Comment,
            author_id: EntityId::new(model.author_id),
            group_id: None,
            post_id: Some(EntityId::new(model.post_id)),
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Bind values for inserting a post or comment
pub struct ContentInsert<'a> {
    pub id: Uuid,
    /// `group_id` for posts, `post_id` for comments
    pub parent_id: Uuid,
    pub author_id: Uuid,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> ContentInsert<'a> {
    /// `None` if the item lacks the parent its kind requires
    pub fn new(item: &'a ContentItem) -> Option<Self> {
        let parent = match item.kind {
            ContentKind::Post => item.group_id,
            ContentKind::Comment => item.post_id,
        }?;

        Some(Self {
            id: item.id.into_inner(),
            parent_id: parent.into_inner(),
            author_id: item.author_id.into_inner(),
            content: &item.content,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }
}
