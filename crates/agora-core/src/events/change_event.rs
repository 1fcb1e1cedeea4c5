//! Change events - insert/update/delete notifications pushed by the store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::topic::FeedTopic;
use crate::entities::{ContentItem, ContentKind, ReactionEdge};
use crate::value_objects::EntityId;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// The row a change refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ChangeRecord {
    Reaction(ReactionEdge),
    Content(ContentItem),
    /// A removed post or comment; only the key survives a hard delete
    RemovedContent { id: EntityId, kind: ContentKind },
}

/// One push notification from the change feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub topic: FeedTopic,
    pub record: ChangeRecord,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create a new event stamped with the current time
    pub fn new(kind: ChangeKind, topic: FeedTopic, record: ChangeRecord) -> Self {
        Self {
            kind,
            topic,
            record,
            at: Utc::now(),
        }
    }

    /// A reaction edge was inserted
    pub fn reaction_inserted(edge: ReactionEdge) -> Self {
        Self::new(
            ChangeKind::Insert,
            FeedTopic::reactions(edge.subject),
            ChangeRecord::Reaction(edge),
        )
    }

    /// A reaction edge was deleted
    pub fn reaction_deleted(edge: ReactionEdge) -> Self {
        Self::new(
            ChangeKind::Delete,
            FeedTopic::reactions(edge.subject),
            ChangeRecord::Reaction(edge),
        )
    }

    /// A post or comment was created
    pub fn content_created(item: ContentItem) -> Self {
        let topic = Self::content_topic(&item);
        Self::new(ChangeKind::Insert, topic, ChangeRecord::Content(item))
    }

    /// A post or comment was edited
    pub fn content_updated(item: ContentItem) -> Self {
        let topic = Self::content_topic(&item);
        Self::new(ChangeKind::Update, topic, ChangeRecord::Content(item))
    }

    /// A post or comment was removed
    pub fn content_removed(item: &ContentItem) -> Self {
        Self::new(
            ChangeKind::Delete,
            Self::content_topic(item),
            ChangeRecord::RemovedContent {
                id: item.id,
                kind: item.kind,
            },
        )
    }

    /// The list topic an item is published on
    pub fn content_topic(item: &ContentItem) -> FeedTopic {
        match item.kind {
            ContentKind::Post => FeedTopic::group_posts(item.group_id.unwrap_or_else(EntityId::nil)),
            ContentKind::Comment => {
                FeedTopic::post_comments(item.post_id.unwrap_or_else(EntityId::nil))
            }
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
