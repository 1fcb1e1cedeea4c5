//! Change feed topics
//!
//! Defines the topic naming conventions shared by every change feed backend.

use crate::entities::{ContentKind, ReactionSubject};
use crate::value_objects::EntityId;

/// Topic prefix for reaction changes on one subject
pub const REACTIONS_TOPIC_PREFIX: &str = "reactions:";
/// Topic prefix for comment changes under one post
pub const COMMENTS_TOPIC_PREFIX: &str = "comments:";
/// Topic prefix for post changes in one group
pub const POSTS_TOPIC_PREFIX: &str = "posts:";

/// Change feed topic
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FeedTopic {
    /// Reaction edges on a post or comment
    Reactions(ReactionSubject),
    /// Comments under a post
    PostComments(EntityId),
    /// Posts in a group
    GroupPosts(EntityId),
    /// Custom topic name
    Custom(String),
}

impl FeedTopic {
    /// Create a reactions topic
    #[must_use]
    pub fn reactions(subject: ReactionSubject) -> Self {
        Self::Reactions(subject)
    }

    /// Create a comments topic
    #[must_use]
    pub fn post_comments(post_id: EntityId) -> Self {
        Self::PostComments(post_id)
    }

    /// Create a group posts topic
    #[must_use]
    pub fn group_posts(group_id: EntityId) -> Self {
        Self::GroupPosts(group_id)
    }

    /// Create a custom topic
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the topic name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Reactions(subject) => {
                format!("{REACTIONS_TOPIC_PREFIX}{}:{}", subject.kind, subject.id)
            }
            Self::PostComments(id) => format!("{COMMENTS_TOPIC_PREFIX}{id}"),
            Self::GroupPosts(id) => format!("{POSTS_TOPIC_PREFIX}{id}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a topic name back to a `FeedTopic`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix(REACTIONS_TOPIC_PREFIX) {
            if let Some((kind, id)) = rest.split_once(':') {
                if let (Some(kind), Ok(id)) = (ContentKind::parse(kind), EntityId::parse(id)) {
                    return Self::Reactions(ReactionSubject::new(id, kind));
                }
            }
        }

        if let Some(id_str) = name.strip_prefix(COMMENTS_TOPIC_PREFIX) {
            if let Ok(id) = EntityId::parse(id_str) {
                return Self::PostComments(id);
            }
        }

        if let Some(id_str) = name.strip_prefix(POSTS_TOPIC_PREFIX) {
            if let Ok(id) = EntityId::parse(id_str) {
                return Self::GroupPosts(id);
            }
        }

        Self::Custom(name.to_string())
    }
}

impl std::fmt::Display for FeedTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<FeedTopic> for String {
    fn from(topic: FeedTopic) -> Self {
        topic.name()
    }
}

impl From<String> for FeedTopic {
    fn from(name: String) -> Self {
        FeedTopic::parse(&name)
    }
}
