//! Reaction entities - reaction types, subjects, persisted edges and counts

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentKind;
use crate::value_objects::EntityId;

/// The reactions a user can place on a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    ThumbsUp,
    ThumbsDown,
    Heart,
    Like,
}

impl ReactionType {
    /// Every reaction type, in display order
    pub const ALL: [ReactionType; 4] = [
        ReactionType::ThumbsUp,
        ReactionType::ThumbsDown,
        ReactionType::Heart,
        ReactionType::Like,
    ];

    /// Storage name used in the `reactions.reaction_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "thumbs_up",
            Self::ThumbsDown => "thumbs_down",
            Self::Heart => "heart",
            Self::Like => "like",
        }
    }

    /// Parse the storage name back into a reaction type
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "thumbs_up" => Some(Self::ThumbsUp),
            "thumbs_down" => Some(Self::ThumbsDown),
            "heart" => Some(Self::Heart),
            "like" => Some(Self::Like),
            _ => None,
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies what is being reacted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionSubject {
    pub id: EntityId,
    pub kind: ContentKind,
}

impl ReactionSubject {
    /// Create a new subject
    pub fn new(id: EntityId, kind: ContentKind) -> Self {
        Self { id, kind }
    }

    /// A post subject
    pub fn post(id: EntityId) -> Self {
        Self::new(id, ContentKind::Post)
    }

    /// A comment subject
    pub fn comment(id: EntityId) -> Self {
        Self::new(id, ContentKind::Comment)
    }
}

impl fmt::Display for ReactionSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The persisted fact that a user holds a specific reaction on a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEdge {
    pub subject: ReactionSubject,
    pub user_id: EntityId,
    pub reaction: ReactionType,
    pub created_at: DateTime<Utc>,
}

impl ReactionEdge {
    /// Create a new edge stamped with the current time
    pub fn new(subject: ReactionSubject, user_id: EntityId, reaction: ReactionType) -> Self {
        Self {
            subject,
            user_id,
            reaction,
            created_at: Utc::now(),
        }
    }

    /// Check if the edge belongs to the given user on the given subject
    #[inline]
    pub fn is_held_by(&self, subject: &ReactionSubject, user_id: EntityId) -> bool {
        self.subject.id == subject.id && self.user_id == user_id
    }
}

/// Displayed reaction counts for one subject
///
/// Zero counts are never stored, so two count maps that display the same
/// numbers always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionCounts(BTreeMap<ReactionType, u32>);

impl ReactionCounts {
    /// Empty counts
    pub fn new() -> Self {
        Self::default()
    }

    /// Build counts from store rows, clamping negative values to zero
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ReactionType, i64)>,
    {
        let mut counts = Self::new();
        for (reaction, count) in pairs {
            let current = i64::from(counts.get(reaction));
            let total = (current + count.max(0)).min(i64::from(u32::MAX));
            counts.set(reaction, total as u32);
        }
        counts
    }

    /// Count for a reaction type
    #[inline]
    pub fn get(&self, reaction: ReactionType) -> u32 {
        self.0.get(&reaction).copied().unwrap_or(0)
    }

    /// Set the count for a reaction type
    pub fn set(&mut self, reaction: ReactionType, count: u32) {
        if count == 0 {
            self.0.remove(&reaction);
        } else {
            self.0.insert(reaction, count);
        }
    }

    /// Add one to a reaction type
    pub fn increment(&mut self, reaction: ReactionType) {
        let next = self.get(reaction).saturating_add(1);
        self.set(reaction, next);
    }

    /// Remove one from a reaction type, never going below zero
    pub fn decrement(&mut self, reaction: ReactionType) {
        let next = self.get(reaction).saturating_sub(1);
        self.set(reaction, next);
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| u64::from(c)).sum()
    }

    /// Iterate non-zero counts
    pub fn iter(&self) -> impl Iterator<Item = (ReactionType, u32)> + '_ {
        self.0.iter().map(|(&reaction, &count)| (reaction, count))
    }

    /// Check if no reactions are counted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
