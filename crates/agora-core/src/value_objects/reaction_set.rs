//! Reaction sets - which reaction types a subject kind offers

use bitflags::bitflags;

use crate::entities::{ContentKind, ReactionType};

bitflags! {
    /// Set of reaction types offered on a subject
    ///
    /// All types in a set are mutually exclusive per user.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReactionSet: u8 {
        const THUMBS_UP   = 1 << 0;
        const THUMBS_DOWN = 1 << 1;
        const HEART       = 1 << 2;
        const LIKE        = 1 << 3;

        /// Reactions offered on posts
        const POST = Self::THUMBS_UP.bits()
            | Self::THUMBS_DOWN.bits()
            | Self::HEART.bits();

        /// Reactions offered on comments
        const COMMENT = Self::THUMBS_UP.bits()
            | Self::THUMBS_DOWN.bits()
            | Self::HEART.bits()
            | Self::LIKE.bits();
    }
}

impl ReactionSet {
    /// The set offered for a subject kind
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Post => Self::POST,
            ContentKind::Comment => Self::COMMENT,
        }
    }

    /// The single-flag set for a reaction type
    pub fn of(reaction: ReactionType) -> Self {
        match reaction {
            ReactionType::ThumbsUp => Self::THUMBS_UP,
            ReactionType::ThumbsDown => Self::THUMBS_DOWN,
            ReactionType::Heart => Self::HEART,
            ReactionType::Like => Self::LIKE,
        }
    }

    /// Check if a reaction type is offered
    #[inline]
    pub fn offers(&self, reaction: ReactionType) -> bool {
        self.contains(Self::of(reaction))
    }

    /// Reaction types in this set, in display order
    pub fn types(&self) -> Vec<ReactionType> {
        ReactionType::ALL
            .into_iter()
            .filter(|r| self.offers(*r))
            .collect()
    }
}
