//! Edit session - the single in-progress edit of a post or comment

use serde::{Deserialize, Serialize};

use crate::entities::ContentKind;
use crate::error::DomainError;
use crate::value_objects::EntityId;

/// Phase of an open edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPhase {
    Editing,
    Saving,
}

/// What `EditSession::prepare_save` decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    /// Send this content to the store
    Submit(String),
    /// Draft matches the original; close the editor without a write
    Unchanged,
}

/// An open editor for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub item_id: EntityId,
    pub item_kind: ContentKind,
    original: String,
    draft: String,
    phase: EditPhase,
}

impl EditSession {
    /// Open an editor seeded with the item's current content
    pub fn start(item_id: EntityId, item_kind: ContentKind, current_content: impl Into<String>) -> Self {
        let original = current_content.into();
        Self {
            item_id,
            item_kind,
            draft: original.clone(),
            original,
            phase: EditPhase::Editing,
        }
    }

    #[inline]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    #[inline]
    pub fn is_submitting(&self) -> bool {
        self.phase == EditPhase::Saving
    }

    /// Replace the draft text
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Validate the draft and decide whether a write is needed
    pub fn prepare_save(&self, max_len: usize) -> Result<SaveDecision, DomainError> {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if trimmed.chars().count() > max_len {
            return Err(DomainError::ContentTooLong { max: max_len });
        }
        if trimmed == self.original.trim() {
            return Ok(SaveDecision::Unchanged);
        }
        Ok(SaveDecision::Submit(trimmed.to_string()))
    }

    pub fn begin_saving(&mut self) {
        self.phase = EditPhase::Saving;
    }

    /// Return to `Editing` after a failed save, keeping the draft
    pub fn abort_saving(&mut self) {
        self.phase = EditPhase::Editing;
    }
}
