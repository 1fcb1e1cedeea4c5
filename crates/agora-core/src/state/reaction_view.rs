//! Reaction state machine
//!
//! Holds the displayed truth for one subject's reaction controls and computes
//! legal transitions. Everything here is pure; the coordinator in
//! `agora-service` applies transitions and talks to the store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::{ContentKind, ReactionCounts, ReactionType};
use crate::error::DomainError;
use crate::value_objects::ReactionSet;

/// A single write against the reaction store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "reaction", rename_all = "snake_case")]
pub enum EdgeOp {
    Delete(ReactionType),
    Insert(ReactionType),
}

impl EdgeOp {
    /// The reaction type the op touches
    #[inline]
    pub fn reaction(&self) -> ReactionType {
        match self {
            Self::Delete(r) | Self::Insert(r) => *r,
        }
    }

    #[inline]
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert(_))
    }
}

/// Result of `ReactionViewState::compute_toggle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTransition {
    /// State to display immediately
    pub next: ReactionViewState,
    /// Store writes to perform, in order
    pub ops: Vec<EdgeOp>,
}

/// Per-subject, per-session reaction view state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionViewState {
    kind: ContentKind,
    counts: ReactionCounts,
    user_active: Option<ReactionType>,
    submitting: BTreeSet<ReactionType>,
}

impl ReactionViewState {
    /// Seed from a server snapshot
    ///
    /// An active reaction the subject kind does not offer is dropped.
    pub fn initialize(
        kind: ContentKind,
        counts: ReactionCounts,
        user_active: Option<ReactionType>,
    ) -> Self {
        let offered = ReactionSet::for_kind(kind);
        Self {
            kind,
            counts,
            user_active: user_active.filter(|r| offered.offers(*r)),
            submitting: BTreeSet::new(),
        }
    }

    /// Empty state for a subject with no reactions yet
    pub fn empty(kind: ContentKind) -> Self {
        Self::initialize(kind, ReactionCounts::new(), None)
    }

    #[inline]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Reaction types this subject offers
    #[inline]
    pub fn offered(&self) -> ReactionSet {
        ReactionSet::for_kind(self.kind)
    }

    #[inline]
    pub fn counts(&self) -> &ReactionCounts {
        &self.counts
    }

    #[inline]
    pub fn count(&self, reaction: ReactionType) -> u32 {
        self.counts.get(reaction)
    }

    /// The user's active reaction, if any
    #[inline]
    pub fn user_active(&self) -> Option<ReactionType> {
        self.user_active
    }

    #[inline]
    pub fn is_active(&self, reaction: ReactionType) -> bool {
        self.user_active == Some(reaction)
    }

    /// Reaction types with a write in flight
    #[inline]
    pub fn submitting(&self) -> &BTreeSet<ReactionType> {
        &self.submitting
    }

    /// Any write in flight locks the whole subject
    #[inline]
    pub fn is_submitting(&self) -> bool {
        !self.submitting.is_empty()
    }

    /// Compute the transition for a click on `requested`
    pub fn compute_toggle(&self, requested: ReactionType) -> Result<ToggleTransition, DomainError> {
        if !self.offered().offers(requested) {
            return Err(DomainError::ReactionNotOffered {
                reaction: requested,
                kind: self.kind,
            });
        }

        let mut next = self.clone();
        let ops = match self.user_active {
            Some(active) if active == requested => {
                next.counts.decrement(requested);
                next.user_active = None;
                vec![EdgeOp::Delete(requested)]
            }
            Some(active) => {
                next.counts.decrement(active);
                next.counts.increment(requested);
                next.user_active = Some(requested);
                vec![EdgeOp::Delete(active), EdgeOp::Insert(requested)]
            }
            None => {
                next.counts.increment(requested);
                next.user_active = Some(requested);
                vec![EdgeOp::Insert(requested)]
            }
        };

        Ok(ToggleTransition { next, ops })
    }

    /// Mark every reaction touched by `ops` as in flight
    pub fn mark_submitting(&mut self, ops: &[EdgeOp]) {
        self.submitting.extend(ops.iter().map(EdgeOp::reaction));
    }

    pub fn clear_submitting(&mut self) {
        self.submitting.clear();
    }

    /// Replace counts and active reaction with server truth
    ///
    /// Returns `true` if the local projection had diverged. The in-flight set
    /// is left untouched.
    pub fn overwrite_with(&mut self, counts: ReactionCounts, user_active: Option<ReactionType>) -> bool {
        let server = Self::initialize(self.kind, counts, user_active);
        let diverged = server.counts != self.counts || server.user_active != self.user_active;
        self.counts = server.counts;
        self.user_active = server.user_active;
        diverged
    }
}
