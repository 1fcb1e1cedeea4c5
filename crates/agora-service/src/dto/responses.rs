//! Response DTOs for rendering reaction controls

use agora_core::{ReactionType, ReactionViewState};
use serde::Serialize;

/// One reaction button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionButton {
    pub reaction: ReactionType,
    pub count: u32,
    pub active: bool,
    /// Disabled while a write touching it is in flight
    pub pending: bool,
}

/// Every offered reaction of a subject, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    pub buttons: Vec<ReactionButton>,
    pub total: u64,
    /// Any write in flight locks all buttons
    pub locked: bool,
}

impl ReactionSummary {
    pub fn button(&self, reaction: ReactionType) -> Option<&ReactionButton> {
        self.buttons.iter().find(|b| b.reaction == reaction)
    }
}

impl From<&ReactionViewState> for ReactionSummary {
    fn from(view: &ReactionViewState) -> Self {
        let buttons = view
            .offered()
            .types()
            .into_iter()
            .map(|reaction| ReactionButton {
                reaction,
                count: view.count(reaction),
                active: view.is_active(reaction),
                pending: view.submitting().contains(&reaction),
            })
            .collect();

        Self {
            buttons,
            total: view.counts().total(),
            locked: view.is_submitting(),
        }
    }
}
