//! Reaction entity <-> model mapper

use agora_core::{
    ContentKind, DomainError, EntityId, ReactionCounts, ReactionEdge, ReactionSubject,
    ReactionType,
};
use uuid::Uuid;

use crate::models::{ReactionCountModel, ReactionModel};

/// Convert ReactionModel to ReactionEdge entity
///
/// Fails on a kind or type the domain does not know.
impl TryFrom<ReactionModel> for ReactionEdge {
    type Error = DomainError;

    fn try_from(model: ReactionModel) -> Result<Self, Self::Error> {
        let kind = ContentKind::parse(&model.subject_kind).ok_or_else(|| {
            DomainError::InternalError(format!("unknown subject kind '{}'", model.subject_kind))
        })?;
        let reaction = ReactionType::parse(&model.reaction_type).ok_or_else(|| {
            DomainError::InternalError(format!("unknown reaction type '{}'", model.reaction_type))
        })?;

        Ok(ReactionEdge {
            subject: ReactionSubject::new(EntityId::new(model.subject_id), kind),
            user_id: EntityId::new(model.user_id),
            reaction,
            created_at: model.created_at,
        })
    }
}

/// Fold grouped count rows into counts, skipping unknown reaction types
pub fn counts_from_rows(rows: Vec<ReactionCountModel>) -> ReactionCounts {
    ReactionCounts::from_pairs(rows.into_iter().filter_map(|row| {
        match ReactionType::parse(&row.reaction_type) {
            Some(reaction) => Some((reaction, row.count)),
            None => {
                tracing::warn!(reaction_type = %row.reaction_type, "Ignoring unknown reaction type");
                None
            }
        }
    }))
}

/// Bind values for inserting or deleting one reaction edge
pub struct ReactionInsert {
    pub subject_id: Uuid,
    pub subject_kind: &'static str,
    pub user_id: Uuid,
    pub reaction_type: &'static str,
}

impl ReactionInsert {
    pub fn new(subject: &ReactionSubject, user_id: EntityId, reaction: ReactionType) -> Self {
        Self {
            subject_id: subject.id.into_inner(),
            subject_kind: subject.kind.as_str(),
            user_id: user_id.into_inner(),
            reaction_type: reaction.as_str(),
        }
    }
}
