//! PostgreSQL implementation of ReactionStore

use std::sync::Arc;

use agora_core::{
    ChangeEvent, ChangePublisher, EntityId, ReactionCounts, ReactionEdge, ReactionStore,
    ReactionSubject, ReactionType, RepoResult,
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::mappers::{counts_from_rows, ReactionInsert};
use crate::models::{ReactionCountModel, ReactionModel};

use super::error::map_db_error;

/// PostgreSQL implementation of ReactionStore
#[derive(Clone)]
pub struct PgReactionStore {
    pool: PgPool,
    publisher: Option<Arc<dyn ChangePublisher>>,
}

impl PgReactionStore {
    /// Create a new PgReactionStore
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            publisher: None,
        }
    }

    /// Push committed writes into a change feed
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn ChangePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(event);
        }
    }
}

#[async_trait]
impl ReactionStore for PgReactionStore {
    #[instrument(skip(self))]
    async fn insert_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        let values = ReactionInsert::new(subject, user_id, reaction);

        let inserted = sqlx::query_as::<_, ReactionModel>(
            r#"
            INSERT INTO reactions (subject_id, subject_kind, user_id, reaction_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_kind, subject_id, user_id, reaction_type) DO NOTHING
            RETURNING subject_id, subject_kind, user_id, reaction_type, created_at
            "#,
        )
        .bind(values.subject_id)
        .bind(values.subject_kind)
        .bind(values.user_id)
        .bind(values.reaction_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(model) = inserted {
            self.publish(ChangeEvent::reaction_inserted(ReactionEdge::try_from(model)?));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        let values = ReactionInsert::new(subject, user_id, reaction);

        let deleted = sqlx::query_as::<_, ReactionModel>(
            r#"
            DELETE FROM reactions
            WHERE subject_kind = $1 AND subject_id = $2 AND user_id = $3 AND reaction_type = $4
            RETURNING subject_id, subject_kind, user_id, reaction_type, created_at
            "#,
        )
        .bind(values.subject_kind)
        .bind(values.subject_id)
        .bind(values.user_id)
        .bind(values.reaction_type)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        for model in deleted {
            self.publish(ChangeEvent::reaction_deleted(ReactionEdge::try_from(model)?));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_reaction_counts(&self, subject: &ReactionSubject) -> RepoResult<ReactionCounts> {
        let rows = sqlx::query_as::<_, ReactionCountModel>(
            r#"
            SELECT reaction_type, COUNT(*) as count
            FROM reactions
            WHERE subject_kind = $1 AND subject_id = $2
            GROUP BY reaction_type
            "#,
        )
        .bind(subject.kind.as_str())
        .bind(subject.id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(counts_from_rows(rows))
    }

    #[instrument(skip(self))]
    async fn fetch_user_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
    ) -> RepoResult<Option<ReactionType>> {
        // Newest edge wins if a crashed toggle ever left two behind
        let raw = sqlx::query_scalar::<_, String>(
            r#"
            SELECT reaction_type
            FROM reactions
            WHERE subject_kind = $1 AND subject_id = $2 AND user_id = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(subject.kind.as_str())
        .bind(subject.id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(raw.and_then(|r| ReactionType::parse(&r)))
    }
}
