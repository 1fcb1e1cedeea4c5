//! PostgreSQL implementation of ContentStore

use std::sync::Arc;

use agora_core::{
    ChangeEvent, ChangePublisher, ContentItem, ContentKind, ContentStore, DomainError, EntityId,
    RepoResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use crate::mappers::ContentInsert;
use crate::models::{CommentModel, PostModel};

use super::error::map_db_error;

const POST_COLUMNS: &str = "id, group_id, author_id, content, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, post_id, author_id, content, created_at, updated_at";

/// PostgreSQL implementation of ContentStore
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
    publisher: Option<Arc<dyn ChangePublisher>>,
}

impl PgContentStore {
    /// Create a new PgContentStore
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

    /// Delete reaction edges on the given subjects
    async fn delete_reactions_on(
        tx: &mut Transaction<'_, Postgres>,
        kind: ContentKind,
        ids: &[uuid::Uuid],
    ) -> RepoResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            DELETE FROM reactions WHERE subject_kind = $1 AND subject_id = ANY($2)
            "#,
        )
        .bind(kind.as_str())
        .bind(ids)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    #[instrument(skip(self))]
    async fn find_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<Option<ContentItem>> {
        let item = match kind {
            ContentKind::Post => sqlx::query_as::<_, PostModel>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
            ))
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(ContentItem::from),
            ContentKind::Comment => sqlx::query_as::<_, CommentModel>(&format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
            ))
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(ContentItem::from),
        };

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, group_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE group_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(group_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(ContentItem::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, CommentModel>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at, id"
        ))
        .bind(post_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(ContentItem::from).collect())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, kind = %item.kind))]
    async fn create_content(&self, item: &ContentItem) -> RepoResult<()> {
        let values = ContentInsert::new(item).ok_or_else(|| {
            DomainError::ValidationError(format!("{} is missing its parent", item.kind))
        })?;

        let sql = match item.kind {
            ContentKind::Post => {
                r#"
                INSERT INTO posts (id, group_id, author_id, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#
            }
            ContentKind::Comment => {
                r#"
                INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#
            }
        };

        sqlx::query(sql)
            .bind(values.id)
            .bind(values.parent_id)
            .bind(values.author_id)
            .bind(values.content)
            .bind(values.created_at)
            .bind(values.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        self.publish(ChangeEvent::content_created(item.clone()));

        Ok(())
    }

    #[instrument(skip(self, new_content))]
    async fn update_content(
        &self,
        kind: ContentKind,
        id: EntityId,
        new_content: &str,
    ) -> RepoResult<DateTime<Utc>> {
        let updated: Option<ContentItem> = match kind {
            ContentKind::Post => sqlx::query_as::<_, PostModel>(&format!(
                "UPDATE posts SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {POST_COLUMNS}"
            ))
            .bind(id.into_inner())
            .bind(new_content)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(ContentItem::from),
            ContentKind::Comment => sqlx::query_as::<_, CommentModel>(&format!(
                "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
            ))
            .bind(id.into_inner())
            .bind(new_content)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(ContentItem::from),
        };

        let item = updated.ok_or_else(|| DomainError::content_not_found(kind, id))?;
        let updated_at = item.updated_at;
        self.publish(ChangeEvent::content_updated(item));

        Ok(updated_at)
    }

    #[instrument(skip(self))]
    async fn delete_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let (removed, removed_comments) = match kind {
            ContentKind::Post => {
                let comments = sqlx::query_as::<_, CommentModel>(&format!(
                    "DELETE FROM comments WHERE post_id = $1 RETURNING {COMMENT_COLUMNS}"
                ))
                .bind(id.into_inner())
                .fetch_all(&mut *tx)
                .await
                .map_err(map_db_error)?;

                let comment_ids: Vec<uuid::Uuid> = comments.iter().map(|c| c.id).collect();
                Self::delete_reactions_on(&mut tx, ContentKind::Comment, &comment_ids).await?;

                let post = sqlx::query_as::<_, PostModel>(&format!(
                    "DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}"
                ))
                .bind(id.into_inner())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_error)?
                .map(ContentItem::from);

                (post, comments.into_iter().map(ContentItem::from).collect())
            }
            ContentKind::Comment => {
                let comment = sqlx::query_as::<_, CommentModel>(&format!(
                    "DELETE FROM comments WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
                ))
                .bind(id.into_inner())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_error)?
                .map(ContentItem::from);

                (comment, Vec::new())
            }
        };

        let Some(removed) = removed else {
            // Dropping the transaction rolls it back
            return Err(DomainError::content_not_found(kind, id));
        };

        Self::delete_reactions_on(&mut tx, kind, &[id.into_inner()]).await?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            item_id = %id,
            kind = %kind,
            cascaded_comments = removed_comments.len(),
            "Content deleted"
        );

        for comment in &removed_comments {
            self.publish(ChangeEvent::content_removed(comment));
        }
        self.publish(ChangeEvent::content_removed(&removed));

        Ok(())
    }
}
