//! In-memory implementation of the store traits
//!
//! Same semantics as the PostgreSQL stores, including cascade deletes and
//! change publishing, without a database.

use std::collections::HashMap;
use std::sync::Arc;

use agora_core::{
    ChangeEvent, ChangePublisher, ContentItem, ContentKind, ContentStore, DomainError, EntityId,
    ReactionCounts, ReactionEdge, ReactionStore, ReactionSubject, ReactionType, RepoResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::instrument;

#[derive(Default)]
struct MemoryState {
    items: HashMap<(ContentKind, EntityId), ContentItem>,
    /// Insertion order is creation order
    reactions: Vec<ReactionEdge>,
}

impl MemoryState {
    fn holds(&self, subject: &ReactionSubject, user_id: EntityId, reaction: ReactionType) -> bool {
        self.reactions
            .iter()
            .any(|e| e.subject == *subject && e.user_id == user_id && e.reaction == reaction)
    }
}

/// In-memory reaction and content store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    publisher: Option<Arc<dyn ChangePublisher>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push committed writes into a change feed
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn ChangePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Snapshot of every reaction edge, oldest first
    pub fn edges(&self) -> Vec<ReactionEdge> {
        self.state.read().reactions.clone()
    }

    /// Snapshot of the edges on one subject
    pub fn edges_on(&self, subject: &ReactionSubject) -> Vec<ReactionEdge> {
        self.state
            .read()
            .reactions
            .iter()
            .filter(|e| e.subject == *subject)
            .cloned()
            .collect()
    }

    /// Number of stored posts and comments
    pub fn item_count(&self) -> usize {
        self.state.read().items.len()
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(event);
        }
    }
}

#[async_trait]
impl ReactionStore for MemoryStore {
    #[instrument(skip(self))]
    async fn insert_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        let edge = {
            let mut state = self.state.write();
            if state.holds(subject, user_id, reaction) {
                return Ok(());
            }
            let edge = ReactionEdge::new(*subject, user_id, reaction);
            state.reactions.push(edge.clone());
            edge
        };

        self.publish(ChangeEvent::reaction_inserted(edge));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        let removed: Vec<ReactionEdge> = {
            let mut state = self.state.write();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.reactions)
                .into_iter()
                .partition(|e| e.subject == *subject && e.user_id == user_id && e.reaction == reaction);
            state.reactions = kept;
            removed
        };

        for edge in removed {
            self.publish(ChangeEvent::reaction_deleted(edge));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_reaction_counts(&self, subject: &ReactionSubject) -> RepoResult<ReactionCounts> {
        let state = self.state.read();
        let mut counts = ReactionCounts::new();
        for edge in state.reactions.iter().filter(|e| e.subject == *subject) {
            counts.increment(edge.reaction);
        }
        Ok(counts)
    }

    #[instrument(skip(self))]
    async fn fetch_user_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
    ) -> RepoResult<Option<ReactionType>> {
        let state = self.state.read();
        Ok(state
            .reactions
            .iter()
            .rev()
            .find(|e| e.subject == *subject && e.user_id == user_id)
            .map(|e| e.reaction))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    #[instrument(skip(self))]
    async fn find_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<Option<ContentItem>> {
        Ok(self.state.read().items.get(&(kind, id)).cloned())
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, group_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        let state = self.state.read();
        let mut posts: Vec<ContentItem> = state
            .items
            .values()
            .filter(|i| i.kind == ContentKind::Post && i.group_id == Some(group_id))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        let state = self.state.read();
        let mut comments: Vec<ContentItem> = state
            .items
            .values()
            .filter(|i| i.kind == ContentKind::Comment && i.post_id == Some(post_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, kind = %item.kind))]
    async fn create_content(&self, item: &ContentItem) -> RepoResult<()> {
        {
            let mut state = self.state.write();
            match item.kind {
                ContentKind::Post if item.group_id.is_none() => {
                    return Err(DomainError::ValidationError("post is missing its group".into()));
                }
                ContentKind::Comment => {
                    let post_id = item.post_id.ok_or_else(|| {
                        DomainError::ValidationError("comment is missing its post".into())
                    })?;
                    if !state.items.contains_key(&(ContentKind::Post, post_id)) {
                        return Err(DomainError::PostNotFound(post_id));
                    }
                }
                ContentKind::Post => {}
            }

            let key = (item.kind, item.id);
            if state.items.contains_key(&key) {
                return Err(DomainError::StoreRejected(format!(
                    "{} {} already exists",
                    item.kind, item.id
                )));
            }
            state.items.insert(key, item.clone());
        }

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
        let item = {
            let mut state = self.state.write();
            let item = state
                .items
                .get_mut(&(kind, id))
                .ok_or_else(|| DomainError::content_not_found(kind, id))?;

            // Keep updated_at strictly after the previous stamp
            let now = Utc::now().max(item.updated_at + chrono::Duration::microseconds(1));
            item.apply_edit(new_content.to_string(), now);
            item.clone()
        };

        let updated_at = item.updated_at;
        self.publish(ChangeEvent::content_updated(item));
        Ok(updated_at)
    }

    #[instrument(skip(self))]
    async fn delete_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<()> {
        let (removed, removed_comments) = {
            let mut state = self.state.write();
            let removed = state
                .items
                .remove(&(kind, id))
                .ok_or_else(|| DomainError::content_not_found(kind, id))?;

            let comment_ids: Vec<EntityId> = if kind == ContentKind::Post {
                state
                    .items
                    .values()
                    .filter(|i| i.kind == ContentKind::Comment && i.post_id == Some(id))
                    .map(|i| i.id)
                    .collect()
            } else {
                Vec::new()
            };

            let removed_comments: Vec<ContentItem> = comment_ids
                .iter()
                .filter_map(|cid| state.items.remove(&(ContentKind::Comment, *cid)))
                .collect();

            state.reactions.retain(|e| {
                let on_item = e.subject.kind == kind && e.subject.id == id;
                let on_comment =
                    e.subject.kind == ContentKind::Comment && comment_ids.contains(&e.subject.id);
                !(on_item || on_comment)
            });

            (removed, removed_comments)
        };

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
