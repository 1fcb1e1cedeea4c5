//! Fault-injecting store
//!
//! [`FlakyStore`] delegates to a [`MemoryStore`] and can fail, or hold, the
//! next call of a given kind. Every write is recorded in order.

use std::collections::HashMap;
use std::sync::Arc;

use agora_core::{
    ContentItem, ContentKind, ContentStore, DomainError, EntityId, ReactionCounts, ReactionStore,
    ReactionSubject, ReactionType, RepoResult,
};
use agora_db::MemoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Kinds of store call a fault can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    InsertReaction,
    DeleteReaction,
    UpdateContent,
    DeleteContent,
}

/// A write the store received, whether or not it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    InsertReaction(ReactionType),
    DeleteReaction(ReactionType),
    UpdateContent(EntityId),
    DeleteContent(EntityId),
}

/// Pauses one call until released
#[derive(Clone, Default)]
pub struct Hold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    /// Wait until the held call has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held call proceed
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Faults {
    fail_next: HashMap<CallKind, DomainError>,
    holds: HashMap<CallKind, Hold>,
    offline: bool,
}

/// Memory store with injectable failures
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    faults: Mutex<Faults>,
    writes: Mutex<Vec<Write>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Fail the next call of `kind` with `error`
    pub fn fail_next(&self, kind: CallKind, error: DomainError) {
        self.faults.lock().fail_next.insert(kind, error);
    }

    /// Pause the next call of `kind` until the returned hold is released
    pub fn hold_next(&self, kind: CallKind) -> Hold {
        let hold = Hold::default();
        self.faults.lock().holds.insert(kind, hold.clone());
        hold
    }

    /// Fail every write with `StoreUnavailable` until back online
    pub fn set_offline(&self, offline: bool) {
        self.faults.lock().offline = offline;
    }

    /// Writes received so far, in order
    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }

    async fn before_write(&self, kind: CallKind, write: Write) -> RepoResult<()> {
        self.writes.lock().push(write);

        let hold = self.faults.lock().holds.remove(&kind);
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        let mut faults = self.faults.lock();
        if faults.offline {
            return Err(DomainError::StoreUnavailable("network unreachable".to_string()));
        }
        match faults.fail_next.remove(&kind) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReactionStore for FlakyStore {
    async fn insert_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        self.before_write(CallKind::InsertReaction, Write::InsertReaction(reaction))
            .await?;
        self.inner.insert_reaction(subject, user_id, reaction).await
    }

    async fn delete_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        reaction: ReactionType,
    ) -> RepoResult<()> {
        self.before_write(CallKind::DeleteReaction, Write::DeleteReaction(reaction))
            .await?;
        self.inner.delete_reaction(subject, user_id, reaction).await
    }

    async fn fetch_reaction_counts(&self, subject: &ReactionSubject) -> RepoResult<ReactionCounts> {
        self.inner.fetch_reaction_counts(subject).await
    }

    async fn fetch_user_reaction(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
    ) -> RepoResult<Option<ReactionType>> {
        self.inner.fetch_user_reaction(subject, user_id).await
    }
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn find_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<Option<ContentItem>> {
        self.inner.find_content(kind, id).await
    }

    async fn list_posts(&self, group_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        self.inner.list_posts(group_id).await
    }

    async fn list_comments(&self, post_id: EntityId) -> RepoResult<Vec<ContentItem>> {
        self.inner.list_comments(post_id).await
    }

    async fn create_content(&self, item: &ContentItem) -> RepoResult<()> {
        self.inner.create_content(item).await
    }

    async fn update_content(
        &self,
        kind: ContentKind,
        id: EntityId,
        new_content: &str,
    ) -> RepoResult<DateTime<Utc>> {
        self.before_write(CallKind::UpdateContent, Write::UpdateContent(id))
            .await?;
        self.inner.update_content(kind, id, new_content).await
    }

    async fn delete_content(&self, kind: ContentKind, id: EntityId) -> RepoResult<()> {
        self.before_write(CallKind::DeleteContent, Write::DeleteContent(id))
            .await?;
        self.inner.delete_content(kind, id).await
    }
}
