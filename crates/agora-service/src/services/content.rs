//! Content service
//!
//! Edit and delete lifecycle of posts and comments. Saves and deletes are
//! pessimistic: the board only changes after the store confirms.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agora_core::{
    CacheEntry, CacheKey, ContentItem, ContentKind, DomainError, EditSession, EntityId, FeedTopic,
    ReactionSubject, SaveDecision,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::CreateContentRequest;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Which list a board shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardScope {
    /// Posts of a group, newest first
    GroupPosts(EntityId),
    /// Comments under a post, oldest first
    PostComments(EntityId),
}

impl BoardScope {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::GroupPosts(_) => ContentKind::Post,
            Self::PostComments(_) => ContentKind::Comment,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        match self {
            Self::GroupPosts(group) => CacheKey::PostList(*group),
            Self::PostComments(post) => CacheKey::CommentList(*post),
        }
    }

    /// Feed topic carrying changes to this list
    pub fn topic(&self) -> FeedTopic {
        match self {
            Self::GroupPosts(group) => FeedTopic::group_posts(*group),
            Self::PostComments(post) => FeedTopic::post_comments(*post),
        }
    }
}

/// Result of start/update/cancel on an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// A save is in flight
    Busy,
    NotEditing,
    Unmounted,
}

/// Result of `ContentService::save`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written and confirmed; the updated item
    Saved(ContentItem),
    /// Draft matched the original; editor closed without a write
    Unchanged,
    /// Draft failed validation; the editor stays open
    Rejected(DomainError),
    Busy,
    NotEditing,
    /// The board went away during the write
    Unmounted,
}

/// Result of `ContentService::delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// A delete of the same item is in flight
    Busy,
    Unmounted,
}

#[derive(Debug, Default)]
struct BoardState {
    items: Vec<ContentItem>,
    session: Option<EditSession>,
    deleting: HashSet<EntityId>,
}

/// A mounted list of posts or comments with at most one open editor
#[derive(Debug)]
pub struct ContentBoard {
    scope: BoardScope,
    viewer: Option<EntityId>,
    state: Mutex<BoardState>,
    mounted: AtomicBool,
}

impl ContentBoard {
    fn new(scope: BoardScope, viewer: Option<EntityId>, items: Vec<ContentItem>) -> Self {
        Self {
            scope,
            viewer,
            state: Mutex::new(BoardState {
                items,
                ..BoardState::default()
            }),
            mounted: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn scope(&self) -> BoardScope {
        self.scope
    }

    #[inline]
    pub fn viewer(&self) -> Option<EntityId> {
        self.viewer
    }

    /// Copy of the displayed items
    pub fn items(&self) -> Vec<ContentItem> {
        self.state.lock().items.clone()
    }

    pub fn item(&self, id: EntityId) -> Option<ContentItem> {
        self.state.lock().items.iter().find(|i| i.id == id).cloned()
    }

    /// Copy of the open edit session
    pub fn session(&self) -> Option<EditSession> {
        self.state.lock().session.clone()
    }

    pub fn is_editing(&self, id: EntityId) -> bool {
        self.state
            .lock()
            .session
            .as_ref()
            .is_some_and(|s| s.item_id == id)
    }

    pub fn is_deleting(&self, id: EntityId) -> bool {
        self.state.lock().deleting.contains(&id)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Detach the board; writes already sent still complete
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

/// Content service
pub struct ContentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ContentService<'a> {
    /// Create a new ContentService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load a list and mount a board for it
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        scope: BoardScope,
        viewer: Option<EntityId>,
    ) -> ServiceResult<Arc<ContentBoard>> {
        let items = self.fetch(scope).await?;
        self.ctx
            .cache()
            .put(scope.cache_key(), CacheEntry::Items(items.clone()));

        Ok(Arc::new(ContentBoard::new(scope, viewer, items)))
    }

    /// Refetch the board's list
    ///
    /// An open editor survives as long as its item does. Its draft is never
    /// replaced by server content.
    #[instrument(skip(self, board), fields(scope = ?board.scope))]
    pub async fn reload(&self, board: &ContentBoard) -> ServiceResult<()> {
        if !board.is_mounted() {
            return Ok(());
        }
        let items = self.fetch(board.scope).await?;
        self.ctx
            .cache()
            .put(board.scope.cache_key(), CacheEntry::Items(items.clone()));

        let mut state = board.state.lock();
        let orphaned = state
            .session
            .as_ref()
            .filter(|s| !s.is_submitting() && !items.iter().any(|i| i.id == s.item_id))
            .map(|s| s.item_id);
        if let Some(item_id) = orphaned {
            info!(item_id = %item_id, "Edited item disappeared, closing editor");
            state.session = None;
        }
        state.items = items;
        Ok(())
    }

    /// Create a post in a group
    #[instrument(skip(self, request))]
    pub async fn create_post(
        &self,
        author_id: Option<EntityId>,
        group_id: EntityId,
        request: CreateContentRequest,
    ) -> ServiceResult<ContentItem> {
        let author_id = author_id.ok_or(DomainError::Unauthenticated)?;
        let content = self.validated_content(&request)?;
        let item = ContentItem::new_post(EntityId::generate(), group_id, author_id, content);
        self.create(item).await
    }

    /// Create a comment under a post
    #[instrument(skip(self, request))]
    pub async fn create_comment(
        &self,
        author_id: Option<EntityId>,
        post_id: EntityId,
        request: CreateContentRequest,
    ) -> ServiceResult<ContentItem> {
        let author_id = author_id.ok_or(DomainError::Unauthenticated)?;
        let content = self.validated_content(&request)?;
        let item = ContentItem::new_comment(EntityId::generate(), post_id, author_id, content);
        self.create(item).await
    }

    /// Open the editor on an item, seeded with its current content
    ///
    /// Replaces any other open editor unless that one is saving.
    #[instrument(skip(self, board))]
    pub fn start_editing(&self, board: &ContentBoard, item_id: EntityId) -> ServiceResult<EditOutcome> {
        if !board.is_mounted() {
            return Ok(EditOutcome::Unmounted);
        }

        let mut state = board.state.lock();
        if state.session.as_ref().is_some_and(EditSession::is_submitting) {
            return Ok(EditOutcome::Busy);
        }

        let item = state
            .items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::content_not_found(board.scope.kind(), item_id))?;
        self.require_author(board, item)?;

        let session = EditSession::start(item.id, item.kind, item.content.clone());
        if let Some(previous) = state.session.replace(session) {
            debug!(previous = %previous.item_id, "Replaced open editor");
        }
        Ok(EditOutcome::Applied)
    }

    /// Replace the draft of the open editor
    pub fn update_draft(&self, board: &ContentBoard, draft: impl Into<String>) -> EditOutcome {
        if !board.is_mounted() {
            return EditOutcome::Unmounted;
        }

        let mut state = board.state.lock();
        match state.session.as_mut() {
            None => EditOutcome::NotEditing,
            Some(session) if session.is_submitting() => EditOutcome::Busy,
            Some(session) => {
                session.set_draft(draft);
                EditOutcome::Applied
            }
        }
    }

    /// Close the editor and discard the draft
    pub fn cancel_editing(&self, board: &ContentBoard) -> EditOutcome {
        if !board.is_mounted() {
            return EditOutcome::Unmounted;
        }

        let mut state = board.state.lock();
        match &state.session {
            None => EditOutcome::NotEditing,
            Some(session) if session.is_submitting() => EditOutcome::Busy,
            Some(_) => {
                state.session = None;
                EditOutcome::Applied
            }
        }
    }

    /// Validate and write the draft
    ///
    /// The board keeps showing the old content until the store confirms. A
    /// failed write leaves the editor open with the draft intact.
    #[instrument(skip(self, board), fields(scope = ?board.scope))]
    pub async fn save(&self, board: &ContentBoard) -> ServiceResult<SaveOutcome> {
        if !board.is_mounted() {
            return Ok(SaveOutcome::Unmounted);
        }

        let (item_id, kind, content) = {
            let mut state = board.state.lock();
            let Some(session) = state.session.as_mut() else {
                return Ok(SaveOutcome::NotEditing);
            };
            if session.is_submitting() {
                return Ok(SaveOutcome::Busy);
            }

            match session.prepare_save(self.ctx.engine().max_content_length) {
                Err(reason) => {
                    self.ctx
                        .notifier()
                        .report(&ServiceError::from(reason.clone()));
                    return Ok(SaveOutcome::Rejected(reason));
                }
                Ok(SaveDecision::Unchanged) => {
                    state.session = None;
                    return Ok(SaveOutcome::Unchanged);
                }
                Ok(SaveDecision::Submit(content)) => {
                    session.begin_saving();
                    (session.item_id, session.item_kind, content)
                }
            }
        };

        let result = self
            .ctx
            .content_store()
            .update_content(kind, item_id, &content)
            .await;

        match result {
            Ok(updated_at) => {
                self.ctx.cache().invalidate(&board.scope.cache_key());
                info!(item_id = %item_id, kind = %kind, "Content saved");

                let updated = {
                    let mut state = board.state.lock();
                    if !board.is_mounted() {
                        None
                    } else {
                        if state.session.as_ref().is_some_and(|s| s.item_id == item_id) {
                            state.session = None;
                        }
                        let item = state.items.iter_mut().find(|i| i.id == item_id);
                        Some(item.map(|item| {
                            item.apply_edit(content.clone(), updated_at);
                            item.clone()
                        }))
                    }
                };

                let Some(updated) = updated else {
                    // The item entry may be stale; let the next reader refetch it
                    self.ctx.cache().invalidate(&CacheKey::Item(kind, item_id));
                    return Ok(SaveOutcome::Unmounted);
                };

                let item = updated.ok_or_else(|| ServiceError::not_found("Content", item_id))?;
                self.ctx
                    .cache()
                    .put(CacheKey::item(&item), CacheEntry::Item(item.clone()));
                Ok(SaveOutcome::Saved(item))
            }
            Err(err) => {
                {
                    let mut state = board.state.lock();
                    if board.is_mounted() {
                        if let Some(session) = state.session.as_mut() {
                            if session.item_id == item_id {
                                session.abort_saving();
                            }
                        }
                    }
                }

                warn!(item_id = %item_id, error = %err, "Save failed, draft kept");

                let err = ServiceError::from(err);
                self.ctx.notifier().report(&err);
                Err(err)
            }
        }
    }

    /// Delete an item the viewer authored
    ///
    /// The item stays on the board until the store confirms; comments and
    /// reactions under it go with it.
    #[instrument(skip(self, board), fields(scope = ?board.scope))]
    pub async fn delete(&self, board: &ContentBoard, item_id: EntityId) -> ServiceResult<DeleteOutcome> {
        if !board.is_mounted() {
            return Ok(DeleteOutcome::Unmounted);
        }

        let kind = {
            let mut state = board.state.lock();
            if state.deleting.contains(&item_id) {
                return Ok(DeleteOutcome::Busy);
            }
            let item = state
                .items
                .iter()
                .find(|i| i.id == item_id)
                .ok_or_else(|| DomainError::content_not_found(board.scope.kind(), item_id))?;
            self.require_author(board, item)?;

            let kind = item.kind;
            state.deleting.insert(item_id);
            kind
        };

        let result = self.ctx.content_store().delete_content(kind, item_id).await;

        let applied = {
            let mut state = board.state.lock();
            state.deleting.remove(&item_id);
            let mounted = board.is_mounted();
            if result.is_ok() && mounted {
                state.items.retain(|i| i.id != item_id);
                if state.session.as_ref().is_some_and(|s| s.item_id == item_id) {
                    state.session = None;
                }
            }
            mounted
        };

        match result {
            Ok(()) => {
                let cache = self.ctx.cache();
                cache.invalidate(&board.scope.cache_key());
                cache.invalidate(&CacheKey::Item(kind, item_id));
                cache.invalidate(&CacheKey::Reactions(ReactionSubject::new(item_id, kind)));
                if kind == ContentKind::Post {
                    cache.invalidate(&CacheKey::CommentList(item_id));
                }

                info!(item_id = %item_id, kind = %kind, "Content deleted");

                if applied {
                    Ok(DeleteOutcome::Deleted)
                } else {
                    Ok(DeleteOutcome::Unmounted)
                }
            }
            Err(err) => {
                warn!(item_id = %item_id, error = %err, "Delete failed");

                let err = ServiceError::from(err);
                self.ctx.notifier().report(&err);
                Err(err)
            }
        }
    }

    async fn fetch(&self, scope: BoardScope) -> ServiceResult<Vec<ContentItem>> {
        let store = self.ctx.content_store();
        let items = match scope {
            BoardScope::GroupPosts(group) => store.list_posts(group).await?,
            BoardScope::PostComments(post) => store.list_comments(post).await?,
        };
        Ok(items)
    }

    async fn create(&self, item: ContentItem) -> ServiceResult<ContentItem> {
        self.ctx.content_store().create_content(&item).await?;

        if let Some(list) = CacheKey::list_of(&item) {
            self.ctx.cache().invalidate(&list);
        }
        info!(item_id = %item.id, kind = %item.kind, "Content created");

        Ok(item)
    }

    fn validated_content(&self, request: &CreateContentRequest) -> ServiceResult<String> {
        request.validate()?;

        let content = request.content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let max = self.ctx.engine().max_content_length;
        if content.chars().count() > max {
            return Err(DomainError::ContentTooLong { max }.into());
        }
        Ok(content.to_string())
    }

    fn require_author(&self, board: &ContentBoard, item: &ContentItem) -> ServiceResult<()> {
        let viewer = board.viewer.ok_or(DomainError::Unauthenticated)?;
        if !item.is_authored_by(viewer) {
            return Err(DomainError::NotContentAuthor.into());
        }
        Ok(())
    }
}
