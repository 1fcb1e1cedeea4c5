//! Reaction service
//!
//! Optimistic toggling of a user's reaction on a post or comment. The view
//! moves first, the store follows, and a failed write puts the view back
//! exactly where it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agora_core::{
    CacheEntry, CacheKey, EdgeOp, EntityId, ReactionSubject, ReactionType, ReactionViewState,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// What a toggle request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The store accepted every write; the confirmed view state
    Applied(ReactionViewState),
    /// No signed-in user; nothing happened
    Unauthenticated,
    /// A previous toggle on this subject is still in flight
    Busy,
    /// The view went away; nothing was applied to it
    Unmounted,
}

#[derive(Debug)]
struct HandleState {
    view: ReactionViewState,
    /// Bumped by every toggle so a refresh can spot writes it raced with
    generation: u64,
}

/// One mounted set of reaction controls for a subject
///
/// Holds the displayed state. Shared between the caller and feed handlers;
/// once unmounted nothing is written to it again.
#[derive(Debug)]
pub struct SubjectHandle {
    subject: ReactionSubject,
    user_id: Option<EntityId>,
    state: Mutex<HandleState>,
    mounted: AtomicBool,
}

impl SubjectHandle {
    fn new(subject: ReactionSubject, user_id: Option<EntityId>, view: ReactionViewState) -> Self {
        Self {
            subject,
            user_id,
            state: Mutex::new(HandleState {
                view,
                generation: 0,
            }),
            mounted: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn subject(&self) -> ReactionSubject {
        self.subject
    }

    #[inline]
    pub fn user_id(&self) -> Option<EntityId> {
        self.user_id
    }

    /// Copy of the displayed state
    pub fn view(&self) -> ReactionViewState {
        self.state.lock().view.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Detach the view; in-flight writes finish but never touch it again
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::Reactions(self.subject)
    }
}

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    /// Create a new ReactionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load counts and the user's reaction and mount a handle for them
    #[instrument(skip(self))]
    pub async fn mount(
        &self,
        subject: ReactionSubject,
        user_id: Option<EntityId>,
    ) -> ServiceResult<Arc<SubjectHandle>> {
        let view = self.fetch_view(subject, user_id).await?;
        self.ctx
            .cache()
            .put(CacheKey::Reactions(subject), CacheEntry::Reactions(view.clone()));

        debug!(subject = %subject, "Reaction controls mounted");

        Ok(Arc::new(SubjectHandle::new(subject, user_id, view)))
    }

    /// Toggle `requested` for the handle's user
    ///
    /// Clicking the active reaction removes it; clicking another one swaps
    /// (delete then insert). On any store failure the view and cache are
    /// restored to their pre-toggle state and an error notice is sent.
    #[instrument(skip(self, handle), fields(subject = %handle.subject))]
    pub async fn toggle(
        &self,
        handle: &SubjectHandle,
        requested: ReactionType,
    ) -> ServiceResult<ToggleOutcome> {
        if !handle.is_mounted() {
            return Ok(ToggleOutcome::Unmounted);
        }
        let Some(user_id) = handle.user_id else {
            debug!("Toggle without a signed-in user ignored");
            return Ok(ToggleOutcome::Unauthenticated);
        };

        let (snapshot, ops, optimistic) = {
            let mut state = handle.state.lock();
            if state.view.is_submitting() {
                debug!("Toggle ignored while a write is in flight");
                return Ok(ToggleOutcome::Busy);
            }

            let transition = state.view.compute_toggle(requested)?;
            let snapshot = state.view.clone();
            let optimistic = transition.next.clone();

            state.view = transition.next;
            state.view.mark_submitting(&transition.ops);
            state.generation += 1;

            (snapshot, transition.ops, optimistic)
        };

        let key = handle.cache_key();
        self.ctx.cache().patch_optimistically(
            &key,
            Box::new(move |_| Some(CacheEntry::Reactions(optimistic))),
        );

        let mut completed = 0;
        let mut failure = None;
        for op in &ops {
            match self.apply_op(&handle.subject, user_id, *op).await {
                Ok(()) => completed += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            None => {
                self.ctx.cache().settle(&[key]);

                let mut state = handle.state.lock();
                state.view.clear_submitting();
                if !handle.is_mounted() {
                    return Ok(ToggleOutcome::Unmounted);
                }

                info!(
                    reaction = %requested,
                    active = ?state.view.user_active(),
                    "Reaction toggled"
                );
                Ok(ToggleOutcome::Applied(state.view.clone()))
            }
            Some(err) => {
                {
                    let mut state = handle.state.lock();
                    if handle.is_mounted() {
                        state.view = snapshot;
                    } else {
                        state.view.clear_submitting();
                    }
                }

                self.ctx.cache().rollback(&[key]);
                if completed > 0 {
                    // The store kept part of the swap; refetch on next read
                    self.ctx.cache().invalidate(&key);
                }

                warn!(
                    reaction = %requested,
                    completed_ops = completed,
                    error = %err,
                    "Reaction toggle failed, rolled back"
                );

                let err = ServiceError::from(err);
                self.ctx.notifier().report(&err);
                Err(err)
            }
        }
    }

    /// Overwrite the view with server truth
    ///
    /// Skipped while a write is in flight or if a toggle started during the
    /// fetch. Returns `true` if the view had diverged and was corrected.
    #[instrument(skip(self, handle), fields(subject = %handle.subject))]
    pub async fn refresh(&self, handle: &SubjectHandle) -> ServiceResult<bool> {
        if !handle.is_mounted() {
            return Ok(false);
        }
        let generation = handle.state.lock().generation;

        let server = self.fetch_view(handle.subject, handle.user_id).await?;

        let mut state = handle.state.lock();
        if !handle.is_mounted() || state.view.is_submitting() || state.generation != generation {
            debug!("Refresh skipped, local write pending");
            return Ok(false);
        }

        let diverged = state
            .view
            .overwrite_with(server.counts().clone(), server.user_active());
        self.ctx.cache().put(
            handle.cache_key(),
            CacheEntry::Reactions(state.view.clone()),
        );

        if diverged {
            info!("Stale reaction state replaced with server truth");
        }
        Ok(diverged)
    }

    async fn fetch_view(
        &self,
        subject: ReactionSubject,
        user_id: Option<EntityId>,
    ) -> ServiceResult<ReactionViewState> {
        let store = self.ctx.reaction_store();
        let counts = store.fetch_reaction_counts(&subject).await?;
        let active = match user_id {
            Some(user_id) => store.fetch_user_reaction(&subject, user_id).await?,
            None => None,
        };

        Ok(ReactionViewState::initialize(subject.kind, counts, active))
    }

    async fn apply_op(
        &self,
        subject: &ReactionSubject,
        user_id: EntityId,
        op: EdgeOp,
    ) -> Result<(), agora_core::DomainError> {
        let store = self.ctx.reaction_store();
        match op {
            EdgeOp::Delete(reaction) => store.delete_reaction(subject, user_id, reaction).await,
            EdgeOp::Insert(reaction) => store.insert_reaction(subject, user_id, reaction).await,
        }
    }
}
