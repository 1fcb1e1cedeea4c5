//! Live subscriptions
//!
//! Keeps change-feed subscriptions for mounted views and routes each event
//! to a [`ChangeHandler`]. While the app is hidden no subscription is held;
//! becoming visible re-creates all of them and runs every resync hook, since
//! events sent in between were missed.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agora_core::{ChangeEvent, ChangeFeed, ChangeKind, FeedTopic, SubscriptionId};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::content::{ContentBoard, ContentService};
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::reaction::{ReactionService, SubjectHandle};

/// Reacts to pushed changes on one topic
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn on_insert(&self, _event: &ChangeEvent) {}

    async fn on_update(&self, _event: &ChangeEvent) {}

    async fn on_delete(&self, _event: &ChangeEvent) {}

    /// Called after the subscription was re-created; refetch everything
    async fn on_resync(&self) {}
}

/// Identifies a registered watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Whether the app is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

struct Attached {
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

struct Watch {
    topic: FeedTopic,
    handler: Arc<dyn ChangeHandler>,
    attached: Option<Attached>,
}

struct Registry {
    watches: HashMap<WatchId, Watch>,
    visibility: Visibility,
}

/// Subscription manager for mounted views
pub struct LiveSubscriptions {
    feed: Arc<dyn ChangeFeed>,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl LiveSubscriptions {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            registry: Mutex::new(Registry {
                watches: HashMap::new(),
                visibility: Visibility::Visible,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Manager on the context's feed
    pub fn for_context(ctx: &ServiceContext) -> Self {
        Self::new(ctx.feed_handle())
    }

    /// Route changes on `topic` to `handler` until torn down
    #[instrument(skip(self, handler))]
    pub async fn subscribe(
        &self,
        topic: FeedTopic,
        handler: Arc<dyn ChangeHandler>,
    ) -> ServiceResult<WatchId> {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.registry.lock().await;

        let attached = if registry.visibility == Visibility::Visible {
            Some(self.attach(&topic, Arc::clone(&handler)).await?)
        } else {
            None
        };

        registry.watches.insert(
            id,
            Watch {
                topic,
                handler,
                attached,
            },
        );
        debug!(watch = %id, "Watch registered");

        Ok(id)
    }

    /// Keep a reaction handle in sync with pushed changes
    pub async fn watch_reactions(
        &self,
        ctx: &ServiceContext,
        handle: Arc<SubjectHandle>,
    ) -> ServiceResult<WatchId> {
        let topic = FeedTopic::reactions(handle.subject());
        let handler = ReactionRefresher {
            ctx: ctx.clone(),
            handle,
        };
        self.subscribe(topic, Arc::new(handler)).await
    }

    /// Keep a content board in sync with pushed changes
    pub async fn watch_board(
        &self,
        ctx: &ServiceContext,
        board: Arc<ContentBoard>,
    ) -> ServiceResult<WatchId> {
        let topic = board.scope().topic();
        let handler = BoardRefresher {
            ctx: ctx.clone(),
            board,
        };
        self.subscribe(topic, Arc::new(handler)).await
    }

    /// Stop routing changes for one watch
    ///
    /// Returns `false` for an unknown id.
    pub async fn teardown(&self, id: WatchId) -> bool {
        let watch = self.registry.lock().await.watches.remove(&id);
        match watch {
            Some(mut watch) => {
                if let Some(attached) = watch.attached.take() {
                    self.detach(attached).await;
                }
                debug!(watch = %id, topic = %watch.topic, "Watch torn down");
                true
            }
            None => false,
        }
    }

    pub async fn teardown_all(&self) {
        let watches: Vec<Watch> = {
            let mut registry = self.registry.lock().await;
            registry.watches.drain().map(|(_, watch)| watch).collect()
        };
        for mut watch in watches {
            if let Some(attached) = watch.attached.take() {
                self.detach(attached).await;
            }
        }
    }

    /// Follow app visibility
    ///
    /// Going hidden drops every subscription. Becoming visible tears down
    /// and re-creates every subscription, then runs each handler's resync.
    #[instrument(skip(self))]
    pub async fn set_visibility(&self, visibility: Visibility) -> ServiceResult<()> {
        let mut registry = self.registry.lock().await;
        registry.visibility = visibility;

        for watch in registry.watches.values_mut() {
            if let Some(attached) = watch.attached.take() {
                self.detach(attached).await;
            }
        }

        if visibility == Visibility::Hidden {
            info!(watches = registry.watches.len(), "Hidden, subscriptions released");
            return Ok(());
        }

        let mut resync = Vec::with_capacity(registry.watches.len());
        for watch in registry.watches.values_mut() {
            watch.attached = Some(self.attach(&watch.topic, Arc::clone(&watch.handler)).await?);
            resync.push(Arc::clone(&watch.handler));
        }
        info!(watches = resync.len(), "Visible, subscriptions re-created");
        drop(registry);

        for handler in resync {
            handler.on_resync().await;
        }
        Ok(())
    }

    pub async fn visibility(&self) -> Visibility {
        self.registry.lock().await.visibility
    }

    /// Registered watches, attached or not
    pub async fn watch_count(&self) -> usize {
        self.registry.lock().await.watches.len()
    }

    /// Watches currently holding a feed subscription
    pub async fn attached_count(&self) -> usize {
        self.registry
            .lock()
            .await
            .watches
            .values()
            .filter(|w| w.attached.is_some())
            .count()
    }

    async fn attach(
        &self,
        topic: &FeedTopic,
        handler: Arc<dyn ChangeHandler>,
    ) -> ServiceResult<Attached> {
        let subscription = self.feed.subscribe(topic).await?;
        let mut events = subscription.events;
        let topic_name = topic.name();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event.kind {
                    ChangeKind::Insert => handler.on_insert(&event).await,
                    ChangeKind::Update => handler.on_update(&event).await,
                    ChangeKind::Delete => handler.on_delete(&event).await,
                }
            }
            debug!(topic = %topic_name, "Change stream ended");
        });

        Ok(Attached {
            subscription: subscription.id,
            task,
        })
    }

    async fn detach(&self, attached: Attached) {
        attached.task.abort();
        if let Err(e) = self.feed.unsubscribe(attached.subscription).await {
            warn!(subscription = %attached.subscription, error = %e, "Unsubscribe failed");
        }
    }
}

impl fmt::Debug for LiveSubscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSubscriptions")
            .field("feed", &"ChangeFeed")
            .finish()
    }
}

/// Refetches a subject's reactions on any change to them
struct ReactionRefresher {
    ctx: ServiceContext,
    handle: Arc<SubjectHandle>,
}

impl ReactionRefresher {
    async fn refresh(&self) {
        if let Err(e) = ReactionService::new(&self.ctx).refresh(&self.handle).await {
            warn!(subject = %self.handle.subject(), error = %e, "Reaction refresh failed");
        }
    }
}

#[async_trait]
impl ChangeHandler for ReactionRefresher {
    async fn on_insert(&self, _event: &ChangeEvent) {
        self.refresh().await;
    }

    async fn on_update(&self, _event: &ChangeEvent) {
        self.refresh().await;
    }

    async fn on_delete(&self, _event: &ChangeEvent) {
        self.refresh().await;
    }

    async fn on_resync(&self) {
        self.refresh().await;
    }
}

/// Reloads a board's list on any change to it
struct BoardRefresher {
    ctx: ServiceContext,
    board: Arc<ContentBoard>,
}

impl BoardRefresher {
    async fn reload(&self) {
        if let Err(e) = ContentService::new(&self.ctx).reload(&self.board).await {
            warn!(scope = ?self.board.scope(), error = %e, "Board reload failed");
        }
    }
}

#[async_trait]
impl ChangeHandler for BoardRefresher {
    async fn on_insert(&self, _event: &ChangeEvent) {
        self.reload().await;
    }

    async fn on_update(&self, _event: &ChangeEvent) {
        self.reload().await;
    }

    async fn on_delete(&self, _event: &ChangeEvent) {
        self.reload().await;
    }

    async fn on_resync(&self) {
        self.reload().await;
    }
}
