//! Service context - dependency container for coordinators
//!
//! Holds the stores, the query cache, the change feed and the notifier.

use std::sync::Arc;

use agora_common::EngineConfig;
use agora_core::{CacheBridge, ChangeFeed, ContentStore, ReactionStore};

use super::error::{ServiceError, ServiceResult};
use super::notify::Notifier;

/// Service context containing all dependencies
///
/// Cheap to clone; feed handlers keep their own copy.
#[derive(Clone)]
pub struct ServiceContext {
    // Stores
    reaction_store: Arc<dyn ReactionStore>,
    content_store: Arc<dyn ContentStore>,

    // Client-side cache and push channel
    cache: Arc<dyn CacheBridge>,
    feed: Arc<dyn ChangeFeed>,

    notifier: Notifier,
    engine: EngineConfig,
}

impl ServiceContext {
    // === Stores ===

    /// Get the reaction store
    pub fn reaction_store(&self) -> &dyn ReactionStore {
        self.reaction_store.as_ref()
    }

    /// Get the content store
    pub fn content_store(&self) -> &dyn ContentStore {
        self.content_store.as_ref()
    }

    // === Cache & Feed ===

    /// Get the query cache bridge
    pub fn cache(&self) -> &dyn CacheBridge {
        self.cache.as_ref()
    }

    /// Get the change feed
    pub fn feed(&self) -> &dyn ChangeFeed {
        self.feed.as_ref()
    }

    /// Shared handle on the change feed, for long-lived subscriptions
    pub fn feed_handle(&self) -> Arc<dyn ChangeFeed> {
        Arc::clone(&self.feed)
    }

    // === Notices & Config ===

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("stores", &"...")
            .field("cache", &"CacheBridge")
            .field("feed", &"ChangeFeed")
            .field("notifier", &self.notifier)
            .field("engine", &self.engine)
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    reaction_store: Option<Arc<dyn ReactionStore>>,
    content_store: Option<Arc<dyn ContentStore>>,
    cache: Option<Arc<dyn CacheBridge>>,
    feed: Option<Arc<dyn ChangeFeed>>,
    notifier: Option<Notifier>,
    engine: Option<EngineConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reaction_store(mut self, store: Arc<dyn ReactionStore>) -> Self {
        self.reaction_store = Some(store);
        self
    }

    pub fn content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content_store = Some(store);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheBridge>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn feed(mut self, feed: Arc<dyn ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Use an existing notifier instead of a fresh one
    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the ServiceContext
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let engine = self.engine.unwrap_or_default();
        let notifier = self
            .notifier
            .unwrap_or_else(|| Notifier::new(engine.notice_buffer));

        Ok(ServiceContext {
            reaction_store: self
                .reaction_store
                .ok_or_else(|| ServiceError::validation("reaction_store is required"))?,
            content_store: self
                .content_store
                .ok_or_else(|| ServiceError::validation("content_store is required"))?,
            cache: self
                .cache
                .ok_or_else(|| ServiceError::validation("cache is required"))?,
            feed: self
                .feed
                .ok_or_else(|| ServiceError::validation("feed is required"))?,
            notifier,
            engine,
        })
    }
}
