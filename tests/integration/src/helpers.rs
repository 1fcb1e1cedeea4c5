//! Test harness
//!
//! [`TestApp`] builds a service context over a [`FlakyStore`], the real
//! query cache and the in-process change feed.

use std::sync::Arc;
use std::time::Duration;

use agora_cache::{LocalChangeFeed, QueryCache};
use agora_common::{EngineConfig, Notice};
use agora_core::{ChangePublisher, ContentItem, ContentStore, EntityId};
use agora_db::MemoryStore;
use agora_service::{LiveSubscriptions, ServiceContext, ServiceContextBuilder};
use anyhow::Result;
use tokio::sync::broadcast;

use crate::fixtures::FlakyStore;

/// Install a test subscriber once; later calls are no-ops
pub fn init_test_tracing() {
    let _ = agora_common::try_init_tracing();
}

/// A fully wired engine over an in-memory store
pub struct TestApp {
    pub ctx: ServiceContext,
    pub store: Arc<FlakyStore>,
    pub cache: Arc<QueryCache>,
    pub feed: Arc<LocalChangeFeed>,
    pub notices: broadcast::Receiver<Notice>,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_engine(EngineConfig::default())
    }

    pub fn with_engine(engine: EngineConfig) -> Result<Self> {
        init_test_tracing();

        let feed = LocalChangeFeed::shared(engine.feed_buffer);
        let publisher: Arc<dyn ChangePublisher> = feed.clone();
        let memory = Arc::new(MemoryStore::new().with_publisher(publisher));
        let store = Arc::new(FlakyStore::new(memory));
        let cache = QueryCache::shared();

        let ctx = ServiceContextBuilder::new()
            .reaction_store(store.clone())
            .content_store(store.clone())
            .cache(cache.clone())
            .feed(feed.clone())
            .engine(engine)
            .build()?;
        let notices = ctx.notifier().subscribe();

        Ok(Self {
            ctx,
            store,
            cache,
            feed,
            notices,
        })
    }

    pub fn subscriptions(&self) -> LiveSubscriptions {
        LiveSubscriptions::for_context(&self.ctx)
    }

    /// Store a post directly, bypassing the coordinators
    pub async fn seed_post(&self, group_id: EntityId, author_id: EntityId, content: &str) -> ContentItem {
        let post = ContentItem::new_post(EntityId::generate(), group_id, author_id, content.to_string());
        self.store
            .inner()
            .create_content(&post)
            .await
            .expect("seed post");
        post
    }

    pub async fn seed_comment(&self, post_id: EntityId, author_id: EntityId, content: &str) -> ContentItem {
        let comment = ContentItem::new_comment(EntityId::generate(), post_id, author_id, content.to_string());
        self.store
            .inner()
            .create_content(&comment)
            .await
            .expect("seed comment");
        comment
    }

    /// Next notice, failing the test if none arrives
    pub async fn next_notice(&mut self) -> Notice {
        tokio::time::timeout(Duration::from_secs(1), self.notices.recv())
            .await
            .expect("no notice within 1s")
            .expect("notice channel closed")
    }

    pub fn assert_no_notice(&mut self) {
        assert!(self.notices.try_recv().is_err(), "unexpected notice");
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
