//! Wiring of stores, cache and change feed from configuration

use std::sync::Arc;

use agora_cache::{LocalChangeFeed, QueryCache};
use agora_common::{AppConfig, AppError, StoreBackend};
use agora_core::{ChangePublisher, ContentStore, ReactionStore};
use agora_db::{create_pool, run_migrations, MemoryStore, PgContentStore, PgReactionStore};
use tracing::info;

use crate::services::{ServiceContext, ServiceContextBuilder, ServiceResult};

/// Build a service context for the configured store backend
///
/// Writes of either backend are pushed into one in-process change feed.
pub async fn build_context(config: &AppConfig) -> ServiceResult<ServiceContext> {
    let feed = LocalChangeFeed::shared(config.engine.feed_buffer);
    let publisher: Arc<dyn ChangePublisher> = feed.clone();

    let (reactions, content): (Arc<dyn ReactionStore>, Arc<dyn ContentStore>) = match config.store {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new().with_publisher(publisher));
            info!("Using in-memory store");
            let reactions: Arc<dyn ReactionStore> = store.clone();
            let content: Arc<dyn ContentStore> = store;
            (reactions, content)
        }
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .ok_or_else(|| AppError::Config("DATABASE_URL is required".to_string()))?;

            let pool = create_pool(database).await.map_err(AppError::internal)?;
            run_migrations(&pool).await.map_err(AppError::internal)?;
            info!(max_connections = database.max_connections, "Database ready");

            let reactions: Arc<dyn ReactionStore> =
                Arc::new(PgReactionStore::new(pool.clone()).with_publisher(Arc::clone(&publisher)));
            let content: Arc<dyn ContentStore> =
                Arc::new(PgContentStore::new(pool).with_publisher(publisher));
            (reactions, content)
        }
    };

    ServiceContextBuilder::new()
        .reaction_store(reactions)
        .content_store(content)
        .cache(QueryCache::shared())
        .feed(feed)
        .engine(config.engine.clone())
        .build()
}
