//! # agora-db
//!
//! Store layer implementing the reaction and content store traits.
//!
//! ## Overview
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Model ↔ entity mappers
//! - PostgreSQL store implementations
//! - An in-memory store with the same semantics for offline use and tests
//!
//! Both stores can push their committed writes into a `ChangePublisher`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agora_db::{create_pool, run_migrations, PgReactionStore};
//!
//! async fn example(config: &DatabaseConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(config).await?;
//!     run_migrations(&pool).await?;
//!     let reactions = PgReactionStore::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations, PgPool, PoolError};
pub use repositories::{PgContentStore, PgReactionStore};
