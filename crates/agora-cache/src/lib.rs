//! # agora-cache
//!
//! In-process mirrors of the remote store.
//!
//! ## Features
//!
//! - **Query Cache**: Read-through cache with optimistic patch layers that can
//!   be settled or rolled back per key
//! - **Change Feed**: Topic hub on `tokio::sync::broadcast` that stores publish
//!   their committed writes into
//!
//! ## Example
//!
//! ```ignore
//! use agora_cache::{LocalChangeFeed, QueryCache};
//!
//! let cache = QueryCache::shared();
//! let feed = LocalChangeFeed::shared(256);
//!
//! let sub = feed.subscribe(&FeedTopic::post_comments(post_id)).await?;
//! cache.patch_optimistically(&key, Box::new(|entry| entry));
//! cache.rollback(&[key]);
//! ```

pub mod feed;
pub mod query;

pub use feed::{FeedConfig, LocalChangeFeed};
pub use query::QueryCache;
