//! Local change feed module.
//!
//! Provides publish/subscribe of store changes within one process.

mod local_feed;

pub use local_feed::{FeedConfig, LocalChangeFeed};
