//! Collaborator traits (ports) - store, change feed, and cache bridge

mod cache;
mod feed;
mod stores;

pub use cache::{CacheBridge, CacheEntry, CacheKey, CachePatch};
pub use feed::{ChangeFeed, FeedSubscription, SubscriptionId};
pub use stores::{ChangePublisher, ContentStore, ReactionStore, RepoResult};
