//! Change feed trait - push-based insert/update/delete notifications

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::stores::RepoResult;
use crate::events::{ChangeEvent, FeedTopic};

/// Handle identifying one live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live subscription to one topic
///
/// The stream ends after `ChangeFeed::unsubscribe` is called with `id`.
pub struct FeedSubscription {
    pub id: SubscriptionId,
    pub topic: FeedTopic,
    pub events: BoxStream<'static, ChangeEvent>,
}

impl fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Start receiving changes on a topic
    async fn subscribe(&self, topic: &FeedTopic) -> RepoResult<FeedSubscription>;

    /// Stop a subscription; unknown ids are ignored
    async fn unsubscribe(&self, id: SubscriptionId) -> RepoResult<()>;
}
