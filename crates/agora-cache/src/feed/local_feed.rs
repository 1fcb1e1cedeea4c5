//! In-process change feed.
//!
//! One `broadcast` channel per topic name. Subscriptions are streams over a
//! receiver that end when `unsubscribe` fires their stop signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agora_core::{
    ChangeEvent, ChangeFeed, ChangePublisher, FeedSubscription, FeedTopic, RepoResult,
    SubscriptionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tokio::sync::{broadcast, oneshot};

/// Change feed configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Per-topic channel buffer; slow subscribers past this lag and skip events
    pub buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { buffer: 256 }
    }
}

/// Topic hub on `tokio::sync::broadcast`
pub struct LocalChangeFeed {
    config: FeedConfig,
    topics: DashMap<String, broadcast::Sender<ChangeEvent>>,
    /// Stop signals of live subscriptions
    subscriptions: DashMap<SubscriptionId, (String, oneshot::Sender<()>)>,
    next_id: AtomicU64,
}

impl LocalChangeFeed {
    /// Create a new feed
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config: FeedConfig {
                buffer: config.buffer.max(1),
            },
            topics: DashMap::new(),
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a feed behind an `Arc` with the given per-topic buffer
    #[must_use]
    pub fn shared(buffer: usize) -> Arc<Self> {
        Arc::new(Self::new(FeedConfig { buffer }))
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Number of live subscriptions on one topic
    pub fn topic_subscription_count(&self, topic: &FeedTopic) -> usize {
        let name = topic.name();
        self.subscriptions
            .iter()
            .filter(|entry| entry.value().0 == name)
            .count()
    }

    fn sender(&self, name: &str) -> broadcast::Sender<ChangeEvent> {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.config.buffer).0)
            .clone()
    }

    /// Drop topic channels nobody listens on
    ///
    /// The check runs under the topic entry lock, so a concurrent `subscribe`
    /// either is seen here or gets a fresh sender after the removal.
    fn prune(&self, name: &str) {
        self.topics.remove_if(name, |_, _| {
            !self.subscriptions.iter().any(|entry| entry.value().0 == name)
        });
    }

    /// Whether a topic currently has a channel
    pub fn has_topic(&self, topic: &FeedTopic) -> bool {
        self.topics.contains_key(&topic.name())
    }
}

impl Default for LocalChangeFeed {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}

#[async_trait]
impl ChangeFeed for LocalChangeFeed {
    async fn subscribe(&self, topic: &FeedTopic) -> RepoResult<FeedSubscription> {
        let name = topic.name();
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (stop_tx, stop_rx) = oneshot::channel();
        self.subscriptions.insert(id, (name.clone(), stop_tx));
        let receiver = self.sender(&name).subscribe();

        let topic_name = name.clone();
        let events = stream::unfold(receiver, move |mut receiver| {
            let topic_name = topic_name.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) => return Some((event, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                topic = %topic_name,
                                skipped = skipped,
                                "Change feed subscriber lagged"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
        .take_until(stop_rx)
        .boxed();

        tracing::debug!(topic = %name, subscription = %id, "Subscribed to topic");

        Ok(FeedSubscription {
            id,
            topic: topic.clone(),
            events,
        })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> RepoResult<()> {
        if let Some((_, (name, stop_tx))) = self.subscriptions.remove(&id) {
            // The stream may already be gone
            let _ = stop_tx.send(());
            self.prune(&name);
            tracing::debug!(topic = %name, subscription = %id, "Unsubscribed from topic");
        }
        Ok(())
    }
}

impl ChangePublisher for LocalChangeFeed {
    fn publish(&self, event: ChangeEvent) {
        let name = event.topic.name();
        let Some(sender) = self.topics.get(&name).map(|s| s.value().clone()) else {
            tracing::trace!(topic = %name, "No subscribers, change dropped");
            return;
        };

        match sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(topic = %name, receivers = receivers, "Published change");
            }
            Err(_) => {
                tracing::trace!(topic = %name, "No receivers, change dropped");
            }
        }
    }
}
