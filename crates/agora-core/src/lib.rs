//! # agora-core
//!
//! Domain layer containing entities, value objects, the reaction and edit
//! state machines, collaborator traits, and change events.
//! This crate has zero dependencies on infrastructure (database, runtime, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod state;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{ContentItem, ContentKind, ReactionCounts, ReactionEdge, ReactionSubject, ReactionType};
pub use error::DomainError;
pub use events::{ChangeEvent, ChangeKind, ChangeRecord, FeedTopic};
pub use state::{EdgeOp, EditPhase, EditSession, ReactionViewState, SaveDecision, ToggleTransition};
pub use traits::{
    CacheBridge, CacheEntry, CacheKey, CachePatch, ChangeFeed, ChangePublisher, ContentStore,
    FeedSubscription, ReactionStore, RepoResult, SubscriptionId,
};
pub use value_objects::{EntityId, EntityIdParseError, ReactionSet};
