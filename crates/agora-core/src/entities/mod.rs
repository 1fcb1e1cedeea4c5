//! Domain entities - core business objects

mod content;
mod reaction;

pub use content::{ContentItem, ContentKind};
pub use reaction::{ReactionCounts, ReactionEdge, ReactionSubject, ReactionType};
