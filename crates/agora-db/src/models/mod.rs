//! Database models - SQLx-compatible structs for PostgreSQL tables

mod content;
mod reaction;

pub use content::{CommentModel, PostModel};
pub use reaction::{ReactionCountModel, ReactionModel};
