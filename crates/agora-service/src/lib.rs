//! # agora-service
//!
//! Application layer: the optimistic reaction coordinator, the edit/delete
//! lifecycle of posts and comments, and live change-feed subscriptions.

pub mod bootstrap;
pub mod dto;
pub mod services;

pub use bootstrap::build_context;
pub use services::{
    ContentBoard, ContentService, LiveSubscriptions, Notifier, ReactionService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, SubjectHandle, ToggleOutcome,
};
