//! Coordinators and their shared dependency container

pub mod content;
pub mod context;
pub mod error;
pub mod notify;
pub mod reaction;
pub mod sync;

pub use content::{BoardScope, ContentBoard, ContentService, DeleteOutcome, EditOutcome, SaveOutcome};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use notify::Notifier;
pub use reaction::{ReactionService, SubjectHandle, ToggleOutcome};
pub use sync::{ChangeHandler, LiveSubscriptions, Visibility, WatchId};
