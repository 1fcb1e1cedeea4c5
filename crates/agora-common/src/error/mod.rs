//! Application error types and user-facing notices

mod app_error;

pub use app_error::{AppError, AppResult, Notice, NoticeLevel};
