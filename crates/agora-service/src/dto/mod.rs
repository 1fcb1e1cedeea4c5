//! Data transfer objects
//!
//! - Request DTOs with validation for user input
//! - Response DTOs for rendering

pub mod requests;
pub mod responses;

pub use requests::CreateContentRequest;
pub use responses::{ReactionButton, ReactionSummary};
