//! Entity to model mappers
//!
//! - `TryFrom<Model> for Entity` / `From<Model> for Entity`: rows to domain objects
//! - `*Insert` structs: entity data prepared for database writes

mod content;
mod reaction;

pub use content::ContentInsert;
pub use reaction::{counts_from_rows, ReactionInsert};
