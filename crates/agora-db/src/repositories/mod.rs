//! Store implementations
//!
//! PostgreSQL implementations of the store traits defined in agora-core.

mod content;
mod error;
mod reaction;

pub use content::PgContentStore;
pub use error::map_db_error;
pub use reaction::PgReactionStore;
