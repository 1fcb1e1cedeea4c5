//! Query cache module.

mod query_cache;

pub use query_cache::QueryCache;
