//! In-memory store for offline mode and tests

mod store;

pub use store::MemoryStore;
