//! Integration test utilities for the engine
//!
//! Wires the coordinators against an in-memory store wrapped in a
//! fault-injecting layer, with the real query cache and change feed.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
