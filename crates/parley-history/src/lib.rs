//! # parley-history
//!
//! Durable, ordered log of accepted chat messages.
//!
//! The log lives in memory and in a single JSON file holding an array of
//! message records. Every append rewrites the whole file, so the file always
//! mirrors the in-memory sequence exactly. Chat volume is low enough that the
//! O(n) write per message does not matter.

#![deny(unsafe_code)]

pub mod errors;
pub mod store;

pub use errors::{HistoryError, Result};
pub use store::HistoryStore;
