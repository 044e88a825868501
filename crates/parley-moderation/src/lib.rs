//! # parley-moderation
//!
//! Decides whether a chat message may be stored and broadcast.
//!
//! Two independent checks, both must pass:
//! - **Dictionary**: case-insensitive substring match against a built-in
//!   obscenity list extended by the custom blocked-word list
//! - **Heat**: share of the message consumed by matches of any single custom
//!   blocked word must stay below the threshold (60% by default)
//!
//! A blocked message is dropped silently. The sender gets no signal that
//! distinguishes "blocked" from "delivered", and no error frame exists.

#![deny(unsafe_code)]

pub mod dictionary;
pub mod engine;
pub mod errors;
pub mod heat;
pub mod loader;

pub use dictionary::{DEFAULT_OBSCENITIES, Dictionary};
pub use engine::{BlockReason, ModerationEngine, Verdict};
pub use errors::{ModerationError, Result};
pub use heat::{DEFAULT_HEAT_THRESHOLD, HeatPattern, heat};
pub use loader::load_blocked_words;
