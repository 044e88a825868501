//! # parley-core
//!
//! Shared vocabulary for the parley broadcast relay.
//!
//! - **Wire types**: [`ChatMessage`] with typed known fields plus an opaque
//!   passthrough bag, and [`InboundFrame`] produced by [`parse_frame`]
//! - **IDs**: [`ConnectionId`] as a newtype over a UUID v7 string
//! - **Errors**: [`FrameError`] for payloads that cannot be handled
//! - **Logging**: `tracing` subscriber bootstrap and a capture layer for tests

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod logging;
pub mod message;

pub use errors::FrameError;
pub use ids::ConnectionId;
pub use message::{CHAT_MESSAGE_TYPE, ChatMessage, InboundFrame, parse_frame};
