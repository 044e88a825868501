//! # parley-server
//!
//! Axum HTTP + `WebSocket` relay server.
//!
//! - `GET /` upgrades to a `WebSocket` session; plain requests get the socket URL
//! - Every chat message is moderated, stamped, persisted, then fanned out to
//!   all other connected clients
//! - New sessions receive the full history replay before any live traffic
//! - HTTP endpoints: health check, Prometheus metrics, static username list
//! - Graceful shutdown via `CancellationToken`
//!
//! Blocked messages are dropped without any notice to the sender. There is no
//! error frame in the protocol and none should be added.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::{Result, ServerError};
pub use server::{AppState, RelayServer};
pub use shutdown::ShutdownCoordinator;
pub use websocket::{
    BroadcastCoordinator, ClientConnection, ConnectionRegistry, FrameOutcome,
};
