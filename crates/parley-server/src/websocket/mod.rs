//! WebSocket sessions, the live connection set, and the message pipeline.

pub mod connection;
pub mod coordinator;
pub mod registry;
pub mod session;

pub use connection::ClientConnection;
pub use coordinator::{BroadcastCoordinator, FrameOutcome};
pub use registry::ConnectionRegistry;
pub use session::run_ws_session;
