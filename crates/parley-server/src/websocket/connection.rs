//! WebSocket client connection state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parley_core::ConnectionId;
use tokio::sync::mpsc;

/// One live client session.
///
/// Outbound frames go through an unbounded channel to the session's socket
/// writer task. The channel never applies backpressure: a slow reader only
/// grows its own queue.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Peer address at connect time. Diagnostic only.
    pub remote_addr: SocketAddr,
    tx: mpsc::UnboundedSender<Arc<str>>,
    /// When this connection was established.
    pub connected_at: Instant,
    open: AtomicBool,
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new open connection.
    pub fn new(id: ConnectionId, remote_addr: SocketAddr, tx: mpsc::UnboundedSender<Arc<str>>) -> Self {
        Self {
            id,
            remote_addr,
            tx,
            connected_at: Instant::now(),
            open: AtomicBool::new(true),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queue a text frame for the client.
    ///
    /// Returns `false` if the session is closing or its writer is gone, and
    /// increments the dropped message counter.
    pub fn send(&self, payload: Arc<str>) -> bool {
        if self.open.load(Ordering::Acquire) && self.tx.send(payload).is_ok() {
            return true;
        }
        self.open.store(false, Ordering::Release);
        let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
        false
    }

    /// Whether frames can still be delivered.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Stop accepting frames. Idempotent.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Total frames that could not be queued.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("open", &self.is_open())
            .field("dropped_messages", &self.drop_count())
            .finish_non_exhaustive()
    }
}
