//! The live connection set and fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use parking_lot::RwLock;
use parley_core::ConnectionId;
use tracing::debug;

use super::connection::ClientConnection;
use crate::metrics::BROADCAST_SKIPPED_TOTAL;

/// Tracks every open session.
///
/// Broadcast copies the recipient list under the read lock and sends after
/// releasing it, so registration and removal never wait on a fan-out.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Visible to the next broadcast.
    pub fn register(&self, connection: Arc<ClientConnection>) {
        let id = connection.id.clone();
        if self.connections.write().insert(id.clone(), connection).is_some() {
            debug!(conn_id = %id, "replaced existing registration");
        }
    }

    /// Remove a connection. Removing an unknown ID is a no-op.
    pub fn unregister(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.write().remove(id)
    }

    /// Send `payload` to every registered connection except `excluding`.
    ///
    /// Connections that are no longer open are skipped without error.
    /// Returns the number of connections the payload was queued for.
    pub fn broadcast(&self, payload: &Arc<str>, excluding: Option<&ConnectionId>) -> usize {
        let recipients: Vec<Arc<ClientConnection>> = self
            .connections
            .read()
            .values()
            .filter(|c| Some(&c.id) != excluding)
            .cloned()
            .collect();

        let mut delivered = 0;
        for conn in recipients {
            if conn.is_open() && conn.send(Arc::clone(payload)) {
                delivered += 1;
            } else {
                debug!(conn_id = %conn.id, "skipping closed connection");
                counter!(BROADCAST_SKIPPED_TOTAL).increment(1);
            }
        }
        delivered
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().contains_key(id)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
