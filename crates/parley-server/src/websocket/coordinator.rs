//! Per-frame message pipeline: parse, moderate, stamp, persist, fan out.
//!
//! One coordinator is shared by every session. It owns the only write path
//! into the history and decides who receives each frame.
//!
//! Ordering:
//! - Frames from one session are handled one at a time, in arrival order,
//!   by that session's read loop.
//! - Accepted messages are stamped, appended and broadcast under a single
//!   ordering lock, so the history order is every client's receive order.
//! - [`BroadcastCoordinator::open`] registers the newcomer and queues its
//!   replay under the same lock: it sees the full snapshot before any live
//!   frame, and never sees a message both in the replay and live.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use parley_core::{ChatMessage, ConnectionId, InboundFrame, parse_frame};
use parley_history::HistoryStore;
use parley_moderation::{BlockReason, ModerationEngine, Verdict};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::connection::ClientConnection;
use super::registry::ConnectionRegistry;
use crate::metrics::{
    FRAMES_MALFORMED_TOTAL, FRAMES_RELAYED_TOTAL, HISTORY_PERSIST_FAILURES_TOTAL,
    MESSAGES_ACCEPTED_TOTAL, MESSAGES_BLOCKED_TOTAL,
};

/// What happened to one inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Unparseable; dropped and logged.
    Malformed {
        /// Classification from [`parley_core::FrameError::kind`].
        kind: &'static str,
    },
    /// Chat message rejected by moderation; dropped without notice.
    Blocked(BlockReason),
    /// Non-chat frame forwarded verbatim.
    Relayed {
        /// Sessions the frame was queued for.
        recipients: usize,
    },
    /// Chat message stamped, stored and broadcast.
    Accepted {
        /// Sessions the message was queued for.
        recipients: usize,
        /// Whether the history file rewrite succeeded.
        persisted: bool,
    },
}

/// Routes frames between the moderation engine, the history and the
/// connection registry.
pub struct BroadcastCoordinator {
    moderation: Arc<ModerationEngine>,
    history: Arc<HistoryStore>,
    registry: Arc<ConnectionRegistry>,
    order: Mutex<()>,
}

impl BroadcastCoordinator {
    /// Wire the pipeline.
    pub fn new(
        moderation: Arc<ModerationEngine>,
        history: Arc<HistoryStore>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            moderation,
            history,
            registry,
            order: Mutex::new(()),
        }
    }

    /// The live connection set.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The chat history.
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Register `connection` and queue the history replay for it alone.
    ///
    /// Each stored record is sent as its own frame, oldest first. Returns
    /// the number of records queued.
    pub async fn open(&self, connection: Arc<ClientConnection>) -> usize {
        let _order = self.order.lock().await;
        self.registry.register(Arc::clone(&connection));

        let mut replayed = 0;
        for record in self.history.snapshot() {
            match record.to_json() {
                Ok(json) => {
                    if connection.send(Arc::from(json)) {
                        replayed += 1;
                    }
                }
                Err(e) => warn!(conn_id = %connection.id, error = %e, "failed to encode history record"),
            }
        }
        replayed
    }

    /// Handle one text frame from `sender`.
    pub async fn handle_frame(&self, sender: &ConnectionId, text: &str) -> FrameOutcome {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn_id = %sender, kind = e.kind(), error = %e, "dropping malformed frame");
                counter!(FRAMES_MALFORMED_TOTAL, "kind" => e.kind()).increment(1);
                return FrameOutcome::Malformed { kind: e.kind() };
            }
        };

        match frame {
            InboundFrame::Chat(message) => self.accept(sender, message).await,
            InboundFrame::Relay(raw) => {
                let payload: Arc<str> = Arc::from(raw);
                let recipients = {
                    let _order = self.order.lock().await;
                    self.registry.broadcast(&payload, Some(sender))
                };
                counter!(FRAMES_RELAYED_TOTAL).increment(1);
                debug!(conn_id = %sender, recipients, "relayed frame");
                FrameOutcome::Relayed { recipients }
            }
        }
    }

    /// Unregister a session. Safe to call more than once.
    pub fn close(&self, id: &ConnectionId) {
        if let Some(conn) = self.registry.unregister(id) {
            conn.mark_closed();
        }
    }

    async fn accept(&self, sender: &ConnectionId, mut message: ChatMessage) -> FrameOutcome {
        if let Verdict::Blocked(reason) = self.moderation.evaluate(&message.message) {
            info!(conn_id = %sender, reason = reason.kind(), "message blocked");
            counter!(MESSAGES_BLOCKED_TOTAL, "reason" => reason.kind()).increment(1);
            return FrameOutcome::Blocked(reason);
        }

        let _order = self.order.lock().await;
        message.stamp(Utc::now());
        let payload: Arc<str> = match message.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(conn_id = %sender, error = %e, "failed to encode accepted message");
                counter!(FRAMES_MALFORMED_TOTAL, "kind" => "unencodable").increment(1);
                return FrameOutcome::Malformed { kind: "unencodable" };
            }
        };

        let persisted = self.persist(message).await;
        let recipients = self.registry.broadcast(&payload, Some(sender));
        counter!(MESSAGES_ACCEPTED_TOTAL).increment(1);
        debug!(conn_id = %sender, recipients, persisted, "message accepted");
        FrameOutcome::Accepted {
            recipients,
            persisted,
        }
    }

    async fn persist(&self, message: ChatMessage) -> bool {
        let history = Arc::clone(&self.history);
        match tokio::task::spawn_blocking(move || history.append(message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(path = ?self.history.path(), error = %e, "failed to persist chat history");
                counter!(HISTORY_PERSIST_FAILURES_TOTAL).increment(1);
                false
            }
            Err(e) => {
                error!(error = %e, "history append task failed");
                counter!(HISTORY_PERSIST_FAILURES_TOTAL).increment(1);
                false
            }
        }
    }
}
