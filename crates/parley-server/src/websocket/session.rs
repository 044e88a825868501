//! WebSocket session lifecycle: one connected client from upgrade through
//! disconnect.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use parley_core::ConnectionId;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::connection::ClientConnection;
use super::coordinator::BroadcastCoordinator;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};

/// How long the writer may spend flushing queued frames and the close frame
/// once the session has ended.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Run a WebSocket session for a connected client.
///
/// 1. Registers the client and queues the history replay
/// 2. Forwards queued frames to the socket from a writer task
/// 3. Feeds inbound text frames to the coordinator, in arrival order
/// 4. Unregisters on close, transport error, or shutdown, then lets the
///    writer flush what is already queued and send a close frame
///
/// There is no heartbeat or idle timeout; the session lives until the
/// transport ends it.
#[instrument(skip_all, fields(conn_id = %connection_id, %remote_addr))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    remote_addr: SocketAddr,
    coordinator: Arc<BroadcastCoordinator>,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (send_tx, mut send_rx) = mpsc::unbounded_channel::<Arc<str>>();
    let connection = Arc::new(ClientConnection::new(
        connection_id.clone(),
        remote_addr,
        send_tx,
    ));

    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let replayed = coordinator.open(Arc::clone(&connection)).await;
    debug!(replayed, "history replay queued");

    let closing = CancellationToken::new();
    let writer_closing = closing.clone();
    let outbound_conn = Arc::clone(&connection);
    let mut outbound = tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                biased;
                payload = send_rx.recv() => payload,
                () = writer_closing.cancelled() => None,
            };
            let Some(payload) = payload else { break };
            if ws_tx.send(Message::Text(payload.to_string().into())).await.is_err() {
                outbound_conn.mark_closed();
                return;
            }
        }

        while let Ok(payload) = send_rx.try_recv() {
            if ws_tx.send(Message::Text(payload.to_string().into())).await.is_err() {
                outbound_conn.mark_closed();
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
        outbound_conn.mark_closed();
    });

    loop {
        let next = tokio::select! {
            () = shutdown.cancelled() => {
                debug!("shutdown requested, ending session");
                break;
            }
            next = ws_rx.next() => next,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                debug!(error = %e, "websocket transport error");
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                let _ = coordinator.handle_frame(&connection_id, text.as_str()).await;
            }
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => {
                    let _ = coordinator.handle_frame(&connection_id, text).await;
                }
                Err(_) => info!(len = data.len(), "ignoring non-UTF-8 binary frame"),
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    coordinator.close(&connection_id);
    closing.cancel();
    if timeout(CLOSE_GRACE, &mut outbound).await.is_err() {
        debug!("writer did not finish within the close grace period");
        outbound.abort();
    }
    info!(dropped = connection.drop_count(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
}
