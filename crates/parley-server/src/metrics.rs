//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::errors::Result;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metric is recorded.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Chat messages accepted, persisted and broadcast (counter).
pub const MESSAGES_ACCEPTED_TOTAL: &str = "messages_accepted_total";
/// Chat messages dropped by moderation (counter, labels: reason).
pub const MESSAGES_BLOCKED_TOTAL: &str = "messages_blocked_total";
/// Non-chat frames relayed verbatim (counter).
pub const FRAMES_RELAYED_TOTAL: &str = "frames_relayed_total";
/// Inbound frames dropped as malformed (counter, labels: kind).
pub const FRAMES_MALFORMED_TOTAL: &str = "frames_malformed_total";
/// History rewrites that failed (counter).
pub const HISTORY_PERSIST_FAILURES_TOTAL: &str = "history_persist_failures_total";
/// Broadcast sends skipped because the session was not open (counter).
pub const BROADCAST_SKIPPED_TOTAL: &str = "broadcast_skipped_total";
