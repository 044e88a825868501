//! # parley-relay
//!
//! Relay binary: loads settings, wires the moderation engine, history store
//! and connection registry into one coordinator, and serves until Ctrl-C.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use parley_history::HistoryStore;
use parley_moderation::{ModerationEngine, load_blocked_words};
use parley_server::{BroadcastCoordinator, ConnectionRegistry, RelayServer, ServerConfig};
use parley_settings::RelaySettings;

/// Real-time chat relay.
#[derive(Parser, Debug)]
#[command(name = "parley-relay", about = "Real-time moderated chat relay")]
struct Cli {
    /// JSON settings file merged over the defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host to bind (overrides settings and `PARLEY_HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings and `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn load_settings(&self) -> Result<RelaySettings> {
        let mut settings = parley_settings::load_settings(self.settings.as_deref())
            .context("Failed to load settings")?;
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }
}

/// Build the moderation engine from the configured blocked-word file.
fn build_moderation(settings: &RelaySettings) -> Result<ModerationEngine> {
    let path = Path::new(&settings.moderation.blocked_words_path);
    let words = load_blocked_words(path)
        .with_context(|| format!("Failed to load blocked words: {}", path.display()))?;
    let engine = ModerationEngine::with_threshold(&words, settings.moderation.heat_threshold)
        .context("Failed to build moderation engine")?;
    tracing::info!(
        blocked_words = engine.blocked_word_count(),
        threshold = engine.threshold(),
        "moderation ready"
    );
    Ok(engine)
}

/// Wire every component into a ready-to-listen server.
fn build_server(settings: &RelaySettings, metrics: Option<PrometheusHandle>) -> Result<RelayServer> {
    let moderation = build_moderation(settings)?;
    let history = HistoryStore::load(&settings.storage.history_path);
    let coordinator = Arc::new(BroadcastCoordinator::new(
        Arc::new(moderation),
        Arc::new(history),
        Arc::new(ConnectionRegistry::new()),
    ));
    Ok(RelayServer::new(
        ServerConfig::from(settings),
        coordinator,
        metrics,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    parley_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let metrics = parley_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;
    let server = build_server(&settings, Some(metrics))?;

    let (addr, handle) = server.listen().await.context("Failed to start server")?;
    tracing::info!(%addr, url = %format!("ws://{addr}/"), "parley relay ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    if !server.shutdown().drain(vec![handle], Some(Duration::from_secs(10))).await {
        tracing::warn!("server did not stop in time");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
