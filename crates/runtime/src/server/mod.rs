//! Unix socket daemon serving chat turns and the direct tool surface.

mod connection;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::net::UnixListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use cinebot_tools::ToolRegistry;

use crate::{AgentRuntime, DaemonStatus};

struct DaemonState {
    runtime: AgentRuntime,
    tool_registry: ToolRegistry,
    started_at: DateTime<Utc>,
    turns_served: AtomicU64,
}

impl DaemonState {
    fn status(&self) -> DaemonStatus {
        let config = &self.runtime.config;
        DaemonStatus {
            bot_name: config.agent.name.clone(),
            catalog_base_url: config.catalog.base_url.clone(),
            catalog_configured: config.catalog.has_credentials(),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            turns_served: self.turns_served.load(std::sync::atomic::Ordering::Relaxed),
            available_tools: self
                .tool_registry
                .list_specs()
                .into_iter()
                .map(|s| s.name)
                .collect(),
        }
    }
}

/// Serve `runtime` on `socket_path` until a `Shutdown` command arrives.
///
/// A stale socket file is replaced on start and removed on exit.  Each
/// connection is handled on its own task; the runtime is shared, so turns
/// for different sessions run concurrently.
pub async fn run_daemon(runtime: AgentRuntime, socket_path: impl AsRef<Path>) -> Result<()> {
    let socket_path = socket_path.as_ref().to_path_buf();
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }

    let state = Arc::new(DaemonState {
        tool_registry: runtime.tool_registry(),
        runtime,
        started_at: Utc::now(),
        turns_served: AtomicU64::new(0),
    });

    let listener = UnixListener::bind(&socket_path)?;
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    info!(path = %socket_path.display(), "daemon listening");
    if !state.runtime.config.catalog.has_credentials() {
        warn!("no TMDB credentials configured; catalog calls will be rejected");
    }

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && *shutdown_rx.borrow() {
                    break;
                }
            }
            accept = listener.accept() => {
                let (stream, _) = accept?;
                let state = state.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = connection::handle_connection(stream, state, shutdown_tx).await {
                        error!(?err, "daemon connection handler failed");
                    }
                });
            }
        }
    }

    info!("daemon shutting down gracefully");
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}
