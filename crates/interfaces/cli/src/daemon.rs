//! Foreground daemon lifecycle.

use anyhow::{Result, bail};
use tracing::info;

use cinebot_config::AppConfig;
use cinebot_runtime::{AgentRuntime, DaemonClient, run_daemon};

/// Run the daemon in the foreground until `cinebot stop`, SIGTERM or Ctrl-C.
pub(crate) async fn run_foreground(config: AppConfig) -> Result<()> {
    let socket_path = config.daemon.socket_path.clone();
    let client = DaemonClient::new(&socket_path);
    if client.ping().await.is_ok() {
        bail!("a daemon is already listening on {socket_path}");
    }

    let runtime = AgentRuntime::from_config(config)?;
    let daemon = run_daemon(runtime, &socket_path);

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = async {
        tokio::signal::ctrl_c().await?;
        Ok::<(), anyhow::Error>(())
    };

    tokio::select! {
        result = daemon => {
            result?;
        }
        result = terminate => {
            result?;
            info!("signal received; stopping daemon");
            let _ = std::fs::remove_file(&socket_path);
        }
    }
    Ok(())
}

pub(crate) async fn stop(config: &AppConfig) -> Result<()> {
    let client = DaemonClient::new(&config.daemon.socket_path);
    if client.ping().await.is_err() {
        println!("daemon is not running");
        return Ok(());
    }
    client.graceful_shutdown().await?;
    println!("daemon stopped");
    Ok(())
}

pub(crate) async fn status(config: &AppConfig) -> Result<()> {
    let client = DaemonClient::new(&config.daemon.socket_path);
    match client.get_status().await {
        Ok(status) => {
            println!("── {} daemon ─────────────────────────────────", status.bot_name);
            println!("  socket       : {}", config.daemon.socket_path);
            println!("  catalog      : {}", status.catalog_base_url);
            println!(
                "  credentials  : {}",
                if status.catalog_configured { "configured" } else { "missing" }
            );
            println!("  started at   : {}", status.started_at.to_rfc3339());
            println!("  uptime       : {}s", status.uptime_secs);
            println!("  turns served : {}", status.turns_served);
            println!("  tools        : {}", status.available_tools.join(", "));
        }
        Err(_) => println!("daemon is not running (socket {})", config.daemon.socket_path),
    }
    Ok(())
}
