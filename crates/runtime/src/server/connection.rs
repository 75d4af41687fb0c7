//! Per-connection command dispatch.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{ClientCommand, ServerEvent};

use super::DaemonState;

pub(super) async fn handle_connection(
    stream: UnixStream,
    state: Arc<DaemonState>,
    shutdown_tx: watch::Sender<bool>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(());
    }

    let command: ClientCommand = match serde_json::from_str(line.trim()) {
        Ok(command) => command,
        Err(err) => {
            warn!(%err, "malformed client command");
            send_event(
                &mut write_half,
                ServerEvent::Error(format!("malformed command: {err}")),
            )
            .await?;
            return Ok(());
        }
    };

    match command {
        ClientCommand::Chat(request) => {
            let event = match state.runtime.handle(&request).await {
                Ok(response) => {
                    state.turns_served.fetch_add(1, Ordering::Relaxed);
                    ServerEvent::Chat(response)
                }
                Err(err) => {
                    debug!(%err, "chat request rejected");
                    ServerEvent::Error(err.to_string())
                }
            };
            send_event(&mut write_half, event).await?;
        }
        ClientCommand::ListTools => {
            let specs = state.tool_registry.list_specs();
            send_event(&mut write_half, ServerEvent::ToolList(specs)).await?;
        }
        ClientCommand::ExecuteTool { name, args } => {
            let output = state.tool_registry.execute(&name, &args).await;
            send_event(
                &mut write_half,
                ServerEvent::ToolResult {
                    success: output.success,
                    output: output.output,
                },
            )
            .await?;
        }
        ClientCommand::GetStatus => {
            send_event(&mut write_half, ServerEvent::Status(state.status())).await?;
        }
        ClientCommand::Ping => {
            send_event(&mut write_half, ServerEvent::Ack("pong".to_string())).await?;
        }
        ClientCommand::Shutdown => {
            let _ = shutdown_tx.send(true);
            send_event(
                &mut write_half,
                ServerEvent::Ack("shutdown requested".to_string()),
            )
            .await?;
        }
    }

    Ok(())
}

async fn send_event(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    event: ServerEvent,
) -> Result<()> {
    let encoded = serde_json::to_string(&event)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
