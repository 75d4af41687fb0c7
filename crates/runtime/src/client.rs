use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::warn;

use cinebot_tools::ToolSpec;

use crate::{ChatRequest, ChatResponse, ClientCommand, DaemonStatus, ServerEvent};

#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    pub async fn connect_with_backoff(&self, max_attempts: usize) -> Result<()> {
        let mut delay = Duration::from_millis(100);
        for attempt in 0..max_attempts.max(1) {
            match UnixStream::connect(&self.socket_path).await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    if attempt + 1 == max_attempts.max(1) {
                        return Err(err.into());
                    }
                    warn!(attempt, ?err, "daemon connect failed; retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(2));
                }
            }
        }
        Ok(())
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        match self.request(ClientCommand::Chat(request)).await? {
            ServerEvent::Chat(response) => Ok(response),
            ServerEvent::Error(err) => bail!("daemon rejected chat request: {err}"),
            other => bail!("unexpected daemon reply to chat: {other:?}"),
        }
    }

    pub async fn get_status(&self) -> Result<DaemonStatus> {
        match self.request(ClientCommand::GetStatus).await? {
            ServerEvent::Status(status) => Ok(status),
            other => bail!("unexpected daemon reply to status: {other:?}"),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        match self.request(ClientCommand::Ping).await? {
            ServerEvent::Ack(_) => Ok(()),
            other => bail!("unexpected daemon reply to ping: {other:?}"),
        }
    }

    pub async fn graceful_shutdown(&self) -> Result<()> {
        let _ = self.request(ClientCommand::Shutdown).await?;
        Ok(())
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolSpec>> {
        match self.request(ClientCommand::ListTools).await? {
            ServerEvent::ToolList(specs) => Ok(specs),
            other => bail!("unexpected daemon reply to tool list: {other:?}"),
        }
    }

    pub async fn execute_tool(
        &self,
        name: &str,
        args: HashMap<String, String>,
    ) -> Result<(bool, String)> {
        let command = ClientCommand::ExecuteTool {
            name: name.to_string(),
            args,
        };
        match self.request(command).await? {
            ServerEvent::ToolResult { success, output } => Ok((success, output)),
            other => bail!("unexpected daemon reply to tool call: {other:?}"),
        }
    }

    /// Send one command and read its single reply line.
    async fn request(&self, command: ClientCommand) -> Result<ServerEvent> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, mut write_half) = stream.into_split();

        let request = serde_json::to_string(&command)?;
        write_half.write_all(request.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            bail!("daemon closed the connection without replying; check daemon logs");
        }
        Ok(serde_json::from_str(line.trim())?)
    }
}
