use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinebot_tools::ToolSpec;

use crate::{ChatRequest, ChatResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub bot_name: String,
    pub catalog_base_url: String,
    pub catalog_configured: bool,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub turns_served: u64,
    pub available_tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientCommand {
    Chat(ChatRequest),
    ListTools,
    ExecuteTool { name: String, args: HashMap<String, String> },
    GetStatus,
    Ping,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerEvent {
    Chat(ChatResponse),
    ToolList(Vec<ToolSpec>),
    ToolResult { success: bool, output: String },
    Status(DaemonStatus),
    Error(String),
    Ack(String),
}
