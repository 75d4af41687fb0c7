mod daemon;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cinebot_config::AppConfig;
use cinebot_runtime::{AgentRuntime, ChatRequest, ChatResponse, DaemonClient};
use cinebot_tools::UserProfile;

const CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Parser)]
#[command(
    name = "cinebot",
    version,
    about = "Conversational movie recommendations backed by TMDB"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the daemon in the foreground.
    Start,
    /// Stop a running daemon.
    Stop,
    /// Show daemon status.
    Status,
    /// Send one chat message.
    Chat {
        message: String,
        /// Session id; a new one is generated and printed when omitted.
        #[arg(long)]
        session: Option<String>,
        /// Liked movie ids, comma separated.
        #[arg(long, value_delimiter = ',')]
        likes: Vec<u64>,
        /// Preferred genre tags, comma separated.
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Print the raw JSON response.
        #[arg(long)]
        json: bool,
        /// Run the turn in-process instead of through the daemon.
        #[arg(long)]
        local: bool,
    },
    /// Direct catalog tools served by the daemon.
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },
    /// Write a default config/default.toml.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ToolCommands {
    /// List all tools registered in the running daemon.
    List,
    /// Execute a tool directly (key=value arguments).
    /// Example: cinebot tool call search_catalog q=Arrival year=2016
    Call {
        name: String,
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load_from(CONFIG_PATH)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.telemetry.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Start => daemon::run_foreground(config).await?,
        Commands::Stop => daemon::stop(&config).await?,
        Commands::Status => daemon::status(&config).await?,
        Commands::Chat {
            message,
            session,
            likes,
            tags,
            json,
            local,
        } => {
            let session = session.unwrap_or_else(|| {
                let id = uuid::Uuid::new_v4().to_string();
                println!("session: {id}");
                id
            });
            let mut request = ChatRequest::new(session, message);
            if !likes.is_empty() || !tags.is_empty() {
                request = request.with_profile(UserProfile { likes, tags });
            }

            let response = if local {
                request.validate()?;
                AgentRuntime::from_config(config)?.chat(&request).await
            } else {
                DaemonClient::new(&config.daemon.socket_path)
                    .chat(request)
                    .await
                    .context("is the daemon running? start it with `cinebot start`")?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }
        Commands::Tool { command } => {
            let client = DaemonClient::new(&config.daemon.socket_path);
            match command {
                ToolCommands::List => {
                    let specs = client.list_tools().await?;
                    println!("── registered tools ─────────────────────────────────");
                    for spec in &specs {
                        println!("  {} — {}", spec.name, spec.description);
                        for p in &spec.params {
                            println!(
                                "      {} [{}] — {}",
                                p.name,
                                if p.required { "required" } else { "optional" },
                                p.description
                            );
                        }
                    }
                    println!("  ({} tools total)", specs.len());
                }
                ToolCommands::Call { name, args } => {
                    let parsed = parse_tool_args(&args);
                    let (success, output) = client.execute_tool(&name, parsed).await?;
                    let status = if success { "succeeded" } else { "failed" };
                    println!("tool '{name}' {status}:");
                    println!("{output}");
                }
            }
        }
        Commands::Init { force } => {
            if Path::new(CONFIG_PATH).exists() && !force {
                println!("{CONFIG_PATH} already exists (use --force to overwrite)");
            } else {
                // Defaults only; env credentials are not persisted.
                AppConfig::default().save_to(CONFIG_PATH)?;
                println!("wrote {CONFIG_PATH}");
            }
        }
    }

    Ok(())
}

fn print_response(response: &ChatResponse) {
    println!("{}", response.summary);
    if response.movies.is_empty() {
        println!("  (no movies)");
    }
    for (i, movie) in response.movies.iter().enumerate() {
        println!("  {}. #{}", i + 1, movie.id);
        println!("     {}", movie.reason);
        println!("     {}", movie.why_for_user);
    }
}

fn parse_tool_args(args: &[String]) -> HashMap<String, String> {
    let mut parsed = HashMap::new();
    for item in args {
        if let Some((k, v)) = item.split_once('=') {
            parsed.insert(k.to_string(), v.to_string());
        } else {
            eprintln!("warning: skipping malformed arg '{item}' (expected key=value)");
        }
    }
    parsed
}
