//! `agent-relay`: serves the SSE chat relay and sandbox endpoints.

mod config;

use clap::{Parser, Subcommand};
use config::RelayConfig;
use relay_agent::{AgentRuntime, InMemoryRunner, LlmAgent};
use relay_gateway::{AppState, GatewayServer};
use relay_sandbox::{BlaxelSandbox, InsuranceService, SandboxExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agent-relay", about = "Relay agent replies to the browser over SSE")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let cli = Cli::parse();

    let mut config = RelayConfig::load(&cli.config).await?;
    config.apply_env(|key| std::env::var(key).ok());

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    if config.agent.model.api_key.is_empty() {
        warn!(provider = ?config.agent.model.provider, "No model API key configured; chat requests will fail");
    }
    if config.sandbox.workspace.is_empty() || config.sandbox.api_key.is_empty() {
        warn!("BL_WORKSPACE or BL_API_KEY not set; sandbox endpoints will fail");
    }

    info!(
        agent = %config.agent.name,
        model = %config.agent.model.model_id,
        streaming = config.agent.model.streaming,
        "Agent configured"
    );
    let runtime: Arc<dyn AgentRuntime> =
        Arc::new(InMemoryRunner::new(LlmAgent::new(config.agent.clone())));

    let sandbox: Arc<dyn SandboxExecutor> = Arc::new(BlaxelSandbox::new(config.sandbox.clone()));
    info!(
        sandbox = %config.sandbox.name,
        email = config.email.is_enabled(),
        "Sandbox configured"
    );
    let insurance = InsuranceService::new(
        sandbox.clone(),
        config.email.clone(),
        config.sandbox.insurance_timeout_ms,
    );

    let state = AppState::new(config.gateway(), runtime, sandbox, insurance);
    let app = GatewayServer::build(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "agent-relay listening");
    axum::serve(listener, app).await?;

    Ok(())
}
