use anyhow::Context;
use relay_agent::{AgentConfig, LlmProvider};
use relay_gateway::GatewayConfig;
use relay_sandbox::{EmailConfig, SandboxConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const REDACTED: &str = "***";

/// Everything the server reads at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_name: default_app_name(),
            cors_origins: default_cors_origins(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_app_name() -> String {
    GatewayConfig::default().app_name
}
fn default_cors_origins() -> Vec<String> {
    GatewayConfig::default().cors_origins
}
fn default_frontend_dir() -> PathBuf {
    GatewayConfig::default().frontend_dir
}

impl RelayConfig {
    /// Read `path` if it exists; otherwise start from defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Apply environment overrides. `lookup` returns a variable's value, if set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(app_name) = get("APP_NAME") {
            self.server.app_name = app_name;
        }

        let key_var = match self.agent.model.provider {
            LlmProvider::Claude => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
        };
        if let Some(key) = get(key_var) {
            self.agent.model.api_key = key;
        }

        if let Some(workspace) = get("BL_WORKSPACE") {
            self.sandbox.workspace = workspace;
        }
        if let Some(key) = get("BL_API_KEY") {
            self.sandbox.api_key = key;
        }
        if let Some(name) = get("SANDBOX_NAME") {
            self.sandbox.name = name;
        }
        if let Some(key) = get("RESEND_API_KEY") {
            self.email.api_key = key;
        }
        if let Some(to) = get("EMAIL_TO") {
            self.email.to = to;
        }
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            app_name: self.server.app_name.clone(),
            cors_origins: self.server.cors_origins.clone(),
            frontend_dir: self.server.frontend_dir.clone(),
            sandbox_timeout_ms: self.sandbox.timeout_ms,
        }
    }

    /// A copy safe to print: every non-empty secret is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.agent.model.api_key,
            &mut copy.sandbox.api_key,
            &mut copy.email.api_key,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        copy
    }
}
