//! Remote process execution.
//!
//! [`SandboxExecutor`] is the seam the gateway depends on; [`BlaxelSandbox`]
//! implements it over the sandbox's HTTP process API. Command results are
//! passed through untouched: a non-zero exit code is a result, not an error.

use crate::config::SandboxConfig;
use async_trait::async_trait;
use relay_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Extra time the HTTP call may take beyond the command timeout.
const HTTP_GRACE: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// A command to run inside the sandbox, waiting for it to finish.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Shell command line.
    pub command: String,
    /// Block until the command exits.
    pub wait_for_completion: bool,
    /// Timeout in milliseconds.
    pub timeout: u64,
}

impl ProcessRequest {
    /// A request that waits up to `timeout_ms` for the command.
    pub fn new(command: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            command: command.into(),
            wait_for_completion: true,
            timeout: timeout_ms,
        }
    }
}

/// Result of executing a command inside the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// The command as the sandbox recorded it.
    #[serde(default)]
    pub command: String,
    /// Standard output captured from the command.
    #[serde(default)]
    pub stdout: String,
    /// Standard error captured from the command.
    #[serde(default)]
    pub stderr: String,
    /// Process exit code (0 means success).
    #[serde(default, alias = "exitCode")]
    pub exit_code: i64,
    /// Process state reported by the sandbox (`completed`, `failed`, ...).
    #[serde(default)]
    pub status: String,
}

// ---------------------------------------------------------------------------
// Command sanitisation
// ---------------------------------------------------------------------------

/// Basic validation of a command string before execution.
///
/// Rejects empty commands and commands containing null bytes.
pub fn sanitize_command(cmd: &str) -> RelayResult<String> {
    if cmd.trim().is_empty() {
        return Err(RelayError::Sandbox("empty command rejected".to_string()));
    }

    if cmd.contains('\0') {
        return Err(RelayError::Sandbox(
            "command contains null bytes".to_string(),
        ));
    }

    Ok(cmd.to_string())
}

/// Program name and size of `cmd`, for logs. Commands can embed credentials
/// and encoded payloads, so their text is never logged.
pub fn command_summary(cmd: &str) -> String {
    let program = cmd.split_whitespace().next().unwrap_or("");
    format!("{program} ({} bytes)", cmd.len())
}

// ---------------------------------------------------------------------------
// Executors
// ---------------------------------------------------------------------------

/// Something that can run a command in a sandbox.
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Run `request` to completion and return what the sandbox reported.
    async fn exec(&self, request: &ProcessRequest) -> RelayResult<ProcessResult>;
}

/// Client for a Blaxel sandbox's process API.
pub struct BlaxelSandbox {
    config: SandboxConfig,
    http: reqwest::Client,
}

impl BlaxelSandbox {
    /// A client for the sandbox in `config`.
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Endpoint of the process API for the configured sandbox.
    pub fn process_url(&self) -> String {
        format!(
            "{}/{}/sandboxes/{}/process",
            self.config.base_url.trim_end_matches('/'),
            self.config.workspace,
            self.config.name
        )
    }
}

#[async_trait]
impl SandboxExecutor for BlaxelSandbox {
    async fn exec(&self, request: &ProcessRequest) -> RelayResult<ProcessResult> {
        sanitize_command(&request.command)?;

        if self.config.workspace.is_empty() || self.config.api_key.is_empty() {
            return Err(RelayError::Config(
                "sandbox workspace and api key must be set (BL_WORKSPACE, BL_API_KEY)".to_string(),
            ));
        }

        let url = self.process_url();
        info!(sandbox = %self.config.name, timeout_ms = request.timeout, "Executing sandbox command");
        debug!(command = %command_summary(&request.command), "Sandbox command");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Blaxel-Workspace", &self.config.workspace)
            .timeout(Duration::from_millis(request.timeout) + HTTP_GRACE)
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RelayError::Sandbox(format!(
                "Sandbox API error {status}: {error_body}"
            )));
        }

        let mut result: ProcessResult = resp
            .json()
            .await
            .map_err(|e| RelayError::Sandbox(format!("Invalid sandbox response: {e}")))?;

        if result.command.is_empty() {
            result.command = request.command.clone();
        }

        info!(
            sandbox = %self.config.name,
            exit_code = result.exit_code,
            status = %result.status,
            "Sandbox command finished"
        );
        Ok(result)
    }
}
