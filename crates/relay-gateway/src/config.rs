use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings the HTTP layer needs. Built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Application name sessions are created under.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Allowed CORS origins. `"*"` mirrors whatever origin the request carries.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Static frontend served for paths outside the API. Ignored when missing.
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,

    /// Timeout for the sandbox smoke-test command, in milliseconds.
    #[serde(default = "default_sandbox_timeout_ms")]
    pub sandbox_timeout_ms: u64,
}

fn default_app_name() -> String {
    "agent-relay".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "*".to_string(),
    ]
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("./frontend")
}

fn default_sandbox_timeout_ms() -> u64 {
    15_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cors_origins: default_cors_origins(),
            frontend_dir: default_frontend_dir(),
            sandbox_timeout_ms: default_sandbox_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    /// Whether the origin list contains the `"*"` wildcard.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
