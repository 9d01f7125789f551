use serde::{Deserialize, Serialize};

/// Connection settings for the remote sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Workspace the sandbox belongs to (`BL_WORKSPACE`).
    #[serde(default)]
    pub workspace: String,

    /// API key used as a bearer token (`BL_API_KEY`).
    #[serde(default)]
    pub api_key: String,

    /// Name of the sandbox instance (default: "agent-env").
    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL of the sandbox control API (default: "https://run.blaxel.ai").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Command execution timeout in milliseconds (default: 15000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout for the insurance document script, which may also send email.
    #[serde(default = "default_insurance_timeout_ms")]
    pub insurance_timeout_ms: u64,
}

fn default_name() -> String {
    "agent-env".to_string()
}

fn default_base_url() -> String {
    "https://run.blaxel.ai".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_insurance_timeout_ms() -> u64 {
    60_000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            workspace: String::new(),
            api_key: String::new(),
            name: default_name(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            insurance_timeout_ms: default_insurance_timeout_ms(),
        }
    }
}

/// Outbound email API settings used by the insurance flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Endpoint accepting `{from, to, subject, html, attachments}` JSON.
    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    /// Bearer token for the email API. Empty disables sending.
    #[serde(default)]
    pub api_key: String,

    /// Sender address.
    #[serde(default = "default_from")]
    pub from: String,

    /// Recipient of generated documents.
    #[serde(default)]
    pub to: String,
}

fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_from() -> String {
    "onboarding@resend.dev".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: String::new(),
            from: default_from(),
            to: String::new(),
        }
    }
}

impl EmailConfig {
    /// Sending needs both an API key and a recipient.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty() && !self.to.is_empty()
    }
}
