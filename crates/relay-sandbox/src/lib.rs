//! Remote sandbox execution for agent-relay.
//!
//! This crate talks to a hosted sandbox over HTTP. [`BlaxelSandbox`] runs
//! shell commands and reports stdout, stderr and exit code; the
//! [`insurance`] module builds on it to generate and email a PDF document
//! from inside the sandbox.

/// Sandbox and email settings.
pub mod config;
/// Insurance document flow.
pub mod insurance;
/// Minimal PDF writer.
pub mod pdf;
/// Process execution API.
pub mod process;

pub use config::{EmailConfig, SandboxConfig};
pub use insurance::{InsuranceReport, InsuranceRequest, InsuranceService};
pub use pdf::PdfDocument;
pub use process::{command_summary, sanitize_command, BlaxelSandbox, ProcessRequest, ProcessResult, SandboxExecutor};

/// Command run by the sandbox smoke-test endpoint.
pub const DEMO_COMMAND: &str = "python3 -c \"print(2+2)\"";
