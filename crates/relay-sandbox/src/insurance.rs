//! Insurance document flow: build a PDF for an insurance number, write it
//! inside the sandbox and email it from there.

use crate::config::EmailConfig;
use crate::pdf::PdfDocument;
use crate::process::{ProcessRequest, SandboxExecutor};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use relay_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const MAX_NUMBER_LEN: usize = 64;
const WORK_DIR: &str = "/tmp/insurance";
const PDF_MARKER: &str = "PDF_GENERATED";
const EMAIL_STATUS_PREFIX: &str = "EMAIL_STATUS=";

/// Body of `POST /api/sandbox/insurance`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsuranceRequest {
    /// Insurance number, `[A-Za-z0-9_-]{1,64}`.
    pub insurance_number: String,
}

/// What happened to one insurance request, including the raw sandbox output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceReport {
    /// The validated insurance number.
    pub insurance_number: String,
    /// The sandbox wrote a non-empty PDF.
    pub pdf_generated: bool,
    /// The email API answered 2xx.
    pub email_sent: bool,
    /// Configured recipient; empty when email is off.
    pub email_to: String,
    /// Script standard output.
    pub stdout: String,
    /// Script standard error.
    pub stderr: String,
    /// Script exit code.
    pub exit_code: i64,
}

/// Runs the insurance document flow in a sandbox.
pub struct InsuranceService {
    sandbox: Arc<dyn SandboxExecutor>,
    email: EmailConfig,
    timeout_ms: u64,
}

impl InsuranceService {
    /// A service running its script on `sandbox` with `timeout_ms`.
    pub fn new(sandbox: Arc<dyn SandboxExecutor>, email: EmailConfig, timeout_ms: u64) -> Self {
        Self {
            sandbox,
            email,
            timeout_ms,
        }
    }

    /// Validate `insurance_number`, build its PDF and run the script.
    pub async fn process(&self, insurance_number: &str) -> RelayResult<InsuranceReport> {
        validate_insurance_number(insurance_number)?;

        let pdf = insurance_pdf(insurance_number, Utc::now());
        let script = build_script(insurance_number, &pdf, &self.email)?;
        let command = format!("sh -c {}", shell_quote(&script));

        info!(
            insurance_number,
            pdf_bytes = pdf.len(),
            email_enabled = self.email.is_enabled(),
            "Generating insurance document in sandbox"
        );

        let result = self
            .sandbox
            .exec(&ProcessRequest::new(command, self.timeout_ms))
            .await?;

        let (pdf_generated, email_sent) = parse_outcome(&result.stdout);
        info!(insurance_number, pdf_generated, email_sent, exit_code = result.exit_code, "Insurance flow finished");

        Ok(InsuranceReport {
            insurance_number: insurance_number.to_string(),
            pdf_generated,
            email_sent,
            email_to: self.email.to.clone(),
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
        })
    }
}

/// Insurance numbers end up in file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_insurance_number(number: &str) -> RelayResult<()> {
    if number.is_empty() || number.len() > MAX_NUMBER_LEN {
        return Err(RelayError::InvalidInput(format!(
            "insurance_number must be 1-{MAX_NUMBER_LEN} characters"
        )));
    }
    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RelayError::InvalidInput(
            "insurance_number may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

/// The confirmation PDF for `insurance_number`.
pub fn insurance_pdf(insurance_number: &str, generated_at: DateTime<Utc>) -> Vec<u8> {
    PdfDocument::new("Insurance Confirmation")
        .line(format!("Insurance number: {insurance_number}"))
        .line(format!(
            "Generated: {}",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .line("")
        .line("This document confirms that the insurance number above is registered.")
        .render()
}

/// Quote `s` as a single POSIX shell word.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn email_payload(insurance_number: &str, pdf: &[u8], email: &EmailConfig) -> serde_json::Value {
    serde_json::json!({
        "from": email.from,
        "to": [email.to],
        "subject": format!("Insurance document {insurance_number}"),
        "html": format!(
            "<p>Please find attached the insurance document for <strong>{insurance_number}</strong>.</p>"
        ),
        "attachments": [{
            "filename": format!("insurance_{insurance_number}.pdf"),
            "content": BASE64.encode(pdf),
        }],
    })
}

/// Shell script run inside the sandbox. Prints `PDF_GENERATED` once the file
/// exists and, when email is configured, `EMAIL_STATUS=<http code>`.
pub fn build_script(insurance_number: &str, pdf: &[u8], email: &EmailConfig) -> RelayResult<String> {
    validate_insurance_number(insurance_number)?;

    let pdf_file = format!("insurance_{insurance_number}.pdf");
    let mut script = String::new();
    script.push_str("set -e\n");
    script.push_str(&format!("mkdir -p {WORK_DIR}\ncd {WORK_DIR}\n"));
    script.push_str(&format!(
        "printf '%s' '{}' | base64 -d > {pdf_file}\n",
        BASE64.encode(pdf)
    ));
    script.push_str(&format!("if [ -s {pdf_file} ]; then echo {PDF_MARKER}; fi\n"));

    if email.is_enabled() {
        let payload = serde_json::to_vec(&email_payload(insurance_number, pdf, email))?;
        let payload_file = format!("email_{insurance_number}.json");
        let response_file = format!("email_{insurance_number}.response");
        let auth_header = format!("Authorization: Bearer {}", email.api_key);

        script.push_str(&format!(
            "printf '%s' '{}' | base64 -d > {payload_file}\n",
            BASE64.encode(payload)
        ));
        script.push_str(&format!(
            "status=$(curl -sS -o {response_file} -w '%{{http_code}}' -X POST {} -H {} \
             -H 'Content-Type: application/json' --data-binary @{payload_file} || echo 000)\n",
            shell_quote(&email.api_url),
            shell_quote(&auth_header),
        ));
        script.push_str(&format!("echo \"{EMAIL_STATUS_PREFIX}$status\"\n"));
    } else {
        script.push_str("echo EMAIL_SKIPPED\n");
    }

    Ok(script)
}

/// `(pdf_generated, email_sent)` as reported by the script's stdout.
pub fn parse_outcome(stdout: &str) -> (bool, bool) {
    let pdf_generated = stdout.lines().any(|line| line.trim() == PDF_MARKER);
    let email_sent = stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(EMAIL_STATUS_PREFIX))
        .filter_map(|code| code.parse::<u16>().ok())
        .any(|code| (200..300).contains(&code));
    (pdf_generated, email_sent)
}
