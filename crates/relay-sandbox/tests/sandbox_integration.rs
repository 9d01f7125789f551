#![allow(clippy::unwrap_used, clippy::expect_used)]

use relay_sandbox::*;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn sandbox_config(base_url: &str) -> SandboxConfig {
    SandboxConfig {
        workspace: "acme".to_string(),
        api_key: "bl-key".to_string(),
        name: "agent-env".to_string(),
        base_url: base_url.to_string(),
        timeout_ms: 15_000,
        insurance_timeout_ms: 60_000,
    }
}

#[tokio::test]
async fn exec_posts_command_and_passes_result_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/sandboxes/agent-env/process"))
        .and(header("authorization", "Bearer bl-key"))
        .and(header("x-blaxel-workspace", "acme"))
        .and(body_partial_json(serde_json::json!({
            "command": DEMO_COMMAND,
            "waitForCompletion": true,
            "timeout": 15000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "command": DEMO_COMMAND,
            "stdout": "4\n",
            "stderr": "",
            "exitCode": 0,
            "status": "completed",
            "pid": "42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = BlaxelSandbox::new(sandbox_config(&server.uri()));
    let result = sandbox
        .exec(&ProcessRequest::new(DEMO_COMMAND, 15_000))
        .await
        .unwrap();

    assert_eq!(result.stdout, "4\n");
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.status, "completed");
    assert_eq!(result.command, DEMO_COMMAND);
}

#[tokio::test]
async fn failing_command_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "stdout": "",
            "stderr": "sh: nope: not found\n",
            "exitCode": 127,
            "status": "failed"
        })))
        .mount(&server)
        .await;

    let sandbox = BlaxelSandbox::new(sandbox_config(&server.uri()));
    let result = sandbox
        .exec(&ProcessRequest::new("nope", 1_000))
        .await
        .unwrap();

    assert_eq!(result.exit_code, 127);
    assert_eq!(result.stderr, "sh: nope: not found\n");
    // Filled from the request when the sandbox omits it.
    assert_eq!(result.command, "nope");
}

#[tokio::test]
async fn api_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("sandbox not found"))
        .mount(&server)
        .await;

    let sandbox = BlaxelSandbox::new(sandbox_config(&server.uri()));
    let err = sandbox
        .exec(&ProcessRequest::new("echo hi", 1_000))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("404"), "{message}");
    assert!(message.contains("sandbox not found"), "{message}");
}

#[tokio::test]
async fn insurance_flow_reports_markers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/sandboxes/agent-env/process"))
        .respond_with(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let command = body["command"].as_str().unwrap_or_default();
            assert!(command.starts_with("sh -c '"));
            assert!(command.contains("insurance_POL-7.pdf"));
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "command": command,
                "stdout": "PDF_GENERATED\nEMAIL_STATUS=200\n",
                "stderr": "",
                "exitCode": 0,
                "status": "completed"
            }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let sandbox: Arc<dyn SandboxExecutor> = Arc::new(BlaxelSandbox::new(sandbox_config(&server.uri())));
    let email = EmailConfig {
        api_key: "re_key".to_string(),
        to: "ops@example.com".to_string(),
        ..EmailConfig::default()
    };
    let service = InsuranceService::new(sandbox, email, 30_000);

    let report = service.process("POL-7").await.unwrap();
    assert_eq!(report.insurance_number, "POL-7");
    assert!(report.pdf_generated);
    assert!(report.email_sent);
    assert_eq!(report.email_to, "ops@example.com");
    assert_eq!(report.exit_code, 0);
}

#[tokio::test]
async fn insurance_rejects_unsafe_number_without_calling_sandbox() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sandbox: Arc<dyn SandboxExecutor> = Arc::new(BlaxelSandbox::new(sandbox_config(&server.uri())));
    let service = InsuranceService::new(sandbox, EmailConfig::default(), 30_000);

    let err = service.process("$(reboot)").await.unwrap_err();
    assert!(err.to_string().starts_with("Invalid input"));
}

#[test]
fn sandbox_config_defaults_from_toml() {
    let config: SandboxConfig = toml::from_str("workspace = \"acme\"").unwrap();
    assert_eq!(config.workspace, "acme");
    assert_eq!(config.name, "agent-env");
    assert_eq!(config.timeout_ms, 15_000);
    assert_eq!(config.base_url, "https://run.blaxel.ai");

    let email: EmailConfig = toml::from_str("").unwrap();
    assert!(!email.is_enabled());
}
