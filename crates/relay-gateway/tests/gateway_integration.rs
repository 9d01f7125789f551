#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures_util::stream;
use relay_agent::{AgentEventStream, AgentRuntime};
use relay_core::{AgentEvent, RelayError, RelayResult};
use relay_gateway::{AppState, GatewayConfig, GatewayServer, WEB_USER};
use relay_sandbox::{BlaxelSandbox, EmailConfig, InsuranceService, SandboxConfig, SandboxExecutor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
enum Step {
    Emit(AgentEvent),
    Fail(&'static str),
}

/// Plays back a fixed script for every run and records what it was asked.
#[derive(Default)]
struct ScriptedRuntime {
    script: Vec<Step>,
    refuse_sessions: bool,
    next_id: AtomicUsize,
    sessions: Mutex<Vec<(String, String)>>,
    runs: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedRuntime {
    fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn create_session(&self, app_name: &str, user_id: &str) -> RelayResult<String> {
        if self.refuse_sessions {
            return Err(RelayError::Agent("session backend down".to_string()));
        }
        self.sessions
            .lock()
            .unwrap()
            .push((app_name.to_string(), user_id.to_string()));
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("session-{n}"))
    }

    fn run(&self, session_id: &str, user_id: &str, message: &str) -> AgentEventStream {
        self.runs.lock().unwrap().push((
            session_id.to_string(),
            user_id.to_string(),
            message.to_string(),
        ));
        let items: Vec<RelayResult<AgentEvent>> = self
            .script
            .iter()
            .map(|step| match step {
                Step::Emit(event) => Ok(event.clone()),
                Step::Fail(msg) => Err(RelayError::Agent((*msg).to_string())),
            })
            .collect();
        Box::pin(stream::iter(items))
    }
}

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

fn build_app(runtime: Arc<ScriptedRuntime>, sandbox_url: &str, frontend_dir: PathBuf) -> Router {
    let sandbox: Arc<dyn SandboxExecutor> = Arc::new(BlaxelSandbox::new(sandbox_config(sandbox_url)));
    let insurance = InsuranceService::new(sandbox.clone(), EmailConfig::default(), 30_000);
    let config = GatewayConfig {
        app_name: "relay-test".to_string(),
        frontend_dir,
        ..GatewayConfig::default()
    };
    GatewayServer::build(AppState::new(config, runtime, sandbox, insurance))
}

fn no_frontend() -> PathBuf {
    PathBuf::from("/nonexistent/relay-frontend")
}

/// Bind the app on a random port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{}", addr.port())
}

/// POST a chat message and collect every `data:` frame as JSON.
async fn chat(base: &str, body: serde_json::Value) -> Vec<serde_json::Value> {
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"), "{content_type}");

    let text = resp.text().await.unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}

fn types(frames: &[serde_json::Value]) -> Vec<&str> {
    frames.iter().map(|f| f["type"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn health_reports_service() {
    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "agent-relay");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn chat_streams_partials_then_complete() {
    let runtime = Arc::new(ScriptedRuntime::new(vec![
        Step::Emit(AgentEvent::partial_text("Hel")),
        Step::Emit(AgentEvent::partial_text("lo!")),
        Step::Emit(AgentEvent::final_text("Hello!")),
    ]));
    let base = serve(build_app(runtime.clone(), "http://127.0.0.1:1", no_frontend())).await;

    let frames = chat(&base, serde_json::json!({"message": "hi"})).await;
    assert_eq!(types(&frames), vec!["agent_start", "text_chunk", "text_chunk", "complete"]);
    assert_eq!(frames[1]["data"], "Hel");
    assert_eq!(frames[1]["partial"], true);
    assert_eq!(frames[2]["data"], "lo!");
    assert_eq!(frames[0]["session_id"], frames[3]["session_id"]);
    assert!(frames[0]["timestamp"].is_string());

    let sessions = runtime.sessions.lock().unwrap().clone();
    assert_eq!(sessions, vec![("relay-test".to_string(), WEB_USER.to_string())]);
    let runs = runtime.runs.lock().unwrap().clone();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, frames[0]["session_id"].as_str().unwrap());
    assert_eq!(runs[0].1, WEB_USER);
    assert_eq!(runs[0].2, "hi");
}

#[tokio::test]
async fn chat_forwards_final_when_no_partials() {
    let runtime = Arc::new(ScriptedRuntime::new(vec![Step::Emit(AgentEvent::final_text(
        "Hi there",
    ))]));
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let frames = chat(&base, serde_json::json!({"message": "hi"})).await;
    assert_eq!(types(&frames), vec!["agent_start", "text_chunk", "complete"]);
    assert_eq!(frames[1]["data"], "Hi there");
    assert_eq!(frames[1]["partial"], false);
}

#[tokio::test]
async fn chat_failure_ends_with_error_frame() {
    let runtime = Arc::new(ScriptedRuntime::new(vec![
        Step::Emit(AgentEvent::partial_text("Hel")),
        Step::Fail("model overloaded"),
    ]));
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let frames = chat(&base, serde_json::json!({"message": "hi"})).await;
    assert_eq!(types(&frames), vec!["agent_start", "text_chunk", "error"]);
    assert!(frames[2]["error"].as_str().unwrap().contains("model overloaded"));
}

#[tokio::test]
async fn chat_ignores_client_session_id() {
    let runtime = Arc::new(ScriptedRuntime::new(vec![]));
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let first = chat(&base, serde_json::json!({"message": "a", "session_id": "mine"})).await;
    let second = chat(&base, serde_json::json!({"message": "b", "session_id": "mine"})).await;

    assert_eq!(types(&first), vec!["agent_start", "complete"]);
    assert_ne!(first[0]["session_id"], "mine");
    assert_ne!(first[0]["session_id"], second[0]["session_id"]);
}

#[tokio::test]
async fn chat_session_failure_is_json_500() {
    let runtime = Arc::new(ScriptedRuntime {
        refuse_sessions: true,
        ..ScriptedRuntime::default()
    });
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("session backend down"));
}

#[tokio::test]
async fn sandbox_run_returns_process_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/sandboxes/agent-env/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "command": "python3 -c \"print(2+2)\"",
            "stdout": "4\n",
            "stderr": "",
            "exitCode": 0,
            "status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, &server.uri(), no_frontend())).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/sandbox/run"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["stdout"], "4\n");
    assert_eq!(body["exit_code"], 0);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn sandbox_api_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("sandbox asleep"))
        .mount(&server)
        .await;

    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, &server.uri(), no_frontend())).await;

    let resp = reqwest::get(format!("{base}/api/sandbox/run")).await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn insurance_rejects_invalid_number() {
    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, "http://127.0.0.1:1", no_frontend())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/sandbox/insurance"))
        .json(&serde_json::json!({"insurance_number": "a b; rm -rf /"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn insurance_reports_sandbox_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "stdout": "PDF_GENERATED\n",
            "stderr": "",
            "exitCode": 0,
            "status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, &server.uri(), no_frontend())).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/api/sandbox/insurance"))
        .json(&serde_json::json!({"insurance_number": "POL-123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["insurance_number"], "POL-123");
    assert_eq!(body["pdf_generated"], true);
    assert_eq!(body["email_sent"], false);
}

#[tokio::test]
async fn cors_mirrors_origin_with_credentials() {
    let runtime = Arc::new(ScriptedRuntime::default());
    let app = build_app(runtime, "http://127.0.0.1:1", no_frontend());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn serves_frontend_outside_api_paths() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("index.html"), "<h1>relay</h1>").unwrap();

    let runtime = Arc::new(ScriptedRuntime::default());
    let base = serve(build_app(runtime, "http://127.0.0.1:1", tmp.path().to_path_buf())).await;

    let page = reqwest::get(format!("{base}/")).await.unwrap().text().await.unwrap();
    assert_eq!(page, "<h1>relay</h1>");

    let health = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(health.status(), 200);

    let missing = reqwest::get(format!("{base}/nope.js")).await.unwrap();
    assert_eq!(missing.status(), 404);
}
