use crate::chat::chat_handler;
use crate::config::GatewayConfig;
use crate::error::ApiError;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_agent::{AgentRuntime, EventNormalizer};
use relay_sandbox::{
    InsuranceReport, InsuranceRequest, InsuranceService, ProcessRequest, ProcessResult,
    SandboxExecutor, DEMO_COMMAND,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    /// Gateway settings.
    pub config: Arc<GatewayConfig>,
    /// Agent runtime chat requests are relayed to.
    pub runtime: Arc<dyn AgentRuntime>,
    /// Sandbox used by the smoke-test endpoint.
    pub sandbox: Arc<dyn SandboxExecutor>,
    /// Insurance document flow.
    pub insurance: InsuranceService,
    /// Turns agent events into SSE payloads.
    pub normalizer: EventNormalizer,
}

impl AppState {
    /// State with a system-clock normalizer.
    pub fn new(
        config: GatewayConfig,
        runtime: Arc<dyn AgentRuntime>,
        sandbox: Arc<dyn SandboxExecutor>,
        insurance: InsuranceService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            runtime,
            sandbox,
            insurance,
            normalizer: EventNormalizer::default(),
        }
    }

    /// Replace the normalizer, e.g. to fix the clock.
    pub fn with_normalizer(mut self, normalizer: EventNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// The HTTP relay server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router: API routes, then the static frontend as fallback,
    /// wrapped in CORS and request tracing.
    pub fn build(state: AppState) -> Router {
        let config = state.config.clone();

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/api/chat", post(chat_handler))
            .route("/api/sandbox/run", get(sandbox_run_handler))
            .route("/api/sandbox/insurance", post(insurance_handler))
            .with_state(Arc::new(state));

        let app = if config.frontend_dir.is_dir() {
            info!(dir = %config.frontend_dir.display(), "Serving static frontend");
            app.fallback_service(ServeDir::new(&config.frontend_dir))
        } else {
            app
        };

        app.layer(cors_layer(&config))
            .layer(TraceLayer::new_for_http())
    }
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let list: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "agent-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/sandbox/run`: smoke-test the sandbox with a fixed command.
async fn sandbox_run_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProcessResult>, ApiError> {
    let request = ProcessRequest::new(DEMO_COMMAND, state.config.sandbox_timeout_ms);
    let result = state.sandbox.exec(&request).await?;
    info!(exit_code = result.exit_code, "Sandbox smoke test finished");
    Ok(Json(result))
}

/// `POST /api/sandbox/insurance`: generate the insurance PDF in the sandbox
/// and optionally email it.
async fn insurance_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InsuranceRequest>,
) -> Result<Json<InsuranceReport>, ApiError> {
    let report = state.insurance.process(&req.insurance_number).await?;
    Ok(Json(report))
}
