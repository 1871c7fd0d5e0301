//! Relay server implementation.

use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
const UPSTREAM_API_VERSION: &str = "2023-06-01";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// The server-side generation credential. `None` makes the relay fail
    /// closed: it never forwards a keyless request.
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub api_version: String,
    pub enable_cors: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8710,
            api_key: None,
            upstream_url: UPSTREAM_URL.to_string(),
            api_version: UPSTREAM_API_VERSION.to_string(),
            enable_cors: true,
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with the credential taken from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared relay state.
#[derive(Clone)]
pub struct RelayState {
    config: RelayConfig,
    client: reqwest::Client,
    start_time: Instant,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
}

async fn health_check(State(state): State<RelayState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Forward a recap request upstream with the server-side credential.
///
/// The body is opaque here: whatever the client assembled is what the
/// upstream sees. The upstream status and body are mirrored back verbatim
/// so the client can diagnose failures.
async fn generate_recap(
    State(state): State<RelayState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(api_key) = state.config.api_key.as_deref() else {
        tracing::error!("generation credential not configured in environment");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "API key not configured on server" })),
        )
            .into_response();
    };

    let upstream = state
        .client
        .post(&state.config.upstream_url)
        .header("x-api-key", api_key)
        .header("anthropic-version", &state.config.api_version)
        .timeout(UPSTREAM_TIMEOUT)
        .json(&body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "upstream request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Internal server error",
                    "message": err.to_string(),
                })),
            )
                .into_response();
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let bytes = upstream.bytes().await.unwrap_or_default();
    if !status.is_success() {
        tracing::warn!(%status, "upstream returned an error payload");
    }

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response()
}

/// Build the relay router. Method routing answers non-POST requests to the
/// recap endpoint with 405.
pub fn router(state: RelayState) -> Router {
    let enable_cors = state.config.enable_cors;
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/generate-recap", post(generate_recap))
        .with_state(state);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http())
}

/// Run the relay until ctrl-c.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;
    if config.api_key.is_none() {
        tracing::warn!("no generation credential configured; recap requests will fail closed");
    }

    let app = router(RelayState::new(config));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .context("failed to bind relay address")?;
    tracing::info!("recap relay listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down recap relay");
        })
        .await
        .context("relay server error")
}
