//! `hw_web` - Web server and API for hwlab
//!
//! This crate provides:
//! - axum-based HTTP server
//! - JSON API endpoints for sample ingestion and retrieval
//! - Prediction and synthetic-generation endpoints backed by the oracle

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use hw_config::WebConfig;
use hw_oracle::{select_context, Oracle, OracleError, SyntheticSample};
use hw_store::{
    HardwareConfig, HardwareRecord, HardwareSample, HwStore, RawSample, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Web server errors
#[derive(Error, Debug)]
pub enum WebError {
    /// Bulk-import payload was not an array of objects. Raised before any
    /// write is attempted.
    #[error("Expected an array of objects.")]
    InputShape,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Oracle error: {0}")]
    OracleError(#[from] OracleError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::InputShape => (StatusCode::BAD_REQUEST, self.to_string()),
            WebError::StoreError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            WebError::OracleError(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            WebError::ServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({ "error": message });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Shared application state
pub struct AppState {
    /// Database store, opened once at startup and injected here
    pub store: HwStore,
    /// External prediction capability
    pub oracle: Arc<dyn Oracle>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Create new app state with the given store and oracle
    pub fn new(store: HwStore, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            store,
            oracle,
            start_time: Instant::now(),
        }
    }
}

pub struct WebServer {
    state: Arc<AppState>,
    config: WebConfig,
}

impl WebServer {
    pub fn new(store: HwStore, oracle: Arc<dyn Oracle>, config: WebConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(store, oracle)),
            config,
        }
    }

    pub fn router(&self) -> Router {
        let mut router = create_router(self.state.clone());
        if let Some(cors) = build_cors_layer(&self.config) {
            router = router.layer(cors);
        }
        router
    }

    /// Bind and serve until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::ServerError`] if binding or serving fails.
    pub async fn run(&self) -> Result<(), WebError> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| WebError::ServerError(err.to_string()))?;
        tracing::info!(%addr, "Starting hwlab web server");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| WebError::ServerError(err.to_string()))?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}

fn build_cors_layer(config: &WebConfig) -> Option<CorsLayer> {
    if !config.cors_enabled {
        return None;
    }

    let mut layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    if config
        .cors_origins
        .iter()
        .any(|origin| origin.trim() == "*")
    {
        return Some(layer.allow_origin(Any));
    }

    let mut origins = Vec::new();
    for origin in &config.cors_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => origins.push(value),
            Err(_) => warn!(origin = %origin, "Invalid CORS origin; skipping"),
        }
    }

    if origins.is_empty() {
        Some(layer.allow_origin(Any))
    } else {
        Some(layer.allow_origin(AllowOrigin::list(origins)))
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/data", get(list_data_handler).post(insert_data_handler))
        .route("/data/bulk", post(bulk_import_handler))
        .route("/predict", post(predict_handler))
        .route("/generate", post(generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response for a single insert
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    pub id: i64,
}

/// Response for a bulk import
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkImportResponse {
    pub success: bool,
    pub count: usize,
}

/// Optional parameters for synthetic generation
#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    pub count: Option<usize>,
}

/// Response for synthetic generation. Records are returned to the client,
/// not persisted; saving them goes through the bulk import endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub records: Vec<SyntheticSample>,
    pub count: usize,
}

/// Default and cap for synthetic generation requests
const DEFAULT_GENERATE_COUNT: usize = 5;
const MAX_GENERATE_COUNT: usize = 20;

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> axum::response::Json<HealthResponse> {
    axum::response::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// All persisted records, most recent first, booleans as booleans
async fn list_data_handler(
    State(state): State<Arc<AppState>>,
) -> Result<axum::response::Json<Vec<HardwareRecord>>, WebError> {
    let records = state.store.list_records()?;
    Ok(axum::response::Json(records))
}

/// Insert one complete sample. Every field is required here; default-filling
/// only applies on the bulk path.
async fn insert_data_handler(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<HardwareSample>,
) -> Result<axum::response::Json<InsertResponse>, WebError> {
    let id = state.store.insert_sample(&sample)?;
    Ok(axum::response::Json(InsertResponse { id }))
}

/// Bulk import: the body must be a JSON array of objects. The shape check and
/// per-element parsing both happen before the store is touched, so a rejected
/// payload performs zero writes; the insert itself is one atomic transaction.
async fn bulk_import_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<axum::response::Json<BulkImportResponse>, WebError> {
    let serde_json::Value::Array(items) = body else {
        return Err(WebError::InputShape);
    };

    let mut samples = Vec::with_capacity(items.len());
    for item in items {
        let raw: RawSample =
            serde_json::from_value(item).map_err(|_| WebError::InputShape)?;
        samples.push(raw.normalize());
    }

    let count = state.store.insert_batch(&samples)?;
    Ok(axum::response::Json(BulkImportResponse {
        success: true,
        count,
    }))
}

/// Predict metrics for a candidate configuration. Reads the history, selects
/// the bounded context, then calls the oracle with no storage lock held.
/// Results are returned to the client and never persisted as a side effect.
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(config): Json<HardwareConfig>,
) -> Result<axum::response::Json<hw_store::PerformanceMetrics>, WebError> {
    let history = state.store.list_records()?;
    let context = select_context(history);

    let metrics = state.oracle.predict_metrics(&config, &context).await?;
    Ok(axum::response::Json(metrics))
}

/// Generate synthetic samples. Seeding is a convenience feature: an oracle
/// failure degrades to an empty list with a warning instead of an error.
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    params: Option<Json<GenerateParams>>,
) -> axum::response::Json<GenerateResponse> {
    let count = params
        .and_then(|Json(p)| p.count)
        .unwrap_or(DEFAULT_GENERATE_COUNT)
        .clamp(1, MAX_GENERATE_COUNT);

    let records = match state.oracle.generate_samples(count).await {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "Synthetic generation failed; returning empty set");
            Vec::new()
        }
    };

    let count = records.len();
    axum::response::Json(GenerateResponse { records, count })
}
