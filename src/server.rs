//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/search` | Explained search: `{query, top_k?}` |
//! | `GET`  | `/profiles` | Profile table rows |
//! | `POST` | `/profiles` | Create or update a profile |
//! | `GET`  | `/profiles/indexed` | Documents currently in the vector index |
//! | `GET`  | `/profiles/count` | Number of indexed documents |
//! | `POST` | `/reindex` | Rebuild the index from the table |
//! | `GET`  | `/api/org-data` | Org chart rows |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation", "message": "Error: Email is required" } }
//! ```
//!
//! Error codes: `validation` (400), `not_found` (404), `malformed_explanation` (502),
//! `search_unavailable` (503), `persistence` / `sync_failure` / `internal` (500).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::FinderError;
use crate::finder::{PeopleFinder, UpsertOutcome};
use crate::models::{IndexedDocument, ProfileInput, ProfileRecord};
use crate::orgchart::{load_org_chart, OrgNode};
use crate::search::SearchOutcome;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<PeopleFinder>,
    pub org_chart_path: PathBuf,
    pub default_top_k: usize,
}

impl AppState {
    pub fn new(finder: Arc<PeopleFinder>, config: &Config) -> Self {
        Self {
            finder,
            org_chart_path: config.org_chart.path.clone(),
            default_top_k: config.retrieval.top_k,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/profiles", get(handle_list_profiles).post(handle_upsert))
        .route("/profiles/indexed", get(handle_indexed))
        .route("/profiles/count", get(handle_count))
        .route("/reindex", post(handle_reindex))
        .route("/api/org-data", get(handle_org_data))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let finder = Arc::new(PeopleFinder::open(config).await?);
    let app = router(AppState::new(finder, config));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("people finder listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"validation"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FinderError> for AppError {
    fn from(err: FinderError) -> Self {
        let status = match &err {
            FinderError::Validation(_) => StatusCode::BAD_REQUEST,
            FinderError::SearchUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FinderError::MalformedExplanation(_) => StatusCode::BAD_GATEWAY,
            FinderError::Persistence(_) | FinderError::SyncFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::warn!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    let outcome = state.finder.search(&req.query, top_k).await?;
    Ok(Json(outcome))
}

// ============ /profiles ============

async fn handle_list_profiles(State(state): State<AppState>) -> Json<Vec<ProfileRecord>> {
    Json(state.finder.profiles().await)
}

async fn handle_upsert(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<UpsertOutcome>, AppError> {
    Ok(Json(state.finder.upsert(&input).await?))
}

async fn handle_indexed(
    State(state): State<AppState>,
) -> Result<Json<Vec<IndexedDocument>>, AppError> {
    Ok(Json(state.finder.indexed().await?))
}

#[derive(Serialize)]
struct CountResponse {
    count: usize,
}

async fn handle_count(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.finder.count().await?;
    Ok(Json(CountResponse { count }))
}

async fn handle_reindex(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.finder.reindex().await?;
    Ok(Json(CountResponse { count }))
}

// ============ GET /api/org-data ============

async fn handle_org_data(State(state): State<AppState>) -> Result<Json<Vec<OrgNode>>, AppError> {
    if !state.org_chart_path.exists() {
        return Err(not_found(format!(
            "org chart file not found: {}",
            state.org_chart_path.display()
        )));
    }
    let nodes = load_org_chart(&state.org_chart_path).map_err(|e| internal(format!("{:#}", e)))?;
    Ok(Json(nodes))
}
