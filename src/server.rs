use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::config::Config;
use crate::dispatch::GosearchRunner;
use crate::error::{ProxyError, validate_username};
use crate::parsers::ReportParser;
use crate::parsers::gosearch::GosearchParser;
use crate::response::{ErrorResponse, HealthResponse, SearchResponse};

#[derive(Clone)]
pub struct AppState {
    runner: Arc<GosearchRunner>,
    parser: Arc<dyn ReportParser>,
}

impl AppState {
    pub fn new(runner: GosearchRunner, parser: impl ReportParser + 'static) -> Self {
        Self {
            runner: Arc::new(runner),
            parser: Arc::new(parser),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GosearchRunner::new(config.locator.clone(), config.search_timeout),
            GosearchParser::new(config.markers.clone()),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    username: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/health", get(health))
        .with_state(state)
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ProxyError> {
    let username = validate_username(params.username.as_deref())?;
    let start = Instant::now();

    let report = state.runner.run(&username).await.inspect_err(|e| {
        tracing::warn!(username = %username, "search failed: {e}");
    })?;

    let results = state.parser.parse(&report.stdout);
    tracing::info!(
        username = %username,
        exit_code = report.exit_code,
        results = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search complete"
    );

    Ok(Json(SearchResponse::new(report, results)))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
