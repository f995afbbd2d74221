use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::json;
use std::sync::Arc;

use crate::config::Settings;
use crate::data::{ScheduleRequest, ScheduleResponse};
use crate::error::ScheduleError;
use crate::solver;

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

/// Error body returned to HTTP clients.
pub struct ApiError(StatusCode, String);

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        let status = match &e {
            ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
            ScheduleError::NoFeasibleSchedule { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::Solver(_) | ScheduleError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // 422 is reserved for infeasible schedules
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => rejection.status(),
        };
        ApiError(status, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

async fn optimize_handler(
    State(state): State<AppState>,
    input: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let Json(input) = input?;
    let settings = Arc::clone(&state.settings);
    // CPU-bound; keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || solver::solve(&input, &settings))
        .await
        .map_err(|e| {
            error!("Solve task failed: {e}");
            ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })??;

    Ok(Json(ScheduleResponse {
        common_schedule: outcome.schedule,
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/solver/optimize", post(optimize_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(settings: Settings) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    let app = router(AppState::new(settings));
    axum::serve(listener, app).await
}
