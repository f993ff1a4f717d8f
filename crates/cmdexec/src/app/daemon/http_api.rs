//! HTTP routes over the command controller.

mod error;

pub use error::ApiServerError;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::adapters::dto::{
    HealthResponse, ListResponse, StartRequest, StartResponse, StatusQuery, StatusResponse,
    StopRequest, StopResponse,
};
use crate::adapters::{ApiError, CommandController};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn build_router(controller: Arc<CommandController>) -> Router {
    Router::new()
        .route("/commands/start", post(start_command))
        .route("/commands/stop", post(stop_command))
        .route("/commands/status", get(command_status))
        .route("/commands", get(list_commands))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

async fn start_command(
    State(controller): State<Arc<CommandController>>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<StartResponse> {
    let Json(request) = payload.map_err(reject_json)?;
    run_blocking(move || controller.start(request)).await
}

async fn stop_command(
    State(controller): State<Arc<CommandController>>,
    payload: Result<Json<StopRequest>, JsonRejection>,
) -> ApiResult<StopResponse> {
    let Json(request) = payload.map_err(reject_json)?;
    run_blocking(move || controller.stop(request)).await
}

async fn command_status(
    State(controller): State<Arc<CommandController>>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<StatusResponse> {
    let Query(query) = query.map_err(|e| ApiError::malformed(e.body_text()))?;
    controller.status(query).map(Json)
}

async fn list_commands(State(controller): State<Arc<CommandController>>) -> Json<ListResponse> {
    Json(controller.list())
}

async fn health(State(controller): State<Arc<CommandController>>) -> Json<HealthResponse> {
    Json(controller.health())
}

fn reject_json(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection.body_text(), "Rejected request body");
    ApiError::malformed(rejection.body_text())
}

/// Spawning and the interrupt grace wait both block.
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::from(ApiServerError::Join(e.to_string())))?
        .map(Json)
}
