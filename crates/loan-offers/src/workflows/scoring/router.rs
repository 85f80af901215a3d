use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::service::{PredictRequest, PredictResponse, ScoringError, ScoringService};

/// Router builder exposing the scoring endpoints.
pub fn scoring_router(service: Arc<ScoringService>) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

pub(crate) async fn predict_handler(
    State(service): State<Arc<ScoringService>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, Response> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed predict request");
        detail_response(rejection.body_text())
    })?;

    let response = service
        .predict(&request)
        .map_err(IntoResponse::into_response)?;
    Ok(Json(response))
}

pub(crate) async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn detail_response(detail: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        detail_response(self.to_string())
    }
}
