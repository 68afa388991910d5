//! Liveness endpoint

use axum::{extract::State, Json};

use crate::models::*;
use crate::AppState;

/// GET /v1/api/status
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    Json(ApiResponse::new(StatusResponse {
        status: "ok".to_string(),
        store: state.store.kind().to_string(),
        max_stage: state.scheduler.max_stage(),
    }))
}
