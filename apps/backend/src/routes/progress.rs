//! Progress, statistics and mistakes endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::validation;
use crate::AppState;

/// GET /v1/api/progress/:user_id
pub async fn level(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CardProgress>>>> {
    let user_id = validation::user_id(&user_id)?;
    let progress = state.store.level_progress(&user_id).await?;
    Ok(Json(ApiResponse::new(progress)))
}

/// GET /v1/api/stats/:user_id
pub async fn words(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<WordStats>>> {
    let user_id = validation::user_id(&user_id)?;
    let stats = state.store.word_stats(&user_id).await?;
    Ok(Json(ApiResponse::new(stats)))
}

/// GET /v1/api/mistakes/:user_id
pub async fn mistakes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CardTag>>>> {
    let user_id = validation::user_id(&user_id)?;
    let tags = state.store.recent_mistakes(&user_id, Utc::now()).await?;
    Ok(Json(ApiResponse::new(tags)))
}
