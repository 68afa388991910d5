//! Lesson endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::validation;
use crate::AppState;

/// GET /v1/api/lessons/:user_id
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: std::result::Result<Query<LessonsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<LessonsResponse>>> {
    let user_id = validation::user_id(&user_id)?;
    let Query(query) = query?;
    let limit = validation::limit(query.num_cards)?;

    let level = state.store.user_level(&user_id).await?;
    let cards = state.store.select_lessons(&user_id, level, limit).await?;

    let card_ids = cards.iter().map(|c| c.card_id).collect();
    let total = cards.len();

    Ok(Json(ApiResponse::new(LessonsResponse {
        cards,
        card_ids,
        total,
    })))
}

/// POST /v1/api/lessons/:user_id
pub async fn start(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CardIdsRequest>,
) -> Result<Json<ApiResponse<Vec<ReviewResult>>>> {
    let user_id = validation::user_id(&user_id)?;
    let card_ids = validation::card_ids(request)?;

    let results = state
        .store
        .start_lessons(&user_id, &card_ids, Utc::now(), &state.scheduler)
        .await?;

    Ok(Json(ApiResponse::new(results)))
}
