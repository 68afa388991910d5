//! Quiz summary endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::validation;
use crate::AppState;
use srs_core::group_by_stage;

/// GET /v1/api/quiz_summary/:user_id
pub async fn by_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: std::result::Result<Query<QuizQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<QuizSummary>>>> {
    let user_id = validation::user_id(&user_id)?;
    let Query(query) = query?;
    let limit = validation::limit(query.num_cards)?;

    summarize(&state, &user_id, RecentSelector::Limit(limit)).await
}

/// POST /v1/api/quiz_summary/:user_id
pub async fn by_cards(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CardIdsRequest>,
) -> Result<Json<ApiResponse<Vec<QuizSummary>>>> {
    let user_id = validation::user_id(&user_id)?;
    let card_ids = validation::card_ids(request)?;

    summarize(&state, &user_id, RecentSelector::Cards(card_ids)).await
}

async fn summarize(
    state: &AppState,
    user_id: &str,
    selector: RecentSelector,
) -> Result<Json<ApiResponse<Vec<QuizSummary>>>> {
    state.store.user_level(user_id).await?;
    let results = state
        .store
        .most_recent(user_id, &selector, Utc::now())
        .await?;

    Ok(Json(ApiResponse::new(group_by_stage(results))))
}
