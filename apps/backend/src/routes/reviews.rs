//! Review endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::validation;
use crate::AppState;
use srs_core::ApplyMode;

/// GET /v1/api/reviews/:user_id
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Card>>>> {
    let user_id = validation::user_id(&user_id)?;
    let Query(pairs) = query?;
    let query = validation::reviews_query(pairs)?;
    let sort = validation::sort_keys(query.sort.as_deref())?;
    let limit = validation::limit(query.num_cards)?;

    state.store.user_level(&user_id).await?;
    let cards = state
        .store
        .select_due(&user_id, &sort, limit, Utc::now(), state.scheduler.max_stage())
        .await?;

    Ok(Json(ApiResponse::new(cards)))
}

/// GET /v1/api/reviews/:user_id/next
///
/// With `first_review=true` only cards still awaiting their first review are
/// considered, whatever their due date. Responds 204 when nothing is due.
pub async fn next(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response> {
    let user_id = validation::user_id(&user_id)?;
    let Query(pairs) = query?;
    let query = validation::reviews_query(pairs)?;
    let sort = validation::sort_keys(query.sort.as_deref())?;
    let max_stage = state.scheduler.max_stage();

    state.store.user_level(&user_id).await?;
    let card = if query.first_review.unwrap_or(false) {
        state.store.select_first_due(&user_id, &sort, max_stage).await?
    } else {
        state
            .store
            .select_due(&user_id, &sort, 1, Utc::now(), max_stage)
            .await?
            .into_iter()
            .next()
    };

    Ok(match card {
        Some(card) => Json(ApiResponse::new(card)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /v1/api/reviews/:user_id
pub async fn submit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResult>>> {
    apply(state, &user_id, request, ApplyMode::Upsert).await
}

/// PUT /v1/api/reviews/:user_id
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResult>>> {
    apply(state, &user_id, request, ApplyMode::UpdateOnly).await
}

async fn apply(
    state: AppState,
    user_id: &str,
    request: ReviewRequest,
    mode: ApplyMode,
) -> Result<Json<ApiResponse<ReviewResult>>> {
    let user_id = validation::user_id(user_id)?;
    let outcome = validation::review(request)?;

    let result = state
        .store
        .apply_outcome(&user_id, &outcome, mode, &state.scheduler)
        .await?;

    Ok(Json(ApiResponse::new(result)))
}

/// GET /v1/api/reviews/:user_id/count
pub async fn count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<PendingCountResponse>>> {
    let user_id = validation::user_id(&user_id)?;

    state.store.user_level(&user_id).await?;
    let count = state
        .store
        .count_pending(&user_id, Utc::now(), state.scheduler.max_stage())
        .await?;

    Ok(Json(ApiResponse::new(PendingCountResponse { count })))
}
