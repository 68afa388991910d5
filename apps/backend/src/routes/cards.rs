//! Card catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::*;
use crate::AppState;
use srs_core::SrsError;

/// GET /v1/api/card/:card_id
pub async fn get(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
) -> Result<Json<ApiResponse<Card>>> {
    let card = state
        .store
        .get_card(card_id)
        .await?
        .ok_or_else(|| SrsError::card_not_found(card_id))?;

    Ok(Json(ApiResponse::new(card)))
}
