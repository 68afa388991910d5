//! Request validation, run by handlers before any store call

use crate::error::{ApiError, Result};
use crate::models::{CardIdsRequest, ReviewOutcome, ReviewRequest, ReviewsQuery, SortKeys};

/// User ids are numeric strings
pub fn user_id(raw: &str) -> Result<String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest("Invalid user_id".to_string()));
    }
    Ok(raw.to_string())
}

/// Card count cap; absent or 0 means unlimited
pub fn limit(num_cards: Option<i64>) -> Result<usize> {
    match num_cards {
        None => Ok(0),
        Some(n) if n < 0 => Err(ApiError::BadRequest(
            "num_cards must be greater than or equal to 0".to_string(),
        )),
        Some(n) => Ok(n as usize),
    }
}

/// Comma separated sort keys, rejecting unknown names and conflicts
pub fn sort_keys(raw: Option<&str>) -> Result<SortKeys> {
    Ok(SortKeys::parse(raw.unwrap_or_default())?)
}

/// Collect review query parameters. Repeated `sort` values are joined in
/// order, so `sort=a&sort=b` reads as `sort=a,b`.
pub fn reviews_query(pairs: Vec<(String, String)>) -> Result<ReviewsQuery> {
    let mut query = ReviewsQuery::default();
    let mut sort = Vec::new();

    for (key, value) in pairs {
        match key.as_str() {
            "sort" => sort.push(value),
            "num_cards" => {
                let n = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid num_cards: {}", value)))?;
                query.num_cards = Some(n);
            }
            "first_review" => {
                let first = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid first_review: {}", value)))?;
                query.first_review = Some(first);
            }
            _ => {}
        }
    }

    if !sort.is_empty() {
        query.sort = Some(sort.join(","));
    }
    Ok(query)
}

/// Check a submitted review has every field the scheduler needs
pub fn review(request: ReviewRequest) -> Result<ReviewOutcome> {
    let card_id = request
        .card_id
        .ok_or_else(|| ApiError::BadRequest("card_id is required".to_string()))?;
    let review_date = request
        .review_date
        .ok_or_else(|| ApiError::BadRequest("review_date is required".to_string()))?;
    let success = request
        .success
        .ok_or_else(|| ApiError::BadRequest("success is required".to_string()))?;
    let incorrect_count = request
        .incorrect_count
        .ok_or_else(|| ApiError::BadRequest("incorrect_count is required".to_string()))?;

    let incorrect_count = u32::try_from(incorrect_count).map_err(|_| {
        ApiError::BadRequest("incorrect_count must be a non-negative integer".to_string())
    })?;

    Ok(ReviewOutcome {
        card_id,
        review_date,
        success,
        incorrect_count,
    })
}

/// Non-empty card id list
pub fn card_ids(request: CardIdsRequest) -> Result<Vec<i64>> {
    match request.card_ids {
        Some(ids) if !ids.is_empty() => Ok(ids),
        _ => Err(ApiError::BadRequest("card_ids is required".to_string())),
    }
}
