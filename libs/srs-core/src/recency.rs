//! Recency ordering for quiz summaries.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::types::{QuizSummary, RecentSelector, ReviewResult, StageId};

/// One review event joined with its card word and the card's current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentReview {
    pub card_id: i64,
    pub card_word: String,
    pub success: bool,
    pub stage_id: StageId,
    pub review_date: DateTime<Utc>,
}

impl RecentReview {
    /// Absolute distance from `now`, in milliseconds.
    pub fn distance_from(&self, now: DateTime<Utc>) -> i64 {
        (self.review_date - now).num_milliseconds().abs()
    }
}

/// Keep, per card, the review closest to `now` and order cards by that
/// distance. Past and future reviews are treated symmetrically.
pub fn most_recent(
    reviews: impl IntoIterator<Item = RecentReview>,
    selector: &RecentSelector,
    now: DateTime<Utc>,
) -> Vec<ReviewResult> {
    let mut closest: HashMap<i64, RecentReview> = HashMap::new();

    for review in reviews {
        if let RecentSelector::Cards(ids) = selector {
            if !ids.contains(&review.card_id) {
                continue;
            }
        }
        match closest.get(&review.card_id) {
            Some(kept) if kept.distance_from(now) <= review.distance_from(now) => {}
            _ => {
                closest.insert(review.card_id, review);
            }
        }
    }

    let mut ordered: Vec<RecentReview> = closest.into_values().collect();
    ordered.sort_by_key(|r| (r.distance_from(now), r.card_id));

    if let RecentSelector::Limit(n) = selector {
        if *n > 0 {
            ordered.truncate(*n);
        }
    }

    ordered
        .into_iter()
        .map(|r| ReviewResult {
            card_id: r.card_id,
            card_word: r.card_word,
            success: r.success,
            stage_id: r.stage_id,
        })
        .collect()
}

/// Group results by stage, stages ascending, keeping the incoming order
/// inside each group.
pub fn group_by_stage(results: Vec<ReviewResult>) -> Vec<QuizSummary> {
    let mut groups: BTreeMap<StageId, Vec<ReviewResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.stage_id).or_default().push(result);
    }
    groups
        .into_iter()
        .map(|(stage_id, cards)| QuizSummary { stage_id, cards })
        .collect()
}

/// Results whose closest review was a failure, in their incoming order.
pub fn mistakes(results: Vec<ReviewResult>) -> Vec<ReviewResult> {
    results.into_iter().filter(|r| !r.success).collect()
}
