//! Database models and API types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

// Re-export shared types from srs-core
pub use srs_core::types::{
    Card, CardProgress, CardTag, QuizSummary, RecentSelector, ReviewEvent, ReviewOutcome,
    ReviewResult, SortKey, StageId, UserCardStatus,
};
pub use srs_core::{SortKeys, Stage};

// === Database Entity Types ===

/// Learner and the level they are currently studying
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub user_id: String,
    pub level: i32,
}

/// Card stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbCard {
    pub card_id: i64,
    pub word: String,
    pub translation: Json<Vec<String>>,
    pub word_type: String,
    pub gender: Option<String>,
    pub level: i32,
}

impl DbCard {
    /// Convert to core card type
    pub fn to_core_card(&self) -> Card {
        Card {
            card_id: self.card_id,
            word: self.word.clone(),
            translations: self.translation.0.clone(),
            word_type: self.word_type.clone(),
            gender: self.gender.clone(),
            level: self.level as u32,
        }
    }
}

/// Stage row seeded by migration
#[derive(Debug, Clone, FromRow)]
pub struct DbStage {
    pub stage_id: i32,
    pub interval_secs: i64,
    pub penalty: f64,
}

impl DbStage {
    pub fn to_core_stage(&self) -> Stage {
        Stage {
            stage_id: self.stage_id as StageId,
            interval_secs: self.interval_secs,
            penalty: self.penalty,
        }
    }
}

/// Per-user progress on a card
#[derive(Debug, Clone, FromRow)]
pub struct DbUserCardStatus {
    pub user_id: String,
    pub card_id: i64,
    pub stage_id: i32,
    pub next_review_date: DateTime<Utc>,
}

impl DbUserCardStatus {
    pub fn to_core_status(&self) -> UserCardStatus {
        UserCardStatus {
            user_id: self.user_id.clone(),
            card_id: self.card_id,
            stage_id: self.stage_id as StageId,
            next_review_date: self.next_review_date,
        }
    }
}

/// Review log record
#[derive(Debug, Clone, FromRow)]
pub struct DbReview {
    pub id: Uuid,
    pub user_id: String,
    pub card_id: i64,
    pub review_date: DateTime<Utc>,
    pub success: bool,
    pub previous_stage: i32,
    pub created_at: DateTime<Utc>,
}

impl DbReview {
    /// Create from a core review event
    pub fn from_event(event: &ReviewEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: event.user_id.clone(),
            card_id: event.card_id,
            review_date: event.review_date,
            success: event.success,
            previous_stage: event.previous_stage as i32,
            created_at: Utc::now(),
        }
    }
}

/// Review result row (most recent reviews)
#[derive(Debug, Clone, FromRow)]
pub struct DbReviewResult {
    pub card_id: i64,
    pub card_word: String,
    pub success: bool,
    pub stage_id: i32,
}

impl DbReviewResult {
    pub fn to_core_result(&self) -> ReviewResult {
        ReviewResult {
            card_id: self.card_id,
            card_word: self.card_word.clone(),
            success: self.success,
            stage_id: self.stage_id as StageId,
        }
    }
}

/// Card progress row
#[derive(Debug, Clone, FromRow)]
pub struct DbCardProgress {
    pub card_id: i64,
    pub card_word: String,
    pub stage_id: i32,
}

impl DbCardProgress {
    pub fn to_core_progress(&self) -> CardProgress {
        CardProgress {
            card_id: self.card_id,
            card_word: self.card_word.clone(),
            stage_id: self.stage_id as StageId,
        }
    }
}

/// Card whose closest review was a failure
#[derive(Debug, Clone, FromRow)]
pub struct DbCardTag {
    pub card_id: i64,
    pub word: String,
    pub word_type: String,
}

impl DbCardTag {
    pub fn to_core_tag(&self) -> CardTag {
        CardTag {
            card_id: self.card_id,
            word: self.word.clone(),
            word_type: self.word_type.clone(),
        }
    }
}

/// Word count for one (stage, word type) bucket
#[derive(Debug, Clone, FromRow)]
pub struct DbWordStat {
    pub stage_id: i32,
    pub word_type: String,
    pub count: i64,
}

/// Started card counts keyed by stage, then word type
pub type WordStats = BTreeMap<StageId, BTreeMap<String, i64>>;

// === API Request/Response Types ===

/// Envelope for successful responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub store: String,
    pub max_stage: StageId,
}

// Lesson types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LessonsQuery {
    pub num_cards: Option<i64>,
}

// Quiz types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuizQuery {
    pub num_cards: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonsResponse {
    pub cards: Vec<Card>,
    pub card_ids: Vec<i64>,
    pub total: usize,
}

/// Card id list (starting lessons, quiz summaries by card)
#[derive(Debug, Serialize, Deserialize)]
pub struct CardIdsRequest {
    pub card_ids: Option<Vec<i64>>,
}

// Review types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReviewsQuery {
    pub first_review: Option<bool>,
    pub sort: Option<String>,
    pub num_cards: Option<i64>,
}

/// Review outcome as submitted; required fields are checked by validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub card_id: Option<i64>,
    pub review_date: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub incorrect_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingCountResponse {
    pub count: i64,
}

// Seed file for the memory store
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedUser {
    pub user_id: String,
    pub level: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemorySeed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub cards: Vec<Card>,
}
