//! Core types for the staged review scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage identifier. Stage 0 means "introduced but never reviewed".
pub type StageId = u32;

/// Vocabulary card as seen by the scheduler.
///
/// Only `level` and `word` take part in scheduling; the other fields are
/// carried through so selections can be serialized without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_id: i64,
    pub word: String,
    #[serde(default)]
    pub translations: Vec<String>,
    pub word_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub level: u32,
}

/// Per-user progress on one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCardStatus {
    pub user_id: String,
    pub card_id: i64,
    pub stage_id: StageId,
    pub next_review_date: DateTime<Utc>,
}

impl UserCardStatus {
    /// Whether the card should surface in the review set at `now`.
    pub fn is_due(&self, now: DateTime<Utc>, max_stage: StageId) -> bool {
        self.stage_id < max_stage && self.next_review_date <= now
    }
}

/// Append-only record of a single outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub user_id: String,
    pub card_id: i64,
    pub review_date: DateTime<Utc>,
    pub success: bool,
    pub previous_stage: StageId,
}

/// Outcome of one review submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub card_id: i64,
    pub review_date: DateTime<Utc>,
    pub success: bool,
    pub incorrect_count: u32,
}

/// Result returned after an outcome and by recency queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub card_id: i64,
    pub card_word: String,
    pub success: bool,
    pub stage_id: StageId,
}

/// Quiz results sharing the same current stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub stage_id: StageId,
    pub cards: Vec<ReviewResult>,
}

/// Stage reached by a card at the user's current level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardProgress {
    pub card_id: i64,
    pub card_word: String,
    pub stage_id: StageId,
}

/// Card reference listed among recent mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTag {
    pub card_id: i64,
    pub word: String,
    pub word_type: String,
}

/// One ordering key for review selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    DateAsc,
    DateDesc,
    LevelAsc,
    LevelDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateAsc => "date_asc",
            Self::DateDesc => "date_desc",
            Self::LevelAsc => "level_asc",
            Self::LevelDesc => "level_desc",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "date_asc" => Some(Self::DateAsc),
            "date_desc" => Some(Self::DateDesc),
            "level_asc" => Some(Self::LevelAsc),
            "level_desc" => Some(Self::LevelDesc),
            _ => None,
        }
    }

    /// The key ordering the same dimension in the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Self::DateAsc => Self::DateDesc,
            Self::DateDesc => Self::DateAsc,
            Self::LevelAsc => Self::LevelDesc,
            Self::LevelDesc => Self::LevelAsc,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, Self::DateDesc | Self::LevelDesc)
    }
}

/// Which review events a recency query should consider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentSelector {
    /// The `n` cards reviewed closest to now. Zero means unlimited.
    Limit(usize),
    /// Exactly these cards.
    Cards(Vec<i64>),
}
