//! Error types for srs-core.

use thiserror::Error;

/// Result type alias using SrsError.
pub type Result<T> = std::result::Result<T, SrsError>;

/// Errors raised by stage lookups, transition planning and input validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SrsError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid transition for card {card_id}: {reason}")]
    InvalidTransition { card_id: i64, reason: String },

    #[error("unknown stage {0}")]
    UnknownStage(u32),

    #[error("invalid stage table: {0}")]
    InvalidStageTable(String),

    #[error("conflicting sort keys: {0} and {1}")]
    ConflictingSort(&'static str, &'static str),

    #[error("invalid sort key: {0}")]
    InvalidSortKey(String),
}

impl SrsError {
    pub fn card_not_found(card_id: i64) -> Self {
        Self::NotFound {
            entity: "card",
            id: card_id.to_string(),
        }
    }

    pub fn user_not_found(user_id: &str) -> Self {
        Self::NotFound {
            entity: "user",
            id: user_id.to_string(),
        }
    }
}
