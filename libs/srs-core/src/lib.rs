//! Core scheduling library for the staged spaced-repetition backend.
//!
//! Provides:
//! - Stage table with per-stage review interval and failure penalty
//! - Review outcome transitions (stage state machine and due dates)
//! - Lesson and review selection with validated multi-key ordering
//! - Recency ordering and per-stage grouping for quiz summaries

pub mod error;
pub mod recency;
pub mod scheduler;
pub mod selection;
pub mod stages;
pub mod types;

pub use error::{Result, SrsError};
pub use recency::{group_by_stage, mistakes, most_recent, RecentReview};
pub use scheduler::{demotion_steps, ApplyMode, Scheduler, Transition, TransitionKind};
pub use selection::{select_due, select_first_due, select_lessons, DueCandidate, SortKeys};
pub use stages::{Stage, StageTable};
pub use types::{
    Card, CardProgress, CardTag, QuizSummary, RecentSelector, ReviewEvent, ReviewOutcome,
    ReviewResult, SortKey, StageId, UserCardStatus,
};
