//! Staged review scheduler.
//!
//! Turns a review outcome into a [`Transition`]: the stage before and after,
//! the next due date, and whether the progress row is created or updated.
//! Stores apply a transition as one unit together with its review event.

use chrono::{DateTime, Utc};

use crate::error::{Result, SrsError};
use crate::stages::StageTable;
use crate::types::{ReviewEvent, ReviewOutcome, ReviewResult, StageId, UserCardStatus};

/// How an outcome may treat a missing progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// First contact creates the row.
    Upsert,
    /// The row must already exist.
    UpdateOnly,
}

/// Whether a transition inserts or updates the progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Create,
    Update,
}

/// A planned change to one `(user, card)` progress row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub card_id: i64,
    pub kind: TransitionKind,
    pub success: bool,
    pub review_date: DateTime<Utc>,
    pub previous_stage: StageId,
    pub new_stage: StageId,
    pub next_review_date: DateTime<Utc>,
}

impl Transition {
    /// Review event to append alongside the status write.
    pub fn review_event(&self, user_id: &str) -> ReviewEvent {
        ReviewEvent {
            user_id: user_id.to_string(),
            card_id: self.card_id,
            review_date: self.review_date,
            success: self.success,
            previous_stage: self.previous_stage,
        }
    }

    /// Status row as it looks after the transition.
    pub fn status(&self, user_id: &str) -> UserCardStatus {
        UserCardStatus {
            user_id: user_id.to_string(),
            card_id: self.card_id,
            stage_id: self.new_stage,
            next_review_date: self.next_review_date,
        }
    }

    pub fn result(&self, card_word: impl Into<String>) -> ReviewResult {
        ReviewResult {
            card_id: self.card_id,
            card_word: card_word.into(),
            success: self.success,
            stage_id: self.new_stage,
        }
    }
}

/// Stages lost per unit of penalty for a failed review.
///
/// Half the incorrect count, rounded to one decimal place, then ceiled.
/// The rounding step is a no-op for whole counts but kept so fractional
/// inputs behave the same way they always have.
pub fn demotion_steps(incorrect_count: u32) -> f64 {
    let half = f64::from(incorrect_count) / 2.0;
    ((half * 10.0).round() / 10.0).ceil()
}

/// Scheduler bound to a validated stage table.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    stages: StageTable,
}

impl Scheduler {
    pub fn new(stages: StageTable) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &StageTable {
        &self.stages
    }

    pub fn max_stage(&self) -> StageId {
        self.stages.max_stage()
    }

    /// Stage reached from `current` after an outcome.
    ///
    /// Stage 0 always moves to 1. Success climbs one stage, capped at the
    /// mastered stage. Failure drops by `demotion_steps * penalty(current)`
    /// but never below 1.
    pub fn next_stage(&self, current: StageId, success: bool, incorrect_count: u32) -> Result<StageId> {
        let penalty = self.stages.penalty(current)?;

        if current == 0 {
            return Ok(1);
        }
        if success {
            return Ok((current + 1).min(self.max_stage()));
        }

        let demoted = f64::from(current) - demotion_steps(incorrect_count) * penalty;
        Ok(demoted.max(1.0).round() as StageId)
    }

    /// Plan the effect of a review outcome on a row currently at `current`
    /// (`None` when the user has never touched the card).
    pub fn plan_outcome(
        &self,
        current: Option<StageId>,
        outcome: &ReviewOutcome,
        mode: ApplyMode,
    ) -> Result<Transition> {
        let (kind, previous_stage) = match (current, mode) {
            (Some(stage), _) => (TransitionKind::Update, stage),
            (None, ApplyMode::Upsert) => (TransitionKind::Create, 0),
            (None, ApplyMode::UpdateOnly) => {
                return Err(SrsError::InvalidTransition {
                    card_id: outcome.card_id,
                    reason: "no progress recorded for this card".to_string(),
                })
            }
        };

        let new_stage = self.next_stage(previous_stage, outcome.success, outcome.incorrect_count)?;
        let next_review_date = outcome.review_date + self.stages.interval(new_stage)?;

        Ok(Transition {
            card_id: outcome.card_id,
            kind,
            success: outcome.success,
            review_date: outcome.review_date,
            previous_stage,
            new_stage,
            next_review_date,
        })
    }

    /// Plan the introduction of a card in a lesson: the row is created at
    /// stage 0 and an introduction event is logged.
    ///
    /// The event is recorded as a success from stage 0, so until the first
    /// real review the card shows up in recency queries (quiz summaries) as a
    /// successful stage-0 entry and never as a mistake.
    pub fn plan_introduction(
        &self,
        current: Option<StageId>,
        card_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        if current.is_some() {
            return Err(SrsError::InvalidTransition {
                card_id,
                reason: "lesson already started".to_string(),
            });
        }

        Ok(Transition {
            card_id,
            kind: TransitionKind::Create,
            success: true,
            review_date: now,
            previous_stage: 0,
            new_stage: 0,
            next_review_date: now + self.stages.interval(0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Stage;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn outcome(card_id: i64, success: bool, incorrect_count: u32, review_date: DateTime<Utc>) -> ReviewOutcome {
        ReviewOutcome {
            card_id,
            review_date,
            success,
            incorrect_count,
        }
    }

    #[test]
    fn demotion_steps_rounds_half_up() {
        assert_eq!(demotion_steps(0), 0.0);
        assert_eq!(demotion_steps(1), 1.0);
        assert_eq!(demotion_steps(2), 1.0);
        assert_eq!(demotion_steps(3), 2.0);
        assert_eq!(demotion_steps(4), 2.0);
        assert_eq!(demotion_steps(7), 4.0);
    }

    #[test]
    fn stage_zero_always_moves_to_one() {
        let scheduler = Scheduler::default();
        for success in [true, false] {
            for n in 0..10 {
                assert_eq!(scheduler.next_stage(0, success, n).unwrap(), 1);
            }
        }
    }

    #[test]
    fn success_climbs_and_caps_at_max() {
        let scheduler = Scheduler::default();
        let max = scheduler.max_stage();
        for current in 1..=max {
            for n in 0..4 {
                assert_eq!(
                    scheduler.next_stage(current, true, n).unwrap(),
                    (current + 1).min(max)
                );
            }
        }
    }

    #[test]
    fn failure_never_drops_below_one() {
        let scheduler = Scheduler::default();
        for current in 1..=scheduler.max_stage() {
            for n in 0..20 {
                assert!(scheduler.next_stage(current, false, n).unwrap() >= 1);
            }
        }
    }

    #[test]
    fn failure_scales_with_incorrect_count_and_penalty() {
        let scheduler = Scheduler::default();
        // stage 5 carries penalty 2
        assert_eq!(scheduler.next_stage(5, false, 0).unwrap(), 5);
        assert_eq!(scheduler.next_stage(5, false, 1).unwrap(), 3);
        assert_eq!(scheduler.next_stage(5, false, 2).unwrap(), 3);
        assert_eq!(scheduler.next_stage(5, false, 3).unwrap(), 1);
        // stage 3 carries penalty 1
        assert_eq!(scheduler.next_stage(3, false, 2).unwrap(), 2);
    }

    #[test]
    fn fractional_penalty_rounds_to_nearest_stage() {
        let stages = StageTable::new(vec![
            Stage::new(0, Duration::zero(), 0.0),
            Stage::new(1, Duration::days(1), 1.0),
            Stage::new(2, Duration::days(1), 1.0),
            Stage::new(3, Duration::days(1), 1.0),
            Stage::new(4, Duration::days(1), 1.5),
        ])
        .unwrap();
        let scheduler = Scheduler::new(stages);
        // 4 - 1 * 1.5 = 2.5
        assert_eq!(scheduler.next_stage(4, false, 2).unwrap(), 3);
    }

    #[test]
    fn unknown_current_stage_fails() {
        let scheduler = Scheduler::default();
        assert_eq!(
            scheduler.next_stage(12, true, 0),
            Err(SrsError::UnknownStage(12))
        );
    }

    #[test]
    fn fresh_card_failing_twice_stays_on_stage_one() {
        let stages = StageTable::new(vec![
            Stage::new(0, Duration::zero(), 0.0),
            Stage::new(1, Duration::days(1), 1.0),
        ])
        .unwrap();
        let scheduler = Scheduler::new(stages);

        let first = scheduler
            .plan_outcome(None, &outcome(4, false, 2, at(8)), ApplyMode::Upsert)
            .unwrap();
        assert_eq!(first.kind, TransitionKind::Create);
        assert_eq!(first.previous_stage, 0);
        assert_eq!(first.new_stage, 1);
        assert_eq!(first.next_review_date, at(8) + Duration::days(1));

        let second = scheduler
            .plan_outcome(Some(first.new_stage), &outcome(4, false, 2, at(12)), ApplyMode::Upsert)
            .unwrap();
        assert_eq!(second.kind, TransitionKind::Update);
        assert_eq!(second.previous_stage, 1);
        assert_eq!(second.new_stage, 1);
        assert_eq!(second.next_review_date, at(12) + Duration::days(1));
    }

    #[test]
    fn due_date_uses_new_stage_interval() {
        let scheduler = Scheduler::default();
        let plan = scheduler
            .plan_outcome(Some(2), &outcome(1, true, 0, at(0)), ApplyMode::UpdateOnly)
            .unwrap();
        assert_eq!(plan.new_stage, 3);
        assert_eq!(plan.next_review_date, at(0) + Duration::days(1));
    }

    #[test]
    fn update_only_requires_existing_row() {
        let scheduler = Scheduler::default();
        let err = scheduler
            .plan_outcome(None, &outcome(9, true, 0, at(0)), ApplyMode::UpdateOnly)
            .unwrap_err();
        assert!(matches!(err, SrsError::InvalidTransition { card_id: 9, .. }));
    }

    #[test]
    fn mastered_card_stays_mastered_on_success() {
        let scheduler = Scheduler::default();
        let plan = scheduler
            .plan_outcome(Some(9), &outcome(1, true, 0, at(0)), ApplyMode::UpdateOnly)
            .unwrap();
        assert_eq!(plan.new_stage, 9);
    }

    #[test]
    fn introduction_creates_stage_zero_due_now() {
        let scheduler = Scheduler::default();
        let plan = scheduler.plan_introduction(None, 3, at(10)).unwrap();
        assert_eq!(plan.kind, TransitionKind::Create);
        assert_eq!(plan.new_stage, 0);
        assert_eq!(plan.next_review_date, at(10));
        assert!(plan.success);

        let event = plan.review_event("42");
        assert_eq!(event.previous_stage, 0);
        assert_eq!(event.user_id, "42");
    }

    #[test]
    fn introduction_of_started_card_fails() {
        let scheduler = Scheduler::default();
        let err = scheduler.plan_introduction(Some(0), 3, at(10)).unwrap_err();
        assert!(matches!(err, SrsError::InvalidTransition { card_id: 3, .. }));
    }

    #[test]
    fn transition_result_reports_new_stage() {
        let scheduler = Scheduler::default();
        let plan = scheduler
            .plan_outcome(Some(4), &outcome(2, false, 1, at(0)), ApplyMode::Upsert)
            .unwrap();
        let result = plan.result("chat");
        assert_eq!(
            result,
            ReviewResult {
                card_id: 2,
                card_word: "chat".to_string(),
                success: false,
                stage_id: 2,
            }
        );
    }
}
