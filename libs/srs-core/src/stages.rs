//! Stage table: review interval and failure penalty per stage.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrsError};
use crate::types::StageId;

/// A single configured stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub stage_id: StageId,
    /// Seconds added to the review timestamp when a card lands on this stage.
    pub interval_secs: i64,
    /// Stages lost per rounded half of the incorrect count when failing here.
    pub penalty: f64,
}

impl Stage {
    pub fn new(stage_id: StageId, interval: Duration, penalty: f64) -> Self {
        Self {
            stage_id,
            interval_secs: interval.num_seconds(),
            penalty,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::seconds(self.interval_secs)
    }
}

/// Validated, read-only stage configuration.
///
/// Stage ids are contiguous from 0, so lookups index straight into the
/// backing vector. The highest stage is "mastered".
#[derive(Debug, Clone, PartialEq)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    /// Build a table, rejecting gaps, a penalized stage 0, non-positive
    /// penalties elsewhere and negative intervals.
    pub fn new(mut stages: Vec<Stage>) -> Result<Self> {
        if stages.len() < 2 {
            return Err(SrsError::InvalidStageTable(
                "at least stages 0 and 1 are required".to_string(),
            ));
        }

        stages.sort_by_key(|s| s.stage_id);

        for (expected, stage) in stages.iter().enumerate() {
            if stage.stage_id as usize != expected {
                return Err(SrsError::InvalidStageTable(format!(
                    "expected stage {} but found stage {}",
                    expected, stage.stage_id
                )));
            }
            if stage.interval_secs < 0 {
                return Err(SrsError::InvalidStageTable(format!(
                    "stage {} has a negative interval",
                    stage.stage_id
                )));
            }
            if stage.stage_id == 0 {
                if stage.penalty != 0.0 {
                    return Err(SrsError::InvalidStageTable(
                        "stage 0 cannot carry a penalty".to_string(),
                    ));
                }
            } else if stage.penalty <= 0.0 || !stage.penalty.is_finite() {
                return Err(SrsError::InvalidStageTable(format!(
                    "stage {} needs a positive penalty",
                    stage.stage_id
                )));
            }
        }

        Ok(Self { stages })
    }

    /// Highest configured stage ("mastered").
    pub fn max_stage(&self) -> StageId {
        // new() guarantees at least two contiguous stages
        (self.stages.len() - 1) as StageId
    }

    pub fn get(&self, stage_id: StageId) -> Result<&Stage> {
        self.stages
            .get(stage_id as usize)
            .ok_or(SrsError::UnknownStage(stage_id))
    }

    pub fn interval(&self, stage_id: StageId) -> Result<Duration> {
        self.get(stage_id).map(Stage::interval)
    }

    pub fn penalty(&self, stage_id: StageId) -> Result<f64> {
        self.get(stage_id).map(|s| s.penalty)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for StageTable {
    /// The seeded production table. Stage 9 is mastered.
    fn default() -> Self {
        let stages = vec![
            Stage::new(0, Duration::zero(), 0.0),
            Stage::new(1, Duration::hours(4), 1.0),
            Stage::new(2, Duration::hours(8), 1.0),
            Stage::new(3, Duration::days(1), 1.0),
            Stage::new(4, Duration::days(2), 2.0),
            Stage::new(5, Duration::days(7), 2.0),
            Stage::new(6, Duration::days(14), 2.0),
            Stage::new(7, Duration::days(30), 2.0),
            Stage::new(8, Duration::days(120), 2.0),
            Stage::new(9, Duration::days(365), 2.0),
        ];
        Self { stages }
    }
}
