//! Lesson and review selection.
//!
//! [`SortKeys`] is the validated ordering for review selection. The
//! `select_*` functions run the selection over in-memory candidates; the
//! Postgres store expresses the same filters and ordering in SQL.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::error::{Result, SrsError};
use crate::types::{Card, SortKey, StageId};

/// Ordered, conflict-free list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortKeys(Vec<SortKey>);

impl SortKeys {
    /// Validate a key list. Both directions of one dimension cannot appear
    /// together.
    pub fn new(keys: Vec<SortKey>) -> Result<Self> {
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(&key.opposite()) {
                return Err(SrsError::ConflictingSort(key.opposite().as_str(), key.as_str()));
            }
        }
        Ok(Self(keys))
    }

    /// Parse a comma separated list such as `date_asc,level_desc`.
    pub fn parse(raw: &str) -> Result<Self> {
        let keys = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| SortKey::from_str(s).ok_or_else(|| SrsError::InvalidSortKey(s.to_string())))
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys to apply: the caller's, or oldest-due first when none were given.
    pub fn effective(&self) -> &[SortKey] {
        if self.0.is_empty() {
            &[SortKey::DateAsc]
        } else {
            &self.0
        }
    }

    /// Compare two candidates. Remaining ties fall back to card id.
    pub fn compare(&self, a: &DueCandidate, b: &DueCandidate) -> Ordering {
        self.effective()
            .iter()
            .map(|key| {
                let ord = match key {
                    SortKey::DateAsc | SortKey::DateDesc => a.next_review_date.cmp(&b.next_review_date),
                    SortKey::LevelAsc | SortKey::LevelDesc => a.card.level.cmp(&b.card.level),
                };
                if key.is_descending() {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.card.card_id.cmp(&b.card.card_id))
    }
}

/// A card the user has progress on, joined with that progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCandidate {
    pub card: Card,
    pub stage_id: StageId,
    pub next_review_date: DateTime<Utc>,
}

fn truncate<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if limit > 0 {
        items.truncate(limit);
    }
    items
}

/// Cards at `level` the user has never started, by card id. A `limit` of 0
/// means unlimited.
pub fn select_lessons<'a, I, F>(cards: I, is_started: F, level: u32, limit: usize) -> Vec<Card>
where
    I: IntoIterator<Item = &'a Card>,
    F: Fn(i64) -> bool,
{
    let mut lessons: Vec<Card> = cards
        .into_iter()
        .filter(|c| c.level == level && !is_started(c.card_id))
        .cloned()
        .collect();
    lessons.sort_by_key(|c| c.card_id);
    truncate(lessons, limit)
}

/// Cards due at `now` below the mastered stage, in `sort` order.
pub fn select_due(
    candidates: Vec<DueCandidate>,
    sort: &SortKeys,
    now: DateTime<Utc>,
    max_stage: StageId,
    limit: usize,
) -> Vec<Card> {
    let mut due: Vec<DueCandidate> = candidates
        .into_iter()
        .filter(|c| c.stage_id < max_stage && c.next_review_date <= now)
        .collect();
    due.sort_by(|a, b| sort.compare(a, b));
    truncate(due.into_iter().map(|c| c.card).collect(), limit)
}

/// Highest-priority introduced card that has not had its first review yet,
/// whatever its due date.
pub fn select_first_due(
    candidates: Vec<DueCandidate>,
    sort: &SortKeys,
    max_stage: StageId,
) -> Option<Card> {
    candidates
        .into_iter()
        .filter(|c| c.stage_id == 0 && c.stage_id < max_stage)
        .min_by(|a, b| sort.compare(a, b))
        .map(|c| c.card)
}
