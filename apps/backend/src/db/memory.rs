//! In-process progress store
//!
//! Holds the whole state behind one lock. Every write plans its transition
//! before touching anything, so a failed request leaves the state unchanged.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::{ApiError, Result};
use crate::models::*;
use srs_core::{
    mistakes, most_recent, select_due, select_first_due, select_lessons, ApplyMode, DueCandidate,
    RecentReview, Scheduler, SrsError, StageTable, Transition,
};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, u32>,
    cards: BTreeMap<i64, Card>,
    statuses: HashMap<(String, i64), UserCardStatus>,
    reviews: Vec<ReviewEvent>,
}

impl Inner {
    fn user_level(&self, user_id: &str) -> Result<u32> {
        self.users
            .get(user_id)
            .copied()
            .ok_or_else(|| SrsError::user_not_found(user_id).into())
    }

    fn card(&self, card_id: i64) -> Result<&Card> {
        self.cards
            .get(&card_id)
            .ok_or_else(|| SrsError::card_not_found(card_id).into())
    }

    fn stage_of(&self, user_id: &str, card_id: i64) -> Option<StageId> {
        self.statuses
            .get(&(user_id.to_string(), card_id))
            .map(|s| s.stage_id)
    }

    fn candidates(&self, user_id: &str) -> Vec<DueCandidate> {
        self.statuses
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                self.cards.get(&s.card_id).map(|card| DueCandidate {
                    card: card.clone(),
                    stage_id: s.stage_id,
                    next_review_date: s.next_review_date,
                })
            })
            .collect()
    }

    fn recent_reviews(&self, user_id: &str) -> Vec<RecentReview> {
        self.reviews
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                let card = self.cards.get(&e.card_id)?;
                let stage_id = self.stage_of(user_id, e.card_id)?;
                Some(RecentReview {
                    card_id: e.card_id,
                    card_word: card.word.clone(),
                    success: e.success,
                    stage_id,
                    review_date: e.review_date,
                })
            })
            .collect()
    }

    fn commit(&mut self, user_id: &str, plan: &Transition) {
        self.statuses
            .insert((user_id.to_string(), plan.card_id), plan.status(user_id));
        self.reviews.push(plan.review_event(user_id));
    }
}

/// Store kept entirely in memory, for development and tests
#[derive(Debug)]
pub struct MemoryStore {
    stages: StageTable,
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StageTable::default())
    }
}

impl MemoryStore {
    pub fn new(stages: StageTable) -> Self {
        Self {
            stages,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Build a store holding the users and cards of a seed
    pub fn from_seed(seed: MemorySeed) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            for user in seed.users {
                inner.users.insert(user.user_id, user.level);
            }
            for card in seed.cards {
                inner.cards.insert(card.card_id, card);
            }
        }
        store
    }

    /// Read a JSON seed file
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let seed: MemorySeed = serde_json::from_str(&raw)
            .map_err(|e| ApiError::Config(format!("Invalid seed {}: {}", path.display(), e)))?;

        tracing::info!(
            users = seed.users.len(),
            cards = seed.cards.len(),
            "loaded memory seed"
        );
        Ok(Self::from_seed(seed))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ApiError::Internal("memory store lock poisoned".to_string()))
    }

    pub fn insert_user(&self, user_id: &str, level: u32) -> Result<()> {
        self.lock()?.users.insert(user_id.to_string(), level);
        Ok(())
    }

    pub fn insert_card(&self, card: Card) -> Result<()> {
        self.lock()?.cards.insert(card.card_id, card);
        Ok(())
    }

    /// Progress row of a pair, if the card was ever introduced
    pub fn status(&self, user_id: &str, card_id: i64) -> Result<Option<UserCardStatus>> {
        Ok(self
            .lock()?
            .statuses
            .get(&(user_id.to_string(), card_id))
            .cloned())
    }

    /// Logged events of a pair, oldest first
    pub fn events(&self, user_id: &str, card_id: i64) -> Result<Vec<ReviewEvent>> {
        Ok(self
            .lock()?
            .reviews
            .iter()
            .filter(|e| e.user_id == user_id && e.card_id == card_id)
            .cloned()
            .collect())
    }

    pub fn load_stage_table(&self) -> Result<StageTable> {
        Ok(self.stages.clone())
    }

    pub fn user_level(&self, user_id: &str) -> Result<u32> {
        self.lock()?.user_level(user_id)
    }

    pub fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        Ok(self.lock()?.cards.get(&card_id).cloned())
    }

    pub fn select_lessons(&self, user_id: &str, level: u32, limit: usize) -> Result<Vec<Card>> {
        let inner = self.lock()?;
        Ok(select_lessons(
            inner.cards.values(),
            |card_id| inner.stage_of(user_id, card_id).is_some(),
            level,
            limit,
        ))
    }

    pub fn select_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        limit: usize,
        now: DateTime<Utc>,
        max_stage: StageId,
    ) -> Result<Vec<Card>> {
        let candidates = self.lock()?.candidates(user_id);
        Ok(select_due(candidates, sort, now, max_stage, limit))
    }

    pub fn select_first_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        max_stage: StageId,
    ) -> Result<Option<Card>> {
        let candidates = self.lock()?.candidates(user_id);
        Ok(select_first_due(candidates, sort, max_stage))
    }

    pub fn apply_outcome(
        &self,
        user_id: &str,
        outcome: &ReviewOutcome,
        mode: ApplyMode,
        scheduler: &Scheduler,
    ) -> Result<ReviewResult> {
        let mut inner = self.lock()?;

        inner.user_level(user_id)?;
        let word = inner.card(outcome.card_id)?.word.clone();

        let current = inner.stage_of(user_id, outcome.card_id);
        let plan = scheduler.plan_outcome(current, outcome, mode)?;
        inner.commit(user_id, &plan);

        tracing::debug!(
            user_id,
            card_id = plan.card_id,
            previous_stage = plan.previous_stage,
            new_stage = plan.new_stage,
            "applied review outcome"
        );

        Ok(plan.result(word))
    }

    pub fn start_lessons(
        &self,
        user_id: &str,
        card_ids: &[i64],
        now: DateTime<Utc>,
        scheduler: &Scheduler,
    ) -> Result<Vec<ReviewResult>> {
        let mut inner = self.lock()?;
        inner.user_level(user_id)?;

        let mut planned = HashSet::new();
        let mut plans = Vec::with_capacity(card_ids.len());
        for &card_id in card_ids {
            let word = inner.card(card_id)?.word.clone();
            let current = if planned.contains(&card_id) {
                Some(0)
            } else {
                inner.stage_of(user_id, card_id)
            };
            let plan = scheduler.plan_introduction(current, card_id, now)?;
            planned.insert(card_id);
            plans.push((plan, word));
        }

        let results = plans
            .into_iter()
            .map(|(plan, word)| {
                inner.commit(user_id, &plan);
                plan.result(word)
            })
            .collect::<Vec<_>>();

        tracing::info!(user_id, count = results.len(), "started lessons");
        Ok(results)
    }

    pub fn most_recent(
        &self,
        user_id: &str,
        selector: &RecentSelector,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewResult>> {
        let inner = self.lock()?;
        Ok(most_recent(inner.recent_reviews(user_id), selector, now))
    }

    /// Cards whose closest review to `now` was a failure, closest first
    pub fn recent_mistakes(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<CardTag>> {
        let inner = self.lock()?;
        inner.user_level(user_id)?;

        let recent = most_recent(inner.recent_reviews(user_id), &RecentSelector::Limit(0), now);
        Ok(mistakes(recent)
            .into_iter()
            .filter_map(|r| {
                inner.cards.get(&r.card_id).map(|card| CardTag {
                    card_id: card.card_id,
                    word: card.word.clone(),
                    word_type: card.word_type.clone(),
                })
            })
            .collect())
    }

    pub fn count_pending(&self, user_id: &str, now: DateTime<Utc>, max_stage: StageId) -> Result<i64> {
        let inner = self.lock()?;
        let count = inner
            .statuses
            .values()
            .filter(|s| s.user_id == user_id && s.is_due(now, max_stage))
            .count();
        Ok(count as i64)
    }

    pub fn level_progress(&self, user_id: &str) -> Result<Vec<CardProgress>> {
        let inner = self.lock()?;
        let level = inner.user_level(user_id)?;

        Ok(inner
            .cards
            .values()
            .filter(|c| c.level == level)
            .map(|c| CardProgress {
                card_id: c.card_id,
                card_word: c.word.clone(),
                stage_id: inner.stage_of(user_id, c.card_id).unwrap_or(0),
            })
            .collect())
    }

    pub fn word_stats(&self, user_id: &str) -> Result<WordStats> {
        let inner = self.lock()?;
        inner.user_level(user_id)?;

        let mut stats: WordStats = BTreeMap::new();
        for status in inner.statuses.values().filter(|s| s.user_id == user_id) {
            if let Some(card) = inner.cards.get(&status.card_id) {
                *stats
                    .entry(status.stage_id)
                    .or_default()
                    .entry(card.word_type.clone())
                    .or_insert(0) += 1;
            }
        }
        Ok(stats)
    }
}
