//! Progress stores

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::Database;

use chrono::{DateTime, Utc};

use crate::config::{Config, StoreKind};
use crate::error::Result;
use crate::models::*;
use srs_core::{ApplyMode, Scheduler, StageTable};

/// The store backing the service, chosen at startup
pub enum Store {
    Postgres(Database),
    Memory(MemoryStore),
}

impl Store {
    /// Open the store named by the configuration, running migrations for
    /// PostgreSQL.
    pub async fn open(config: &Config) -> Result<Self> {
        match &config.store {
            StoreKind::Postgres { database_url } => {
                tracing::info!("Connecting to database...");
                let db = Database::connect(
                    database_url,
                    config.max_connections,
                    config.acquire_timeout,
                )
                .await?;

                tracing::info!("Running migrations...");
                db.run_migrations().await?;
                Ok(Store::Postgres(db))
            }
            StoreKind::Memory { seed } => {
                tracing::info!("Using in-memory store");
                let store = match seed {
                    Some(path) => MemoryStore::from_seed_file(path)?,
                    None => MemoryStore::default(),
                };
                Ok(Store::Memory(store))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn load_stage_table(&self) -> Result<StageTable> {
        match self {
            Store::Postgres(db) => db.load_stage_table().await,
            Store::Memory(mem) => mem.load_stage_table(),
        }
    }

    pub async fn user_level(&self, user_id: &str) -> Result<u32> {
        match self {
            Store::Postgres(db) => db.user_level(user_id).await,
            Store::Memory(mem) => mem.user_level(user_id),
        }
    }

    pub async fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        match self {
            Store::Postgres(db) => db.get_card(card_id).await,
            Store::Memory(mem) => mem.get_card(card_id),
        }
    }

    pub async fn select_lessons(&self, user_id: &str, level: u32, limit: usize) -> Result<Vec<Card>> {
        match self {
            Store::Postgres(db) => db.select_lessons(user_id, level, limit).await,
            Store::Memory(mem) => mem.select_lessons(user_id, level, limit),
        }
    }

    pub async fn select_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        limit: usize,
        now: DateTime<Utc>,
        max_stage: StageId,
    ) -> Result<Vec<Card>> {
        match self {
            Store::Postgres(db) => db.select_due(user_id, sort, limit, now, max_stage).await,
            Store::Memory(mem) => mem.select_due(user_id, sort, limit, now, max_stage),
        }
    }

    pub async fn select_first_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        max_stage: StageId,
    ) -> Result<Option<Card>> {
        match self {
            Store::Postgres(db) => db.select_first_due(user_id, sort, max_stage).await,
            Store::Memory(mem) => mem.select_first_due(user_id, sort, max_stage),
        }
    }

    pub async fn apply_outcome(
        &self,
        user_id: &str,
        outcome: &ReviewOutcome,
        mode: ApplyMode,
        scheduler: &Scheduler,
    ) -> Result<ReviewResult> {
        match self {
            Store::Postgres(db) => db.apply_outcome(user_id, outcome, mode, scheduler).await,
            Store::Memory(mem) => mem.apply_outcome(user_id, outcome, mode, scheduler),
        }
    }

    pub async fn start_lessons(
        &self,
        user_id: &str,
        card_ids: &[i64],
        now: DateTime<Utc>,
        scheduler: &Scheduler,
    ) -> Result<Vec<ReviewResult>> {
        match self {
            Store::Postgres(db) => db.start_lessons(user_id, card_ids, now, scheduler).await,
            Store::Memory(mem) => mem.start_lessons(user_id, card_ids, now, scheduler),
        }
    }

    pub async fn most_recent(
        &self,
        user_id: &str,
        selector: &RecentSelector,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewResult>> {
        match self {
            Store::Postgres(db) => db.most_recent(user_id, selector, now).await,
            Store::Memory(mem) => mem.most_recent(user_id, selector, now),
        }
    }

    pub async fn recent_mistakes(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<CardTag>> {
        match self {
            Store::Postgres(db) => db.recent_mistakes(user_id, now).await,
            Store::Memory(mem) => mem.recent_mistakes(user_id, now),
        }
    }

    pub async fn count_pending(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        max_stage: StageId,
    ) -> Result<i64> {
        match self {
            Store::Postgres(db) => db.count_pending(user_id, now, max_stage).await,
            Store::Memory(mem) => mem.count_pending(user_id, now, max_stage),
        }
    }

    pub async fn level_progress(&self, user_id: &str) -> Result<Vec<CardProgress>> {
        match self {
            Store::Postgres(db) => db.level_progress(user_id).await,
            Store::Memory(mem) => mem.level_progress(user_id),
        }
    }

    pub async fn word_stats(&self, user_id: &str) -> Result<WordStats> {
        match self {
            Store::Postgres(db) => db.word_stats(user_id).await,
            Store::Memory(mem) => mem.word_stats(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn memory_store_dispatch() {
        let store = Store::Memory(MemoryStore::default());
        assert_eq!(store.kind(), "memory");

        let stages = block_on(store.load_stage_table()).unwrap();
        assert_eq!(stages.max_stage(), 9);

        assert!(block_on(store.get_card(1)).unwrap().is_none());
        assert!(block_on(store.user_level("1")).is_err());
    }

    #[test]
    fn memory_store_opens_without_seed() {
        let config = Config::from_lookup(|key| match key {
            "STORE" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();

        let store = block_on(Store::open(&config)).unwrap();
        assert_eq!(store.kind(), "memory");
    }
}
