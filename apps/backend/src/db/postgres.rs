//! PostgreSQL database operations

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::Result;
use crate::models::*;
use srs_core::{ApplyMode, Scheduler, SrsError, StageTable, Transition, TransitionKind};

const CARD_COLUMNS: &str = "c.card_id, c.word, c.translation, c.word_type, c.gender, c.level";

/// Which progress rows a review query considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    /// Rows due at the given instant
    Due(DateTime<Utc>),
    /// Introduced rows awaiting their first review, whatever the due date
    FirstReview,
}

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Stage Repository ===

    /// Load and validate the seeded stage table
    pub async fn load_stage_table(&self) -> Result<StageTable> {
        let rows = sqlx::query_as::<_, DbStage>(
            r#"
            SELECT stage_id, interval_secs, penalty
            FROM srs_stages
            ORDER BY stage_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let stages = rows.iter().map(DbStage::to_core_stage).collect();
        Ok(StageTable::new(stages)?)
    }

    // === User / Card Repository ===

    /// Current level of a user
    pub async fn user_level(&self, user_id: &str) -> Result<u32> {
        let mut conn = self.pool.acquire().await?;
        require_user(&mut conn, user_id).await
    }

    /// Get card by ID
    pub async fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        let mut conn = self.pool.acquire().await?;
        let card = fetch_card(&mut conn, card_id).await?;
        Ok(card.map(|c| c.to_core_card()))
    }

    // === Selection ===

    /// Cards at `level` the user has not started yet
    pub async fn select_lessons(&self, user_id: &str, level: u32, limit: usize) -> Result<Vec<Card>> {
        let cards = lessons_query(user_id, level, limit)
            .build_query_as::<DbCard>()
            .fetch_all(&self.pool)
            .await?;

        Ok(cards.iter().map(DbCard::to_core_card).collect())
    }

    /// Cards due for review, ordered by `sort`
    pub async fn select_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        limit: usize,
        now: DateTime<Utc>,
        max_stage: StageId,
    ) -> Result<Vec<Card>> {
        let cards = review_query(user_id, ReviewFilter::Due(now), sort, max_stage, limit)
            .build_query_as::<DbCard>()
            .fetch_all(&self.pool)
            .await?;

        Ok(cards.iter().map(DbCard::to_core_card).collect())
    }

    /// Highest-priority card awaiting its first review
    pub async fn select_first_due(
        &self,
        user_id: &str,
        sort: &SortKeys,
        max_stage: StageId,
    ) -> Result<Option<Card>> {
        let card = review_query(user_id, ReviewFilter::FirstReview, sort, max_stage, 1)
            .build_query_as::<DbCard>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(card.map(|c| c.to_core_card()))
    }

    // === Transitions ===

    /// Apply one review outcome: lock the progress row, plan the transition,
    /// then write the review event and the status change in one transaction.
    pub async fn apply_outcome(
        &self,
        user_id: &str,
        outcome: &ReviewOutcome,
        mode: ApplyMode,
        scheduler: &Scheduler,
    ) -> Result<ReviewResult> {
        let mut tx = self.pool.begin().await?;

        require_user(&mut tx, user_id).await?;
        let card = fetch_card(&mut tx, outcome.card_id)
            .await?
            .ok_or_else(|| SrsError::card_not_found(outcome.card_id))?;

        let current = lock_stage(&mut tx, user_id, outcome.card_id).await?;
        let mut plan = scheduler.plan_outcome(current, outcome, mode)?;

        match plan.kind {
            TransitionKind::Create => {
                if !insert_status(&mut tx, user_id, &plan).await? {
                    // A concurrent first contact created the row; plan against it
                    let current = lock_stage(&mut tx, user_id, outcome.card_id).await?;
                    plan = scheduler.plan_outcome(current, outcome, mode)?;
                    update_status(&mut tx, user_id, &plan).await?;
                }
            }
            TransitionKind::Update => update_status(&mut tx, user_id, &plan).await?,
        }

        insert_review(&mut tx, &DbReview::from_event(&plan.review_event(user_id))).await?;
        tx.commit().await?;

        tracing::debug!(
            user_id,
            card_id = plan.card_id,
            previous_stage = plan.previous_stage,
            new_stage = plan.new_stage,
            "applied review outcome"
        );

        Ok(plan.result(card.word))
    }

    /// Introduce cards at stage 0. Either every card starts or none does.
    pub async fn start_lessons(
        &self,
        user_id: &str,
        card_ids: &[i64],
        now: DateTime<Utc>,
        scheduler: &Scheduler,
    ) -> Result<Vec<ReviewResult>> {
        let mut tx = self.pool.begin().await?;
        require_user(&mut tx, user_id).await?;

        let mut results = Vec::with_capacity(card_ids.len());
        for &card_id in card_ids {
            let card = fetch_card(&mut tx, card_id)
                .await?
                .ok_or_else(|| SrsError::card_not_found(card_id))?;

            let current = lock_stage(&mut tx, user_id, card_id).await?;
            let plan = scheduler.plan_introduction(current, card_id, now)?;

            if !insert_status(&mut tx, user_id, &plan).await? {
                return Err(SrsError::InvalidTransition {
                    card_id,
                    reason: "lesson already started".to_string(),
                }
                .into());
            }
            insert_review(&mut tx, &DbReview::from_event(&plan.review_event(user_id))).await?;

            results.push(plan.result(card.word));
        }

        tx.commit().await?;
        tracing::info!(user_id, count = results.len(), "started lessons");

        Ok(results)
    }

    // === Review Log ===

    /// Per card, the review closest to `now`, ordered by that distance
    pub async fn most_recent(
        &self,
        user_id: &str,
        selector: &RecentSelector,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewResult>> {
        let rows = recent_query(user_id, selector, now)
            .build_query_as::<DbReviewResult>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(DbReviewResult::to_core_result).collect())
    }

    /// Cards whose closest review to `now` was a failure, closest first
    pub async fn recent_mistakes(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<CardTag>> {
        self.user_level(user_id).await?;

        let rows = mistakes_query(user_id, now)
            .build_query_as::<DbCardTag>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(DbCardTag::to_core_tag).collect())
    }

    /// Number of cards currently due
    pub async fn count_pending(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        max_stage: StageId,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_card_status
            WHERE user_id = $1 AND stage_id < $2 AND next_review_date <= $3
            "#,
        )
        .bind(user_id)
        .bind(max_stage as i32)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Stage of every card at the user's current level
    pub async fn level_progress(&self, user_id: &str) -> Result<Vec<CardProgress>> {
        let level = self.user_level(user_id).await?;

        let rows = sqlx::query_as::<_, DbCardProgress>(
            r#"
            SELECT c.card_id, c.word AS card_word, COALESCE(ucs.stage_id, 0) AS stage_id
            FROM cards c
            LEFT JOIN user_card_status ucs
                ON ucs.card_id = c.card_id AND ucs.user_id = $1
            WHERE c.level = $2
            ORDER BY c.card_id
            "#,
        )
        .bind(user_id)
        .bind(level as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(DbCardProgress::to_core_progress).collect())
    }

    /// Started cards counted by stage and word type
    pub async fn word_stats(&self, user_id: &str) -> Result<WordStats> {
        self.user_level(user_id).await?;

        let rows = sqlx::query_as::<_, DbWordStat>(
            r#"
            SELECT ucs.stage_id, c.word_type, COUNT(*) AS count
            FROM user_card_status ucs
            JOIN cards c ON c.card_id = ucs.card_id
            WHERE ucs.user_id = $1
            GROUP BY ucs.stage_id, c.word_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats: WordStats = BTreeMap::new();
        for row in rows {
            stats
                .entry(row.stage_id as StageId)
                .or_default()
                .insert(row.word_type, row.count);
        }
        Ok(stats)
    }
}

// === Query construction ===

/// SQL column for a sort key; the direction is fixed by the enum variant
fn order_column(key: SortKey) -> &'static str {
    match key {
        SortKey::DateAsc => "ucs.next_review_date ASC",
        SortKey::DateDesc => "ucs.next_review_date DESC",
        SortKey::LevelAsc => "c.level ASC",
        SortKey::LevelDesc => "c.level DESC",
    }
}

/// ORDER BY clause for review selection, with card id as the final tie-break
pub fn order_by_clause(sort: &SortKeys) -> String {
    let mut columns: Vec<&str> = sort.effective().iter().copied().map(order_column).collect();
    columns.push("c.card_id ASC");
    format!(" ORDER BY {}", columns.join(", "))
}

fn push_limit(qb: &mut QueryBuilder<'static, Postgres>, limit: usize) {
    if limit > 0 {
        qb.push(" LIMIT ").push_bind(limit as i64);
    }
}

pub fn lessons_query(user_id: &str, level: u32, limit: usize) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM cards c WHERE c.level = ", CARD_COLUMNS));
    qb.push_bind(level as i32);
    qb.push(
        " AND NOT EXISTS (SELECT 1 FROM user_card_status ucs \
         WHERE ucs.card_id = c.card_id AND ucs.user_id = ",
    );
    qb.push_bind(user_id.to_string());
    qb.push(") ORDER BY c.card_id");
    push_limit(&mut qb, limit);
    qb
}

pub fn review_query(
    user_id: &str,
    filter: ReviewFilter,
    sort: &SortKeys,
    max_stage: StageId,
    limit: usize,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM user_card_status ucs JOIN cards c ON c.card_id = ucs.card_id WHERE ucs.user_id = ",
        CARD_COLUMNS
    ));
    qb.push_bind(user_id.to_string());
    qb.push(" AND ucs.stage_id < ");
    qb.push_bind(max_stage as i32);

    match filter {
        ReviewFilter::Due(now) => {
            qb.push(" AND ucs.next_review_date <= ");
            qb.push_bind(now);
        }
        ReviewFilter::FirstReview => {
            qb.push(" AND ucs.stage_id = 0");
        }
    }

    qb.push(order_by_clause(sort));
    push_limit(&mut qb, limit);
    qb
}

pub fn recent_query(
    user_id: &str,
    selector: &RecentSelector,
    now: DateTime<Utc>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT card_id, card_word, success, stage_id FROM (\
         SELECT DISTINCT ON (r.card_id) r.card_id, c.word AS card_word, r.success, ucs.stage_id, \
         ABS(EXTRACT(EPOCH FROM (r.review_date - ",
    );
    qb.push_bind(now);
    qb.push(
        "))) AS distance \
         FROM reviews r \
         JOIN user_card_status ucs ON ucs.user_id = r.user_id AND ucs.card_id = r.card_id \
         JOIN cards c ON c.card_id = r.card_id \
         WHERE r.user_id = ",
    );
    qb.push_bind(user_id.to_string());

    if let RecentSelector::Cards(ids) = selector {
        qb.push(" AND r.card_id = ANY(");
        qb.push_bind(ids.clone());
        qb.push(")");
    }

    qb.push(" ORDER BY r.card_id, distance ASC) recent ORDER BY distance ASC, card_id ASC");

    if let RecentSelector::Limit(n) = selector {
        push_limit(&mut qb, *n);
    }
    qb
}

pub fn mistakes_query(user_id: &str, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT card_id, word, word_type FROM (\
         SELECT DISTINCT ON (r.card_id) r.card_id, c.word, c.word_type, r.success, \
         ABS(EXTRACT(EPOCH FROM (r.review_date - ",
    );
    qb.push_bind(now);
    qb.push(
        "))) AS distance \
         FROM reviews r \
         JOIN cards c ON c.card_id = r.card_id \
         WHERE r.user_id = ",
    );
    qb.push_bind(user_id.to_string());
    qb.push(
        " ORDER BY r.card_id, distance ASC) recent \
         WHERE NOT success ORDER BY distance ASC, card_id ASC",
    );
    qb
}

// === Transaction helpers ===

async fn require_user(conn: &mut PgConnection, user_id: &str) -> Result<u32> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT user_id, level
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| SrsError::user_not_found(user_id))?;

    Ok(user.level as u32)
}

async fn fetch_card(conn: &mut PgConnection, card_id: i64) -> Result<Option<DbCard>> {
    let card = sqlx::query_as::<_, DbCard>(&format!(
        "SELECT {} FROM cards c WHERE c.card_id = $1",
        CARD_COLUMNS
    ))
    .bind(card_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(card)
}

/// Current stage of the pair, locking the row for the rest of the transaction
async fn lock_stage(conn: &mut PgConnection, user_id: &str, card_id: i64) -> Result<Option<StageId>> {
    let status = sqlx::query_as::<_, DbUserCardStatus>(
        r#"
        SELECT user_id, card_id, stage_id, next_review_date
        FROM user_card_status
        WHERE user_id = $1 AND card_id = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(card_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(status.map(|s| s.to_core_status().stage_id))
}

/// Insert a new progress row. Returns false when the row already exists.
async fn insert_status(conn: &mut PgConnection, user_id: &str, plan: &Transition) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_card_status (user_id, card_id, stage_id, next_review_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, card_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(plan.card_id)
    .bind(plan.new_stage as i32)
    .bind(plan.next_review_date)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn update_status(conn: &mut PgConnection, user_id: &str, plan: &Transition) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE user_card_status
        SET stage_id = $3, next_review_date = $4
        WHERE user_id = $1 AND card_id = $2
        "#,
    )
    .bind(user_id)
    .bind(plan.card_id)
    .bind(plan.new_stage as i32)
    .bind(plan.next_review_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_review(conn: &mut PgConnection, review: &DbReview) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reviews (id, user_id, card_id, review_date, success, previous_stage, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(review.id)
    .bind(&review.user_id)
    .bind(review.card_id)
    .bind(review.review_date)
    .bind(review.success)
    .bind(review.previous_stage)
    .bind(review.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
