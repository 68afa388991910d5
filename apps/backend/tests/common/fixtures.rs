//! Test fixtures and factory functions for creating test data.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::json;

use crabigateur_backend::db::Database;
use crabigateur_backend::models::{Card, MemorySeed, SeedUser};

/// Learner at level 1.
pub const USER: &str = "1";

/// Learner at level 2 with nothing started.
pub const OTHER_USER: &str = "2";

/// Card ids at level 1, in catalog order.
pub const LEVEL_ONE: [i64; 4] = [101, 102, 103, 104];

/// Card id at level 2.
pub const LEVEL_TWO: i64 = 201;

pub fn card(card_id: i64, word: &str, word_type: &str, level: u32) -> Card {
    Card {
        card_id,
        word: word.to_string(),
        translations: vec![format!("{} (en)", word)],
        word_type: word_type.to_string(),
        gender: None,
        level,
    }
}

pub fn cards() -> Vec<Card> {
    vec![
        card(101, "maison", "noun", 1),
        card(102, "manger", "verb", 1),
        card(103, "chat", "noun", 1),
        card(104, "rouge", "adjective", 1),
        card(201, "courir", "verb", 2),
    ]
}

pub fn seed() -> MemorySeed {
    MemorySeed {
        users: vec![
            SeedUser {
                user_id: USER.to_string(),
                level: 1,
            },
            SeedUser {
                user_id: OTHER_USER.to_string(),
                level: 2,
            },
        ],
        cards: cards(),
    }
}

/// Insert the seed rows, replacing any progress left by earlier runs.
pub async fn insert_seed(db: &Database) {
    for user in seed().users {
        sqlx::query("DELETE FROM reviews WHERE user_id = $1")
            .bind(&user.user_id)
            .execute(db.pool())
            .await
            .expect("Failed to clear reviews");
        sqlx::query("DELETE FROM user_card_status WHERE user_id = $1")
            .bind(&user.user_id)
            .execute(db.pool())
            .await
            .expect("Failed to clear progress");
        sqlx::query(
            "INSERT INTO users (user_id, level) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level",
        )
        .bind(&user.user_id)
        .bind(user.level as i32)
        .execute(db.pool())
        .await
        .expect("Failed to insert user");
    }

    for card in cards() {
        sqlx::query(
            "INSERT INTO cards (card_id, word, translation, word_type, gender, level)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (card_id) DO NOTHING",
        )
        .bind(card.card_id)
        .bind(&card.word)
        .bind(sqlx::types::Json(&card.translations))
        .bind(&card.word_type)
        .bind(&card.gender)
        .bind(card.level as i32)
        .execute(db.pool())
        .await
        .expect("Failed to insert card");
    }
}

/// Learner at level 0 and a card at that level, with no progress.
pub const LEVEL_ZERO_USER: &str = "3";
pub const LEVEL_ZERO_CARD: i64 = 301;

pub async fn insert_level_zero(db: &Database) {
    sqlx::query("DELETE FROM reviews WHERE user_id = $1")
        .bind(LEVEL_ZERO_USER)
        .execute(db.pool())
        .await
        .expect("Failed to clear reviews");
    sqlx::query("DELETE FROM user_card_status WHERE user_id = $1")
        .bind(LEVEL_ZERO_USER)
        .execute(db.pool())
        .await
        .expect("Failed to clear progress");
    sqlx::query(
        "INSERT INTO users (user_id, level) VALUES ($1, 0)
         ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level",
    )
    .bind(LEVEL_ZERO_USER)
    .execute(db.pool())
    .await
    .expect("Failed to insert level 0 user");
    sqlx::query(
        "INSERT INTO cards (card_id, word, translation, word_type, gender, level)
         VALUES ($1, 'bonjour', '[\"hello\"]'::jsonb, 'interjection', NULL, 0)
         ON CONFLICT (card_id) DO NOTHING",
    )
    .bind(LEVEL_ZERO_CARD)
    .execute(db.pool())
    .await
    .expect("Failed to insert level 0 card");
}

/// Review submission body.
pub fn review(card_id: i64, at: DateTime<Utc>, success: bool, incorrect_count: i64) -> serde_json::Value {
    json!({
        "card_id": card_id,
        "review_date": at,
        "success": success,
        "incorrect_count": incorrect_count,
    })
}

/// Card id list body.
pub fn card_ids(ids: &[i64]) -> serde_json::Value {
    json!({ "card_ids": ids })
}
