//! Common test utilities and fixtures for integration tests.
//!
//! `TestContext::in_memory` needs nothing external. `TestContext::new`
//! connects to PostgreSQL (set DATABASE_URL) and is only used by tests
//! marked `#[ignore = "requires database"]`.

pub mod fixtures;

use axum::Router;
use axum_test::TestServer;

use crabigateur_backend::db::{Database, MemoryStore, Store};
use crabigateur_backend::{router, scheduler_for, AppState};

/// Test context holding the router under test.
pub struct TestContext {
    /// Database handle when backed by PostgreSQL, for direct assertions.
    pub db: Option<Database>,
    app: Router,
}

impl TestContext {
    /// Context backed by a memory store seeded with `fixtures::seed()`.
    pub async fn in_memory() -> Self {
        let store = Store::Memory(MemoryStore::from_seed(fixtures::seed()));
        Self::with_store(store).await
    }

    /// Context backed by PostgreSQL.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or the database is unreachable.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url, 5, std::time::Duration::from_secs(5))
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        fixtures::insert_seed(&db).await;

        let mut ctx = Self::with_store(Store::Postgres(db.clone())).await;
        ctx.db = Some(db);
        ctx
    }

    async fn with_store(store: Store) -> Self {
        let scheduler = scheduler_for(&store)
            .await
            .expect("Failed to load stage table");
        let app = router(AppState::new(store, scheduler));
        Self { db: None, app }
    }

    /// Database handle; only valid for contexts built with `new`.
    pub fn database(&self) -> &Database {
        self.db.as_ref().expect("context is not backed by PostgreSQL")
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Test server over the router.
    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }
}
