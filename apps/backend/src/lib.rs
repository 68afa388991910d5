pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Store;
use srs_core::Scheduler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(store: Store, scheduler: Scheduler) -> Self {
        Self {
            store: Arc::new(store),
            scheduler: Arc::new(scheduler),
        }
    }
}

/// Build the API router with all routes under `/v1/api`
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(routes::status::status))
        // Lesson routes
        .route(
            "/lessons/:user_id",
            get(routes::lessons::list).post(routes::lessons::start),
        )
        // Review routes
        .route(
            "/reviews/:user_id",
            get(routes::reviews::list)
                .post(routes::reviews::submit)
                .put(routes::reviews::update),
        )
        .route("/reviews/:user_id/next", get(routes::reviews::next))
        .route("/reviews/:user_id/count", get(routes::reviews::count))
        // Quiz routes
        .route(
            "/quiz_summary/:user_id",
            get(routes::quiz::by_count).post(routes::quiz::by_cards),
        )
        // Progress routes
        .route("/progress/:user_id", get(routes::progress::level))
        .route("/stats/:user_id", get(routes::progress::words))
        .route("/mistakes/:user_id", get(routes::progress::mistakes))
        // Catalog routes
        .route("/card/:card_id", get(routes::cards::get));

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Load the stage table from the store and check it is usable
pub async fn scheduler_for(store: &Store) -> anyhow::Result<Scheduler> {
    let stages = store.load_stage_table().await?;
    tracing::info!(
        stages = stages.stages().len(),
        max_stage = stages.max_stage(),
        "loaded stage table"
    );
    Ok(Scheduler::new(stages))
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = Store::open(&config).await?;
    let scheduler = scheduler_for(&store).await?;

    let app = router(AppState::new(store, scheduler));
    let addr = config.addr();

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
