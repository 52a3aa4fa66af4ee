pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, TutorSettings};
use crate::services::exam::ExamRunner;
use crate::services::lookup::LookupCache;
use crate::services::pool_cache::PoolCache;
use crate::services::provider::{ContentProvider, HttpContentProvider};
use crate::services::scheduler::ReviewScheduler;
use crate::store::memory::MemoryStore;
use crate::store::sqlite::SqliteStore;
use crate::store::Storage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pools: Arc<PoolCache>,
    pub lookups: Arc<LookupCache>,
    pub reviews: Arc<ReviewScheduler>,
    pub exam: ExamRunner,
    pub settings: Arc<TutorSettings>,
}

impl AppState {
    /// Wire every service to one provider and one storage handle.
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        storage: Storage,
        settings: &TutorSettings,
    ) -> Self {
        Self {
            pools: Arc::new(PoolCache::new(
                provider.clone(),
                storage.clone(),
                settings.pool.clone(),
            )),
            lookups: Arc::new(LookupCache::new(provider.clone(), storage.clone())),
            reviews: Arc::new(ReviewScheduler::new(storage.clone())),
            exam: ExamRunner::new(provider, storage, settings.exam.clone()),
            settings: Arc::new(settings.clone()),
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Content routes
        .route("/api/content/:kind/:level", delete(routes::content::invalidate))
        .route("/api/content/:kind/:level/page", get(routes::content::page))
        .route("/api/content/:kind/:level/next", get(routes::content::next))
        .route("/api/content/:kind/:level/status", get(routes::content::status))
        .route("/api/lookup/:kind/:term", get(routes::content::lookup))
        // Review routes
        .route(
            "/api/reviews",
            get(routes::reviews::list).post(routes::reviews::add),
        )
        .route("/api/reviews/due", get(routes::reviews::due))
        .route("/api/reviews/reschedule", post(routes::reviews::reschedule))
        .route("/api/reviews/:key", delete(routes::reviews::remove))
        // Exam routes
        .route("/api/exam", get(routes::exam::snapshot))
        .route("/api/exam/start", post(routes::exam::start))
        .route("/api/exam/answer", post(routes::exam::answer))
        .route("/api/exam/navigate", post(routes::exam::navigate))
        .route("/api/exam/submit", post(routes::exam::submit))
        .route("/api/exam/reset", post(routes::exam::reset))
        .route("/api/exam/history", get(routes::exam::history))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
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

    tracing::info!(path = %config.database_path().display(), "Opening store...");
    std::fs::create_dir_all(&config.data_dir)?;
    let durable = SqliteStore::open(config.database_path())?;
    let storage = Storage::new(Arc::new(MemoryStore::new()), Arc::new(durable));

    let provider = HttpContentProvider::new(
        config.provider.url.clone(),
        config.provider.api_key.clone(),
        config.provider.timeout,
    )?;

    let state = AppState::new(Arc::new(provider), storage, &config.tutor);
    let exam = state.exam.clone();
    let app = build_router(state);

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    exam.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}

async fn health_check() -> &'static str {
    "OK"
}
