//! Reelvault backend entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelvault::config::Config;
use reelvault::db::Database;
use reelvault::services::{BroadcastSink, ConflictService, ScannerService, TmdbClient};
use reelvault::{api, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reelvault backend");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("Database connected and migrated");

    let store = Arc::new(db.clone());
    let resolver = Arc::new(TmdbClient::new(config.tmdb_api_key.clone()));
    let progress = Arc::new(BroadcastSink::new());

    let scanner = Arc::new(ScannerService::new(
        store.clone(),
        resolver.clone(),
        progress.clone(),
    ));
    let conflicts = Arc::new(ConflictService::new(store, resolver));
    tracing::info!("Scanner and conflict services initialized");

    let _scheduler = jobs::start_scheduler(scanner.clone(), &config.scan_schedule).await?;

    let state = AppState {
        db,
        scanner,
        conflicts,
        progress,
    };

    let app = api::router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
