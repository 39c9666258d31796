// src/main.rs

// --- Modules ---
mod config;
mod db;
mod documents;
mod error;
mod models;
mod seed;
mod services;
mod state;
mod web;

// --- Imports ---
use crate::{config::Config, documents::mongo::MongoAchievementStore, state::AppState};
use axum::serve;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "achievement_report=debug,tower_http=info,sqlx=warn,tower_sessions=info,mongodb=warn"
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting achievement reporting server...");

    // --- Configuration ---
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;

    // --- Identity store ---
    let db_pool = match db::create_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Failed to initialise the database: {}", e);
            return Err(anyhow::anyhow!("Failed to connect/migrate DB: {}", e));
        }
    };

    seed::ensure_roles(&db_pool).await?;
    if config.seed_demo_data {
        seed::seed_demo_data(&db_pool).await?;
    }

    // --- Document store ---
    let documents = match MongoAchievementStore::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("❌ Failed to connect to MongoDB: {}", e);
            return Err(anyhow::anyhow!("Failed to connect to MongoDB: {}", e));
        }
    };

    // --- Sessions ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Failed to create session store: {}", e))?;
    session_store.migrate().await?;

    let cleanup_store = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanup_store
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Session cleanup task failed: {:?}", e);
        }
    });
    tracing::info!("🧹 Session cleanup task started.");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_expiry_hours,
        )));

    // --- Application state ---
    let addr = config.app_addr;
    let app_state = AppState {
        db_pool,
        documents: Arc::new(documents),
        config: Arc::new(config),
    };

    // --- Listener ---
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Failed to bind {}: {}", addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Listening on http://{}", addr);

    // --- Router + middleware ---
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(session_layer),
    );

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
