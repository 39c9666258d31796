// src/state.rs
use crate::{config::Config, documents::AchievementDocuments};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    // Achievement content store (MongoDB in production)
    pub documents: Arc<dyn AchievementDocuments>,
    pub config: Arc<Config>,
}

// Lets handlers extract the pool directly
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Arc<Config> {
        state.config.clone()
    }
}
