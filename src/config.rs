// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

/// Runtime settings, read once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_addr: SocketAddr,
    pub database_url: String,
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub seed_demo_data: bool,
    pub session_expiry_hours: i64,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Builds the configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, but with an injectable lookup so tests don't touch the real env.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, fallback: &str| lookup(key).unwrap_or_else(|| fallback.to_string());

        Ok(Config {
            app_addr: parse_value("APP_ADDR", &get("APP_ADDR", "0.0.0.0:3000"))?,
            database_url: get("DATABASE_URL", "sqlite://achievements.db"),
            mongo_uri: get("MONGO_URI", "mongodb://localhost:27017"),
            mongo_db_name: get("MONGO_DB_NAME", "achievement_logs"),
            upload_dir: PathBuf::from(get("UPLOAD_DIR", "./uploads")),
            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            seed_demo_data: parse_value("SEED_DEMO_DATA", &get("SEED_DEMO_DATA", "true"))?,
            session_expiry_hours: parse_value(
                "SESSION_EXPIRY_HOURS",
                &get("SESSION_EXPIRY_HOURS", "24"),
            )?,
            max_upload_bytes: parse_value("MAX_UPLOAD_BYTES", &get("MAX_UPLOAD_BYTES", "10485760"))?,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::ConfigError(format!("{} has an invalid value: '{}'", key, raw)))
}
