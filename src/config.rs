// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Which repository implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Relational store (SQLite through sqlx).
    Sqlite,
    /// In-process store with an optional JSON snapshot file.
    Local,
}

impl StorageBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "memory" | "json" => StorageBackend::Local,
            _ => StorageBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageBackend,
    /// Snapshot file for the local backend. `None` keeps everything in memory.
    pub local_store_path: Option<String>,
    /// "production" hides storage error details from clients.
    pub app_env: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rust_log: String,
}

pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:4200",
    "http://localhost:8100",
    "http://localhost:8101",
];

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz_reviewer.db".to_string());

        let storage = env::var("STORAGE_BACKEND")
            .map(|v| StorageBackend::parse(&v))
            .unwrap_or(StorageBackend::Sqlite);

        let local_store_path = match env::var("LOCAL_STORE_PATH") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(path),
            Err(_) => Some("quiz_reviewer.json".to_string()),
        };

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            storage,
            local_store_path,
            app_env,
            port,
            cors_origins,
            rust_log,
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            storage: StorageBackend::Sqlite,
            local_store_path: None,
            app_env: "development".to_string(),
            port: 3000,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            rust_log: "info".to_string(),
        }
    }
}
