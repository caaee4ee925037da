// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use quiz_reviewer::{
    config::{Config, StorageBackend},
    repository::{LocalStore, SqliteStore, sqlite},
    routes,
    state::AppState,
};
use sqlx::SqlitePool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let state = match config.storage {
        StorageBackend::Sqlite => {
            let pool = connect_with_retry(&config).await;

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlite::migrate(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            AppState::with_store(Arc::new(SqliteStore::new(pool)), config.clone())
        }
        StorageBackend::Local => {
            let store = match &config.local_store_path {
                Some(path) => LocalStore::open(path)
                    .await
                    .expect("Failed to open local store"),
                None => LocalStore::in_memory(),
            };
            tracing::info!("Using local store");
            AppState::with_store(Arc::new(store), config.clone())
        }
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

/// Opens the database pool, retrying while the file system or volume
/// is not ready yet.
async fn connect_with_retry(config: &Config) -> SqlitePool {
    let mut retry_count = 0;
    loop {
        match sqlite::connect(&config.database_url, 5).await {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
