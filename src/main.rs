// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use lms_quiz::config::Config;
use lms_quiz::routes;
use lms_quiz::state::AppState;
use lms_quiz::store::{MemoryQuizStore, PgQuizStore, SharedStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz.log");
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

    let store: SharedStore = match &config.database_url {
        Some(database_url) => {
            let pool = connect_with_retry(database_url).await;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgQuizStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; quizzes are kept in memory and lost on exit");
            Arc::new(MemoryQuizStore::new())
        }
    };

    let addr = config.server_addr;
    let state = AppState::new(store, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Connects to Postgres, retrying while the database container starts up.
async fn connect_with_retry(database_url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                break pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
