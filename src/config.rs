// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the service keeps quizzes in memory.
    pub database_url: Option<String>,
    /// Shared with the sign-in service that issues bearer tokens.
    pub jwt_secret: String,
    pub rust_log: String,
    pub log_dir: String,
    pub server_addr: SocketAddr,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let server_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .expect("SERVER_ADDR must be a socket address, e.g. 0.0.0.0:3000");

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );

        Self {
            database_url,
            jwt_secret,
            rust_log,
            log_dir,
            server_addr,
            cors_origins,
        }
    }
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
