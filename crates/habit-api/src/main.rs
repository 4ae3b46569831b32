//! HTTP API for the habit tracker.
//!
//! Serves habit CRUD, completion recording, statistics, badges, the social
//! feed and challenges as JSON over the `habit-engine` and `database` crates.

mod auth;
mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use database::Database;
use habit_engine::SystemClock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting habit API server");

    // Connect to database
    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    db.migrate().await?;

    if config.api_token.is_none() {
        info!("HABITS_API_TOKEN not set; bearer token check disabled");
    }

    // Build application state
    let state = AppState::new(db, Arc::new(SystemClock), config.api_token.clone());

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Habit API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
