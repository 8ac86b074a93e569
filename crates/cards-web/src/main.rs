//! HTTP surface for the disaster-report card service.
//!
//! Serves card creation and report submission, and spawns the region
//! alert pipeline after each accepted report.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use alerting::{AlertPipeline, LoggingNotifier, Notifier};
use database::Database;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting cards web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // The notification channel is an external collaborator; the
    // logging notifier stands in until a transport is wired up.
    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);

    let pipeline = AlertPipeline::new(
        db.clone(),
        notifier,
        config.windows,
        config.alert_threshold,
    );

    // Build application state
    let state = AppState::new(db, pipeline);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Cards web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
