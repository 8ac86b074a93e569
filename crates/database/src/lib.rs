//! SQLite persistence gateway for the disaster-report card service.
//!
//! This crate provides async database operations for report cards,
//! reports, region subscriptions, the alert dedup log, and the card
//! audit trail using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{card, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:cards.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Open a card for a conversation
//!     let card = card::create_card(db.pool(), "+6281234567890", "whatsapp", "id").await?;
//!     println!("card {}", card.card_id);
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod card;
pub mod dedup_log;
pub mod error;
pub mod models;
pub mod report;
pub mod subscription;

pub use error::{DatabaseError, Result};
pub use models::{
    ActiveReport, AuditLogEntry, Card, CardRecord, DisasterType, RegionSubscription, Report,
    SubscriptionLogEntry,
};
pub use report::{NewReport, WindowCutoffs};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough that concurrent alert passes never queue on the pool.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist,
    /// or `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
