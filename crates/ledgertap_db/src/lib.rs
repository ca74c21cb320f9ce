//! Unified database layer for Ledgertap.
//!
//! This crate is the single source of truth for everything Ledgertap
//! persists: CRM entities (customers, orders, interactions), the per-source
//! read cursors, and the human review queue. All other crates go through
//! [`LedgerDb`]; nothing else touches SQLite directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ledgertap_db::{LedgerDb, Result};
//!
//! let db = LedgerDb::open("~/.ledgertap/data/ledgertap.sqlite3").await?;
//! let customer = db.find_or_create_customer("홍길동").await?;
//! let cursor = db.cursor_get("korea_room").await?;
//! ```

mod crm;
mod cursor;
mod error;
mod review;
mod schema;
mod types;

pub use error::{DbError, Result};
pub use types::{
    Customer, InteractionRecord, NewInteraction, NewOrder, NewReviewItem, OrderRecord,
    ReviewItem, ReviewReason, ReviewStatus,
};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Unified database handle for all Ledgertap operations.
#[derive(Clone)]
pub struct LedgerDb {
    pool: SqlitePool,
}

impl LedgerDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an existing database (fails if it does not exist).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        Ok(Self { pool })
    }

    /// The underlying pool (escape hatch; prefer the typed methods).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Current time as milliseconds since the Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert stored epoch milliseconds back to a DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}
