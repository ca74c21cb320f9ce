//! Database schema creation for all Ledgertap tables.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::LedgerDb;
use tracing::info;

impl LedgerDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // WAL for concurrent readers while a pipeline run writes
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        self.create_crm_tables().await?;
        self.create_cursor_tables().await?;
        self.create_review_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Customers, orders, interactions - the CRM entities the pipeline feeds.
    async fn create_crm_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lt_customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                client_name TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                industry TEXT NOT NULL DEFAULT '',
                sales_rep TEXT NOT NULL DEFAULT '',
                auto_created INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_customers_names
             ON lt_customers(company_name, client_name)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lt_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL REFERENCES lt_customers(id),
                order_date TEXT NOT NULL,
                product_name TEXT,
                quantity INTEGER NOT NULL DEFAULT 0,
                total_amount INTEGER NOT NULL DEFAULT 0,
                deposit_amount INTEGER NOT NULL DEFAULT 0,
                note TEXT,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lt_interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL REFERENCES lt_customers(id),
                content TEXT NOT NULL,
                next_action_date TEXT,
                status TEXT NOT NULL,
                log_date TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_interactions_customer
             ON lt_interactions(customer_id, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// One durable byte offset per monitored source.
    async fn create_cursor_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lt_cursors (
                source_key TEXT PRIMARY KEY,
                byte_offset INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Events parked for human confirmation before any CRM write.
    async fn create_review_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lt_review_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_key TEXT NOT NULL,
                sender TEXT NOT NULL,
                intent TEXT NOT NULL,
                value INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL,
                occurred_at INTEGER NOT NULL,
                reason TEXT NOT NULL,
                note TEXT,
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at INTEGER NOT NULL,
                resolved_at INTEGER
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_review_status
             ON lt_review_queue(status, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
