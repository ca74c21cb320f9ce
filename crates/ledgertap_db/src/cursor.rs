//! Durable per-source read cursors.
//!
//! One row per source key: how many bytes of the transcript have already
//! been consumed. The pipeline reads the offset before a run and writes the
//! new one only after the derived events were applied, so a crash in between
//! replays the same content rather than losing it.

use crate::error::Result;
use crate::LedgerDb;
use ledgertap_protocol::Cursor;
use sqlx::Row;

impl LedgerDb {
    /// Load the cursor for a source, if one was ever stored.
    pub async fn cursor_get(&self, source_key: &str) -> Result<Option<Cursor>> {
        let row = sqlx::query(
            "SELECT source_key, byte_offset, last_updated FROM lt_cursors WHERE source_key = ?",
        )
        .bind(source_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Cursor {
            source_key: r.get("source_key"),
            byte_offset: r.get::<i64, _>("byte_offset").max(0) as u64,
            last_updated: Self::millis_to_datetime(r.get("last_updated")),
        }))
    }

    /// Upsert the cursor for a source.
    pub async fn cursor_put(&self, source_key: &str, byte_offset: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lt_cursors (source_key, byte_offset, last_updated)
            VALUES (?, ?, ?)
            ON CONFLICT(source_key) DO UPDATE SET
                byte_offset = excluded.byte_offset,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(source_key)
        .bind(byte_offset as i64)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All stored cursors, ordered by source key.
    pub async fn cursor_list(&self) -> Result<Vec<Cursor>> {
        let rows = sqlx::query(
            "SELECT source_key, byte_offset, last_updated FROM lt_cursors ORDER BY source_key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Cursor {
                source_key: r.get("source_key"),
                byte_offset: r.get::<i64, _>("byte_offset").max(0) as u64,
                last_updated: Self::millis_to_datetime(r.get("last_updated")),
            })
            .collect())
    }

    /// Drop the cursor for a source so the next run rereads it from byte 0.
    /// Returns false when no cursor existed.
    pub async fn cursor_reset(&self, source_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lt_cursors WHERE source_key = ?")
            .bind(source_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
