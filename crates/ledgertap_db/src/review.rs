//! Human review queue.
//!
//! Events the pipeline refuses to apply on its own - unmatched senders under
//! confirm policy, payments with an undetermined amount - land here and wait
//! for an operator to accept or discard them.

use crate::error::{DbError, Result};
use crate::types::{NewReviewItem, ReviewItem, ReviewReason, ReviewStatus};
use crate::LedgerDb;
use ledgertap_protocol::Intent;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl LedgerDb {
    /// Park an event for review, returning the queue id.
    pub async fn review_enqueue(&self, item: &NewReviewItem) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO lt_review_queue
                (source_key, sender, intent, value, content,
                 occurred_at, reason, note, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(&item.source_key)
        .bind(&item.sender)
        .bind(item.intent.as_str())
        .bind(item.value)
        .bind(&item.content)
        .bind(item.occurred_at.timestamp_millis())
        .bind(item.reason.as_str())
        .bind(item.note.as_deref())
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All pending review items, oldest first.
    pub async fn review_pending(&self) -> Result<Vec<ReviewItem>> {
        let rows =
            sqlx::query("SELECT * FROM lt_review_queue WHERE status = 'PENDING' ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_review_item).collect()
    }

    /// Get one review item by id.
    pub async fn review_get(&self, id: i64) -> Result<Option<ReviewItem>> {
        let row = sqlx::query("SELECT * FROM lt_review_queue WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_review_item).transpose()
    }

    /// Move a pending item to Accepted or Discarded. Returns false when the
    /// item was not pending (already resolved, or missing).
    pub async fn review_resolve(&self, id: i64, status: ReviewStatus) -> Result<bool> {
        if status == ReviewStatus::Pending {
            return Err(DbError::invalid_state(
                "Cannot resolve a review item back to PENDING",
            ));
        }

        let result = sqlx::query(
            "UPDATE lt_review_queue SET status = ?, resolved_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(status.as_str())
        .bind(Self::now_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_review_item(row: &SqliteRow) -> Result<ReviewItem> {
    let intent_raw: String = row.get("intent");
    let intent = intent_raw
        .parse::<Intent>()
        .map_err(|e| DbError::corrupt(e.to_string()))?;

    let reason_raw: String = row.get("reason");
    let reason = ReviewReason::parse(&reason_raw)
        .ok_or_else(|| DbError::corrupt(format!("Bad review reason: {reason_raw}")))?;

    let status_raw: String = row.get("status");
    let status = ReviewStatus::parse(&status_raw)
        .ok_or_else(|| DbError::corrupt(format!("Bad review status: {status_raw}")))?;

    Ok(ReviewItem {
        id: row.get("id"),
        source_key: row.get("source_key"),
        sender: row.get("sender"),
        intent,
        value: row.get("value"),
        content: row.get("content"),
        occurred_at: LedgerDb::millis_to_datetime(row.get("occurred_at")),
        reason,
        note: row.get("note"),
        status,
    })
}
