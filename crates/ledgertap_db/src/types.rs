//! Row-facing types for the Ledgertap database.

use chrono::{DateTime, NaiveDate, Utc};
use ledgertap_protocol::Intent;
use serde::{Deserialize, Serialize};

/// A stored customer. `auto_created` marks placeholders the pipeline made
/// for senders that matched no existing entity; those stay unverified until
/// an operator edits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub company_name: String,
    pub client_name: String,
    pub phone: String,
    pub industry: String,
    pub sales_rep: String,
    pub auto_created: bool,
}

/// Order insert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub order_date: NaiveDate,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub note: Option<String>,
}

/// A stored order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub order_date: NaiveDate,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub note: Option<String>,
}

/// Interaction insert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInteraction {
    pub customer_id: i64,
    pub content: String,
    pub next_action_date: Option<NaiveDate>,
    pub status: String,
    pub log_date: NaiveDate,
}

/// A stored interaction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: i64,
    pub customer_id: i64,
    pub content: String,
    pub next_action_date: Option<NaiveDate>,
    pub status: String,
    pub log_date: NaiveDate,
}

/// Why an event was parked for human review instead of being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewReason {
    /// Sender matched no customer and the source runs under confirm policy
    UnmatchedSender,
    /// Payment whose amount could not be determined (value 0)
    ZeroAmount,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::UnmatchedSender => "UNMATCHED_SENDER",
            ReviewReason::ZeroAmount => "ZERO_AMOUNT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNMATCHED_SENDER" => Some(ReviewReason::UnmatchedSender),
            "ZERO_AMOUNT" => Some(ReviewReason::ZeroAmount),
            _ => None,
        }
    }
}

/// Review queue lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Discarded,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Accepted => "ACCEPTED",
            ReviewStatus::Discarded => "DISCARDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReviewStatus::Pending),
            "ACCEPTED" => Some(ReviewStatus::Accepted),
            "DISCARDED" => Some(ReviewStatus::Discarded),
            _ => None,
        }
    }
}

/// Review queue insert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReviewItem {
    pub source_key: String,
    pub sender: String,
    pub intent: Intent,
    pub value: i64,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
    pub reason: ReviewReason,
    /// Optional annotation, e.g. an (untrusted, validated) assist suggestion.
    pub note: Option<String>,
}

/// A stored review queue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: i64,
    pub source_key: String,
    pub sender: String,
    pub intent: Intent,
    pub value: i64,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
    pub reason: ReviewReason,
    pub note: Option<String>,
    pub status: ReviewStatus,
}
