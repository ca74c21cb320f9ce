//! Core types shared across the Ledgertap crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Business intent assigned to a message by the rule-based classifier.
///
/// Classification is deterministic: a fixed rule table always yields the
/// same intent for the same text. There is no confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Intent {
    /// A product order (value = unit quantity)
    Order,
    /// A payment confirmation (value = currency amount in won)
    Payment,
    /// A unit-price change notice
    PriceNotice,
    /// A production/delivery schedule notice
    DeliveryNotice,
    /// A general inquiry
    Inquiry,
    /// A conversation wrap-up / confirmation
    Complete,
    /// No rule matched; downstream stages must not persist these
    #[default]
    Unclassified,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Order => "ORDER",
            Intent::Payment => "PAYMENT",
            Intent::PriceNotice => "PRICE_NOTICE",
            Intent::DeliveryNotice => "DELIVERY_NOTICE",
            Intent::Inquiry => "INQUIRY",
            Intent::Complete => "COMPLETE",
            Intent::Unclassified => "UNCLASSIFIED",
        }
    }

    /// Interaction tag written in front of persisted content, matching the
    /// labels operators already search for in the CRM.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Order => "[발주 접수]",
            Intent::Payment => "[입금확인]",
            Intent::PriceNotice => "[단가변동]",
            Intent::DeliveryNotice => "[납기확인]",
            Intent::Inquiry => "[문의]",
            Intent::Complete => "[완료]",
            Intent::Unclassified => "[미분류]",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`Intent`] from a string.
#[derive(Debug, Error)]
#[error("Unknown intent: {0}")]
pub struct ParseIntentError(pub String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER" => Ok(Intent::Order),
            "PAYMENT" => Ok(Intent::Payment),
            "PRICE_NOTICE" => Ok(Intent::PriceNotice),
            "DELIVERY_NOTICE" => Ok(Intent::DeliveryNotice),
            "INQUIRY" => Ok(Intent::Inquiry),
            "COMPLETE" => Ok(Intent::Complete),
            "UNCLASSIFIED" => Ok(Intent::Unclassified),
            other => Err(ParseIntentError(other.to_string())),
        }
    }
}

/// One segmented chat message, ordered by appearance in the source.
///
/// Timestamps are parsed from the header line and may be malformed; when the
/// parse fails the segmenter substitutes the processing time and sets
/// `timestamp_fallback` so reviewers can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub timestamp_fallback: bool,
}

/// A raw message plus its classified intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    #[serde(flatten)]
    pub raw: RawMessage,
    pub intent: Intent,
}

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    /// The number was present in the message itself
    Direct,
    /// Recovered from neighboring same-sender messages
    ContextFallback,
    /// Nothing found; the intent's default applies (qty 1 / amount 0)
    Default,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::Direct => "DIRECT",
            ValueSource::ContextFallback => "CONTEXT_FALLBACK",
            ValueSource::Default => "DEFAULT",
        }
    }
}

/// A classified message with its numeric payload resolved.
///
/// Value semantics depend on intent: Order carries a unit quantity
/// (default 1), Payment carries a currency amount where 0 means
/// "undetermined" and must be surfaced to a reviewer, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEvent {
    #[serde(flatten)]
    pub message: ClassifiedMessage,
    pub value: i64,
    pub value_source: ValueSource,
    /// Matched text recorded for audit when the value was recovered
    /// from context rather than the message itself.
    pub context_snippet: Option<String>,
}

impl ExtractedEvent {
    pub fn intent(&self) -> Intent {
        self.message.intent
    }

    pub fn sender(&self) -> &str {
        &self.message.raw.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.message.raw.timestamp
    }

    pub fn text(&self) -> &str {
        &self.message.raw.text
    }
}

/// Durable read position for one monitored source.
///
/// The offset never regresses except on detected truncation (stored offset
/// larger than the current file), which resets it to 0 for a full reread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub source_key: String,
    pub byte_offset: u64,
    pub last_updated: DateTime<Utc>,
}

impl Cursor {
    /// Fresh cursor at the start of a source.
    pub fn start(source_key: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
            byte_offset: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Per-source counters for one pipeline run, suitable for logging/alerting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub source_key: String,
    /// Messages produced by segmentation
    pub new_messages: usize,
    /// Messages that matched a classification rule
    pub classified: usize,
    /// Payment confirmations suppressed as duplicates
    pub deduplicated: usize,
    /// Events applied to storage
    pub applied: usize,
    /// Events skipped because the sender matched no entity (confirm policy)
    pub skipped_unmatched: usize,
    /// Events parked in the review queue (zero amounts, unmatched senders)
    pub queued_review: usize,
    /// Recoverable errors counted during the run
    pub errors: usize,
}

impl RunReport {
    pub fn new(source_key: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
            ..Default::default()
        }
    }

    /// True when the run did nothing worth reporting.
    pub fn is_empty(&self) -> bool {
        self.new_messages == 0 && self.errors == 0
    }
}
