//! Shared data model for Ledgertap.
//!
//! Everything that flows between the pipeline stages lives here: the
//! segmented message, its classified intent, the extracted event, the
//! per-source cursor, and the per-run operational report. All of it is
//! transient except the [`Cursor`], which is persisted by `ledgertap_db`.

pub mod types;

pub use types::{
    ClassifiedMessage, Cursor, ExtractedEvent, Intent, ParseIntentError, RawMessage, RunReport,
    ValueSource,
};
