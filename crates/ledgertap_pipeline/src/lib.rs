//! Transcript-to-event extraction engine.
//!
//! The pipeline turns raw messenger transcripts into CRM events in seven
//! stages, each its own module:
//!
//! 1. [`source`] - incremental, cursor-resumable reading of append-only
//!    log files, with encoding fallback
//! 2. [`segment`] - splitting raw text into timestamped, sender-attributed
//!    messages
//! 3. [`classify`] - ordered-rule intent classification
//! 4. [`extract`] - quantity/amount extraction with context-window fallback
//! 5. [`dedup`] - chain-aware suppression of repeated payment confirmations
//! 6. [`resolve`] - sender-to-customer resolution policy
//! 7. [`pipeline`] - the orchestrator wiring the stages per source
//!
//! [`assist`] holds the seam for an optional external extraction service
//! whose output is validated, never trusted.

pub mod assist;
pub mod classify;
pub mod dedup;
pub mod extract;
pub mod pipeline;
pub mod resolve;
pub mod segment;
pub mod source;

pub use classify::RuleTable;
pub use dedup::{dedup_payments, DedupOutcome, DEDUP_WINDOW_SECS};
pub use pipeline::{Pipeline, SourceSpec, DEFAULT_CONTEXT_WINDOW};
pub use resolve::{resolve_sender, Resolution, ResolvePolicy};
pub use source::{read_new, NewContent, SourceError};
