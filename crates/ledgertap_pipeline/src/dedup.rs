//! Duplicate suppression for payment confirmations.
//!
//! Messenger channels repeat the same confirmation - a forwarded receipt,
//! a bot echo, a second person pasting the same screenshot. Dedup collapses
//! those: a payment matching the last *accepted* payment's amount and sender
//! within a short window is suppressed. The baseline only moves on accepted
//! positive-value events, so a chain of three rapid identical confirmations
//! collapses to one, and a zero-value event in the middle does not reset the
//! chain.

use chrono::{DateTime, Utc};
use ledgertap_protocol::{ExtractedEvent, Intent};

/// Two payments closer than this are one physical confirmation.
pub const DEDUP_WINDOW_SECS: i64 = 60;

/// Result of a dedup pass. Suppressed events keep their raw text so audit
/// logs can still show what was dropped.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub retained: Vec<ExtractedEvent>,
    pub suppressed: Vec<ExtractedEvent>,
}

struct Baseline {
    amount: i64,
    sender: String,
    timestamp: DateTime<Utc>,
}

/// Collapse repeated payment confirmations in a batch.
///
/// Events are ordered chronologically first; non-payment events pass through
/// untouched and never disturb the payment baseline.
pub fn dedup_payments(mut events: Vec<ExtractedEvent>) -> DedupOutcome {
    events.sort_by_key(|e| e.timestamp());

    let mut outcome = DedupOutcome::default();
    let mut baseline: Option<Baseline> = None;

    for event in events {
        if event.intent() != Intent::Payment || event.value <= 0 {
            outcome.retained.push(event);
            continue;
        }

        let is_duplicate = baseline.as_ref().is_some_and(|b| {
            b.amount == event.value
                && b.sender == event.sender()
                && (event.timestamp() - b.timestamp).num_seconds().abs() < DEDUP_WINDOW_SECS
        });

        if is_duplicate {
            outcome.suppressed.push(event);
        } else {
            baseline = Some(Baseline {
                amount: event.value,
                sender: event.sender().to_string(),
                timestamp: event.timestamp(),
            });
            outcome.retained.push(event);
        }
    }

    outcome
}
