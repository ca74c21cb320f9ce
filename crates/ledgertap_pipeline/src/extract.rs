//! Value extraction.
//!
//! Resolves the numeric payload of a classified message: unit quantity for
//! orders, currency amount for payments. A payment without an explicit
//! amount falls back to a context-window search over the same sender's
//! nearest previously-extracted messages; only when that also fails does the
//! amount stay 0 ("undetermined"), which downstream routes to human review.

use ledgertap_protocol::{ClassifiedMessage, ExtractedEvent, Intent, ValueSource};
use once_cell::sync::Lazy;
use regex::Regex;

/// Quantity pattern: a count followed by a piece/box unit.
static QTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(개|박스|box|ea)").expect("quantity regex"));

/// Amount pattern: digits with optional thousands separators plus a won unit.
/// 만원 is tried before 원 so the longer unit wins.
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9][0-9,]*)\s*(만원|원)").expect("amount regex"));

/// Date-shaped substrings are stripped before amount scanning so `2025-01-10`
/// never contributes candidate digits.
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex"));

/// Strip thousands separators and parse. Parse failures are "no match".
pub fn sanitize_number(raw: &str) -> Option<i64> {
    raw.replace(',', "").parse::<i64>().ok().filter(|v| *v >= 0)
}

/// Explicit order quantity in the text, if any.
pub fn order_quantity(text: &str) -> Option<i64> {
    QTY_RE
        .captures(text)
        .and_then(|caps| sanitize_number(&caps[1]))
}

/// All positive currency amounts in the text, in order of appearance,
/// each with the matched snippet for audit.
pub fn amount_candidates(text: &str) -> Vec<(i64, String)> {
    let cleaned = DATE_RE.replace_all(text, "");
    AMOUNT_RE
        .captures_iter(&cleaned)
        .filter_map(|caps| {
            let value = sanitize_number(&caps[1])?;
            let scaled = if &caps[2] == "만원" {
                value.checked_mul(10_000)?
            } else {
                value
            };
            (scaled > 0).then(|| (scaled, caps[0].to_string()))
        })
        .collect()
}

/// Context Window Search: the last valid amount among the up-to-`window`
/// chronologically nearest previously-extracted messages from the same
/// sender. Never looks at another sender's messages.
fn context_amount(
    sender: &str,
    history: &[ExtractedEvent],
    window: usize,
) -> Option<(i64, String)> {
    let mut nearest: Vec<&ExtractedEvent> = history
        .iter()
        .rev()
        .filter(|event| event.sender() == sender)
        .take(window)
        .collect();
    nearest.reverse();

    nearest
        .iter()
        .flat_map(|event| amount_candidates(event.text()))
        .last()
}

/// Resolve the value for one classified message.
///
/// `history` is the run's already-extracted events in chronological order;
/// it feeds the payment context fallback.
pub fn extract(
    message: ClassifiedMessage,
    history: &[ExtractedEvent],
    window: usize,
) -> ExtractedEvent {
    let (value, value_source, context_snippet) = match message.intent {
        Intent::Order => match order_quantity(&message.raw.text) {
            Some(qty) => (qty, ValueSource::Direct, None),
            None => (1, ValueSource::Default, None),
        },
        Intent::Payment => {
            if let Some((amount, _)) = amount_candidates(&message.raw.text).into_iter().next() {
                (amount, ValueSource::Direct, None)
            } else if let Some((amount, snippet)) =
                context_amount(&message.raw.sender, history, window)
            {
                (amount, ValueSource::ContextFallback, Some(snippet))
            } else {
                (0, ValueSource::Default, None)
            }
        }
        _ => (0, ValueSource::Default, None),
    };

    ExtractedEvent {
        message,
        value,
        value_source,
        context_snippet,
    }
}

/// Extract values for a whole batch, threading the growing history through
/// so later messages can fall back to earlier ones.
pub fn extract_all(messages: Vec<ClassifiedMessage>, window: usize) -> Vec<ExtractedEvent> {
    let mut events: Vec<ExtractedEvent> = Vec::with_capacity(messages.len());
    for message in messages {
        let event = extract(message, &events, window);
        events.push(event);
    }
    events
}
