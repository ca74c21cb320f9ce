//! Message segmentation.
//!
//! Splits a raw transcript blob into ordered, timestamped, sender-attributed
//! messages. A message opens at a header line of the form
//! `[YYYY-MM-DD 오전|오후|AM|PM H:MM] sender` and collects every following
//! line until the next header or end of input. Lines before the first header
//! have no open message to attach to and are dropped.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use ledgertap_protocol::RawMessage;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2}) (오전|오후|AM|PM) (\d{1,2}):(\d{2})\] (.*)$")
        .expect("header regex")
});

/// Segment a transcript blob into messages.
///
/// `now` is substituted (and flagged) when a header's date or time does not
/// parse; passing it in keeps segmentation deterministic for callers that
/// need it to be. A blob with no header yields an empty vec, never an error.
pub fn segment(text: &str, now: DateTime<Utc>) -> Vec<RawMessage> {
    let mut messages = Vec::new();
    let mut open: Option<OpenMessage> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(prev) = open.take() {
                messages.push(prev.finish());
            }

            let sender = caps[5].trim().to_string();
            if sender.is_empty() {
                // Header without a sender opens nothing; following lines
                // are dropped like lines before the first header.
                continue;
            }

            let (timestamp, fallback) = parse_header_timestamp(&caps, now);
            open = Some(OpenMessage {
                timestamp,
                sender,
                timestamp_fallback: fallback,
                lines: Vec::new(),
            });
        } else if let Some(current) = open.as_mut() {
            current.lines.push(line.to_string());
        }
    }

    if let Some(last) = open.take() {
        messages.push(last.finish());
    }

    messages
}

struct OpenMessage {
    timestamp: DateTime<Utc>,
    sender: String,
    timestamp_fallback: bool,
    lines: Vec<String>,
}

impl OpenMessage {
    fn finish(self) -> RawMessage {
        RawMessage {
            timestamp: self.timestamp,
            sender: self.sender,
            text: self.lines.join("\n"),
            timestamp_fallback: self.timestamp_fallback,
        }
    }
}

fn parse_header_timestamp(caps: &regex::Captures<'_>, now: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    let hour: u32 = match caps[3].parse() {
        Ok(h) => h,
        Err(_) => return (now, true),
    };
    let minute: u32 = match caps[4].parse() {
        Ok(m) => m,
        Err(_) => return (now, true),
    };
    let time = NaiveTime::from_hms_opt(to_hour24(&caps[2], hour), minute, 0);

    match (date, time) {
        (Some(date), Some(time)) => (Utc.from_utc_datetime(&date.and_time(time)), false),
        _ => (now, true),
    }
}

/// 12 AM/오전 12 is midnight; 12 PM/오후 12 stays noon; other afternoon
/// hours gain 12. Out-of-range hours fall through to the caller's
/// `from_hms_opt` check.
fn to_hour24(meridiem: &str, hour: u32) -> u32 {
    let afternoon = matches!(meridiem, "오후" | "PM");
    if afternoon && hour != 12 {
        hour + 12
    } else if !afternoon && hour == 12 {
        0
    } else {
        hour
    }
}
