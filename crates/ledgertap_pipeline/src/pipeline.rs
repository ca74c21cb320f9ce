//! Pipeline orchestration.
//!
//! Wires the stages together per source: cursor → read → segment → classify
//! → extract → dedup → resolve → apply, and persists the advanced cursor
//! only after the apply loop finished. One event failing to apply is counted
//! and the rest continue; the cursor store failing aborts the run, since
//! offset tracking is foundational.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ledgertap_db::{
    LedgerDb, NewInteraction, NewOrder, NewReviewItem, ReviewItem, ReviewReason,
};
use ledgertap_protocol::{ExtractedEvent, Intent, RunReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assist::{validate_guess, ExtractionAssist};
use crate::classify::RuleTable;
use crate::dedup::dedup_payments;
use crate::extract::extract_all;
use crate::resolve::{resolve_sender, Resolution, ResolvePolicy};
use crate::segment::segment;
use crate::source::read_new;

/// How many neighboring same-sender messages the payment context fallback
/// may look back through.
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// Everything the pipeline needs to know about one monitored source.
#[derive(Clone)]
pub struct SourceSpec {
    pub key: String,
    pub path: PathBuf,
    pub rules: RuleTable,
    pub policy: ResolvePolicy,
    pub context_window: usize,
}

impl SourceSpec {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>, rules: RuleTable) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            rules,
            policy: ResolvePolicy::default(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The per-source extraction pipeline.
///
/// One instance serves any number of sources; each `run_source` call is one
/// sequential, synchronous consumption of that source's new content. Callers
/// must not run two overlapping cycles for the same source key.
pub struct Pipeline {
    db: LedgerDb,
    assist: Option<Arc<dyn ExtractionAssist>>,
}

impl Pipeline {
    pub fn new(db: LedgerDb) -> Self {
        Self { db, assist: None }
    }

    /// Attach an external extraction assist. Its output is validated and
    /// only ever used as an annotation on review items.
    pub fn with_assist(mut self, assist: Arc<dyn ExtractionAssist>) -> Self {
        self.assist = Some(assist);
        self
    }

    pub fn db(&self) -> &LedgerDb {
        &self.db
    }

    /// Process one new-content delta for a source.
    pub async fn run_source(&self, spec: &SourceSpec) -> Result<RunReport> {
        self.run_source_at(spec, Utc::now()).await
    }

    /// Like [`run_source`](Self::run_source) with an explicit "now" for
    /// timestamp fallbacks, so runs can be made deterministic.
    pub async fn run_source_at(&self, spec: &SourceSpec, now: DateTime<Utc>) -> Result<RunReport> {
        let mut report = RunReport::new(&spec.key);

        let cursor = self
            .db
            .cursor_get(&spec.key)
            .await
            .context("Cursor store unavailable")?;
        let offset = cursor.map(|c| c.byte_offset).unwrap_or(0);

        let content = match read_new(&spec.path, offset) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!(source = %spec.key, "Nothing new");
                return Ok(report);
            }
            Err(err) => {
                warn!(source = %spec.key, %err, "Skipping source this cycle");
                report.errors += 1;
                return Ok(report);
            }
        };
        info!(
            source = %spec.key,
            from = content.resumed_from,
            to = content.new_offset,
            encoding = content.encoding,
            "Read new transcript content"
        );

        let raws = segment(&content.text, now);
        report.new_messages = raws.len();

        // Classify everything before filtering: unclassified messages still
        // serve as context for the payment amount fallback.
        let classified: Vec<_> = raws.into_iter().map(|raw| spec.rules.classify(raw)).collect();
        report.classified = classified
            .iter()
            .filter(|c| c.intent != Intent::Unclassified)
            .count();

        let mut events = extract_all(classified, spec.context_window);
        events.retain(|event| event.intent() != Intent::Unclassified);

        let outcome = dedup_payments(events);
        report.deduplicated = outcome.suppressed.len();
        for duplicate in &outcome.suppressed {
            info!(
                source = %spec.key,
                sender = %duplicate.sender(),
                amount = duplicate.value,
                text = %duplicate.text(),
                "Suppressed duplicate payment confirmation"
            );
        }

        for event in &outcome.retained {
            if let Err(err) = self.apply_event(spec, event, &mut report).await {
                warn!(source = %spec.key, sender = %event.sender(), %err, "Failed to apply event");
                report.errors += 1;
            }
        }

        self.db
            .cursor_put(&spec.key, content.new_offset)
            .await
            .context("Cursor store unavailable")?;

        info!(
            source = %report.source_key,
            new_messages = report.new_messages,
            classified = report.classified,
            deduplicated = report.deduplicated,
            applied = report.applied,
            skipped_unmatched = report.skipped_unmatched,
            queued_review = report.queued_review,
            errors = report.errors,
            "Source cycle complete"
        );
        Ok(report)
    }

    async fn apply_event(
        &self,
        spec: &SourceSpec,
        event: &ExtractedEvent,
        report: &mut RunReport,
    ) -> ledgertap_db::Result<()> {
        let resolution = resolve_sender(&self.db, event.sender(), spec.policy).await?;

        let customer = match resolution {
            Resolution::Matched(c) => c,
            Resolution::Created(c) => {
                info!(source = %spec.key, sender = %event.sender(), customer_id = c.id,
                      "Auto-created placeholder customer");
                c
            }
            Resolution::NeedsReview => {
                self.enqueue_review(spec, event, ReviewReason::UnmatchedSender)
                    .await?;
                report.skipped_unmatched += 1;
                report.queued_review += 1;
                return Ok(());
            }
        };

        // An undetermined payment amount is a review case even for a known
        // sender: it must reach a human, never be silently persisted as 0.
        if event.intent() == Intent::Payment && event.value == 0 {
            self.enqueue_review(spec, event, ReviewReason::ZeroAmount)
                .await?;
            report.queued_review += 1;
            return Ok(());
        }

        let applied = self
            .apply_to_customer(
                customer.id,
                event.intent(),
                event.value,
                event.text(),
                event.context_snippet.as_deref(),
                event.timestamp(),
            )
            .await?;
        if applied {
            report.applied += 1;
        } else {
            debug!(source = %spec.key, sender = %event.sender(),
                   "Event had no effect (nothing to complete)");
        }
        Ok(())
    }

    /// Write one event against a resolved customer. Returns false when the
    /// event had nothing to do (a Complete with no open interaction).
    pub async fn apply_to_customer(
        &self,
        customer_id: i64,
        intent: Intent,
        value: i64,
        text: &str,
        snippet: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> ledgertap_db::Result<bool> {
        let log_date = occurred_at.date_naive();
        match intent {
            Intent::Order => {
                self.db
                    .record_order(&NewOrder {
                        customer_id,
                        order_date: log_date,
                        product_name: Some("메신저 발주품".to_string()),
                        quantity: value.max(1),
                        total_amount: 0,
                        deposit_amount: 0,
                        note: Some(format!("원본: {text}")),
                    })
                    .await?;
                Ok(true)
            }
            Intent::Payment => {
                let content = match snippet {
                    Some(snippet) => format!("{} {text} (문맥 감지: {snippet})", intent.label()),
                    None => format!("{} {text}", intent.label()),
                };
                self.db
                    .record_interaction(&NewInteraction {
                        customer_id,
                        content,
                        next_action_date: None,
                        status: "완료".to_string(),
                        log_date,
                    })
                    .await?;
                Ok(true)
            }
            Intent::PriceNotice => {
                self.record_tagged(customer_id, intent, text, "확인필요", log_date)
                    .await
            }
            Intent::DeliveryNotice => {
                self.record_tagged(customer_id, intent, text, "진행중", log_date)
                    .await
            }
            Intent::Inquiry => {
                self.record_tagged(customer_id, intent, text, "접촉중", log_date)
                    .await
            }
            Intent::Complete => self.db.complete_latest_interaction(customer_id).await,
            Intent::Unclassified => Ok(false),
        }
    }

    async fn record_tagged(
        &self,
        customer_id: i64,
        intent: Intent,
        text: &str,
        status: &str,
        log_date: chrono::NaiveDate,
    ) -> ledgertap_db::Result<bool> {
        self.db
            .record_interaction(&NewInteraction {
                customer_id,
                content: format!("{} {text}", intent.label()),
                next_action_date: None,
                status: status.to_string(),
                log_date,
            })
            .await?;
        Ok(true)
    }

    /// Apply an accepted review item. Acceptance is the human confirmation,
    /// so an unmatched sender is created here.
    pub async fn apply_review_item(&self, item: &ReviewItem) -> ledgertap_db::Result<bool> {
        let customer = self.db.find_or_create_customer(&item.sender).await?;
        self.apply_to_customer(
            customer.id,
            item.intent,
            item.value,
            &item.content,
            None,
            item.occurred_at,
        )
        .await
    }

    async fn enqueue_review(
        &self,
        spec: &SourceSpec,
        event: &ExtractedEvent,
        reason: ReviewReason,
    ) -> ledgertap_db::Result<()> {
        let note = self.assist_note(event.text());
        self.db
            .review_enqueue(&NewReviewItem {
                source_key: spec.key.clone(),
                sender: event.sender().to_string(),
                intent: event.intent(),
                value: event.value,
                content: event.text().to_string(),
                occurred_at: event.timestamp(),
                reason,
                note,
            })
            .await?;
        Ok(())
    }

    /// Ask the optional assist for a hint to show the reviewer. The guess
    /// is validated and failures are logged and dropped - never fatal,
    /// never written as data.
    fn assist_note(&self, text: &str) -> Option<String> {
        let assist = self.assist.as_ref()?;
        match assist.extract(text) {
            Ok(guess) => {
                if let Err(err) = validate_guess(&guess) {
                    warn!(%err, "Discarding invalid assist guess");
                    return None;
                }
                guess.amounts.last().map(|amount| format!("assist: {amount}원"))
            }
            Err(err) => {
                warn!(%err, "Extraction assist failed");
                None
            }
        }
    }
}
