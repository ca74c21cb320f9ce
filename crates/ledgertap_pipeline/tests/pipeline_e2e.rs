//! End-to-end pipeline tests: transcript file in, CRM rows and cursor out.

use chrono::{TimeZone, Utc};
use ledgertap_db::{LedgerDb, ReviewReason, ReviewStatus};
use ledgertap_pipeline::assist::{AssistGuess, ExtractionAssist};
use ledgertap_pipeline::{Pipeline, ResolvePolicy, RuleTable, SourceSpec};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

async fn setup(dir: &TempDir) -> (LedgerDb, Pipeline) {
    let db = LedgerDb::open(dir.path().join("ledgertap.sqlite3"))
        .await
        .unwrap();
    let pipeline = Pipeline::new(db.clone());
    (db, pipeline)
}

fn write_log(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn append_log(path: &PathBuf, content: &str) {
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

const LIVE_LOG: &str = "\
[2025-01-10 오후 3:05] 홍길동
사과 500개 발주 부탁드립니다.
[2025-01-10 오후 3:06] A상사
50000원 맞나요
[2025-01-10 오후 3:07] A상사
입금했습니다
[2025-01-10 오후 3:08] B상사
300,000원 입금 확인 부탁드립니다
[2025-01-10 오후 3:08] B상사
300,000원 입금 확인 부탁드립니다
[2025-01-10 오후 3:09] C상사
단가 인상 안내드립니다
";

#[tokio::test]
async fn live_monitor_batch_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;
    let path = write_log(&dir, "korea.txt", LIVE_LOG);
    let spec = SourceSpec::new("korea_room", &path, RuleTable::live_monitor());

    let report = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();

    assert_eq!(report.new_messages, 6);
    // "50000원 맞나요" matches no rule and is dropped (but still served as
    // payment context below).
    assert_eq!(report.classified, 5);
    assert_eq!(report.deduplicated, 1);
    assert_eq!(report.applied, 4);
    assert_eq!(report.queued_review, 0);
    assert_eq!(report.errors, 0);

    // Order: quantity extracted, raw text kept in the note.
    let hong = db.find_customer_by_name("홍길동").await.unwrap().unwrap();
    assert!(hong.auto_created);
    let orders = db.orders_for_customer(hong.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, 500);
    assert!(orders[0].note.as_deref().unwrap().contains("사과 500개"));

    // Payment without a number recovered the amount from the sender's
    // neighboring message.
    let a = db.find_customer_by_name("A상사").await.unwrap().unwrap();
    let a_rows = db.interactions_for_customer(a.id).await.unwrap();
    assert_eq!(a_rows.len(), 1);
    assert!(a_rows[0].content.contains("[입금확인]"));
    assert!(a_rows[0].content.contains("문맥 감지: 50000원"));

    // Two identical confirmations collapsed to one.
    let b = db.find_customer_by_name("B상사").await.unwrap().unwrap();
    assert_eq!(db.interactions_for_customer(b.id).await.unwrap().len(), 1);

    // Price notice landed with its tag and follow-up status.
    let c = db.find_customer_by_name("C상사").await.unwrap().unwrap();
    let c_rows = db.interactions_for_customer(c.id).await.unwrap();
    assert!(c_rows[0].content.contains("[단가변동]"));
    assert_eq!(c_rows[0].status, "확인필요");

    // Cursor sits at end of file.
    let cursor = db.cursor_get("korea_room").await.unwrap().unwrap();
    assert_eq!(cursor.byte_offset, LIVE_LOG.len() as u64);
}

#[tokio::test]
async fn second_run_consumes_only_the_delta() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;
    let path = write_log(&dir, "korea.txt", LIVE_LOG);
    let spec = SourceSpec::new("korea_room", &path, RuleTable::live_monitor());

    pipeline.run_source_at(&spec, fixed_now()).await.unwrap();

    // Nothing new: empty report, cursor unchanged.
    let idle = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(idle.new_messages, 0);

    append_log(&path, "[2025-01-10 오후 4:00] 홍길동\n주문 3박스 추가요\n");
    let delta = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(delta.new_messages, 1);
    assert_eq!(delta.applied, 1);

    let hong = db.find_customer_by_name("홍길동").await.unwrap().unwrap();
    let orders = db.orders_for_customer(hong.id).await.unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first.
    assert_eq!(orders[0].quantity, 3);
}

#[tokio::test]
async fn truncated_source_is_reread_in_full() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;
    let path = write_log(&dir, "korea.txt", LIVE_LOG);
    let spec = SourceSpec::new("korea_room", &path, RuleTable::live_monitor());

    pipeline.run_source_at(&spec, fixed_now()).await.unwrap();

    // The log rotated: a fresh, shorter file replaced it.
    let rotated = "[2025-01-11 오전 9:00] 홍길동\n발주 100개 부탁합니다\n";
    std::fs::write(&path, rotated).unwrap();

    let report = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(report.new_messages, 1);
    assert_eq!(report.applied, 1);

    let cursor = db.cursor_get("korea_room").await.unwrap().unwrap();
    assert_eq!(cursor.byte_offset, rotated.len() as u64);
}

#[tokio::test]
async fn missing_source_skips_without_touching_others() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;
    let missing = SourceSpec::new(
        "ghost_room",
        dir.path().join("absent.txt"),
        RuleTable::live_monitor(),
    );

    let report = pipeline.run_source_at(&missing, fixed_now()).await.unwrap();
    assert_eq!(report.new_messages, 0);
    assert_eq!(report.errors, 0);
    assert!(db.cursor_get("ghost_room").await.unwrap().is_none());
}

#[tokio::test]
async fn confirm_policy_parks_unmatched_and_zero_amount_events() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;

    // This customer exists; the other sender does not.
    db.find_or_create_customer("기존고객").await.unwrap();

    let log = "\
[2025-01-10 오후 3:05] 미등록업체
발주서 보냅니다
[2025-01-10 오후 3:06] 기존고객
입금액 확인 부탁드립니다
";
    let path = write_log(&dir, "import.txt", log);
    let spec = SourceSpec::new("import", &path, RuleTable::strict_import())
        .with_policy(ResolvePolicy::Confirm);

    let report = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(report.classified, 2);
    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped_unmatched, 1);
    assert_eq!(report.queued_review, 2);

    let pending = db.review_pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].reason, ReviewReason::UnmatchedSender);
    assert_eq!(pending[1].reason, ReviewReason::ZeroAmount);

    // No placeholder was silently created under confirm policy.
    assert!(db
        .find_customer_by_name("미등록업체")
        .await
        .unwrap()
        .is_none());

    // A human accepts the unmatched order: only then is the customer
    // created and the order written.
    let item = &pending[0];
    assert!(pipeline.apply_review_item(item).await.unwrap());
    assert!(db.review_resolve(item.id, ReviewStatus::Accepted).await.unwrap());

    let created = db
        .find_customer_by_name("미등록업체")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(db.orders_for_customer(created.id).await.unwrap().len(), 1);
    assert_eq!(db.review_pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn complete_closes_the_open_interaction() {
    let dir = TempDir::new().unwrap();
    let (db, pipeline) = setup(&dir).await;

    let log = "\
[2025-01-10 오후 2:00] 거래처
재고 문의드립니다
[2025-01-10 오후 2:30] 거래처
감사합니다
";
    let path = write_log(&dir, "room.txt", log);
    let spec = SourceSpec::new("room", &path, RuleTable::live_monitor());

    let report = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(report.applied, 2);

    let customer = db.find_customer_by_name("거래처").await.unwrap().unwrap();
    let rows = db.interactions_for_customer(customer.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].content.contains("[문의]"));
    assert_eq!(rows[0].status, "완료");
}

struct FixedAssist(Vec<i64>);

impl ExtractionAssist for FixedAssist {
    fn extract(&self, _text: &str) -> anyhow::Result<AssistGuess> {
        Ok(AssistGuess {
            amounts: self.0.clone(),
            ..Default::default()
        })
    }
}

#[tokio::test]
async fn assist_annotates_review_items_but_never_writes_values() {
    let dir = TempDir::new().unwrap();
    let db = LedgerDb::open(dir.path().join("ledgertap.sqlite3"))
        .await
        .unwrap();
    let pipeline = Pipeline::new(db.clone()).with_assist(Arc::new(FixedAssist(vec![50_000])));

    let log = "[2025-01-10 오후 3:06] 고객사\n입금했습니다\n";
    let path = write_log(&dir, "room.txt", log);
    let spec = SourceSpec::new("room", &path, RuleTable::live_monitor());

    let report = pipeline.run_source_at(&spec, fixed_now()).await.unwrap();
    assert_eq!(report.queued_review, 1);
    assert_eq!(report.applied, 0);

    let pending = db.review_pending().await.unwrap();
    assert_eq!(pending[0].reason, ReviewReason::ZeroAmount);
    assert_eq!(pending[0].value, 0);
    assert_eq!(pending[0].note.as_deref(), Some("assist: 50000원"));
}

#[tokio::test]
async fn invalid_assist_guess_is_dropped() {
    let dir = TempDir::new().unwrap();
    let db = LedgerDb::open(dir.path().join("ledgertap.sqlite3"))
        .await
        .unwrap();
    // Negative amount fails validation; the review item gets no note.
    let pipeline = Pipeline::new(db.clone()).with_assist(Arc::new(FixedAssist(vec![-1])));

    let log = "[2025-01-10 오후 3:06] 고객사\n입금했습니다\n";
    let path = write_log(&dir, "room.txt", log);
    let spec = SourceSpec::new("room", &path, RuleTable::live_monitor());

    pipeline.run_source_at(&spec, fixed_now()).await.unwrap();

    let pending = db.review_pending().await.unwrap();
    assert_eq!(pending[0].note, None);
}
