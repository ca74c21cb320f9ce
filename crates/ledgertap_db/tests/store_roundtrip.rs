//! Integration tests for the Ledgertap database layer.

use chrono::{NaiveDate, Utc};
use ledgertap_db::{
    LedgerDb, NewInteraction, NewOrder, NewReviewItem, ReviewReason, ReviewStatus,
};
use ledgertap_protocol::Intent;
use tempfile::TempDir;

async fn open_temp_db() -> (TempDir, LedgerDb) {
    let dir = TempDir::new().unwrap();
    let db = LedgerDb::open(dir.path().join("ledgertap.sqlite3"))
        .await
        .unwrap();
    (dir, db)
}

#[tokio::test]
async fn find_or_create_customer_is_idempotent() {
    let (_dir, db) = open_temp_db().await;

    let first = db.find_or_create_customer("홍길동").await.unwrap();
    assert!(first.auto_created);
    assert_eq!(first.company_name, "홍길동");
    assert_eq!(first.client_name, "홍길동");
    assert_eq!(first.sales_rep, "Automated");

    let second = db.find_or_create_customer("홍길동").await.unwrap();
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn lookup_matches_both_name_fields() {
    let (_dir, db) = open_temp_db().await;

    let created = db.find_or_create_customer("청솔산업").await.unwrap();

    // Placeholders carry the same value in both fields; either should match.
    let by_company = db.find_customer_by_name("청솔산업").await.unwrap();
    assert_eq!(by_company.map(|c| c.id), Some(created.id));

    let missing = db.find_customer_by_name("없는회사").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn order_roundtrip() {
    let (_dir, db) = open_temp_db().await;
    let customer = db.find_or_create_customer("A상사").await.unwrap();

    let order_date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    let id = db
        .record_order(&NewOrder {
            customer_id: customer.id,
            order_date,
            product_name: Some("메신저 발주품".to_string()),
            quantity: 500,
            total_amount: 0,
            deposit_amount: 0,
            note: Some("원본: 사과 500개 발주 부탁드립니다.".to_string()),
        })
        .await
        .unwrap();
    assert!(id > 0);

    let orders = db.orders_for_customer(customer.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, 500);
    assert_eq!(orders[0].order_date, order_date);
}

#[tokio::test]
async fn complete_latest_interaction_targets_newest_row() {
    let (_dir, db) = open_temp_db().await;
    let customer = db.find_or_create_customer("B상사").await.unwrap();
    let log_date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

    for content in ["[문의] 견적 가능할까요", "[문의] 납기 언제인가요"] {
        db.record_interaction(&NewInteraction {
            customer_id: customer.id,
            content: content.to_string(),
            next_action_date: Some(log_date),
            status: "접촉중".to_string(),
            log_date,
        })
        .await
        .unwrap();
    }

    assert!(db.complete_latest_interaction(customer.id).await.unwrap());

    let interactions = db.interactions_for_customer(customer.id).await.unwrap();
    // Newest first: the second inquiry was completed, the first untouched.
    assert_eq!(interactions[0].status, "완료");
    assert_eq!(interactions[0].next_action_date, None);
    assert_eq!(interactions[1].status, "접촉중");
}

#[tokio::test]
async fn complete_latest_interaction_without_rows_is_false() {
    let (_dir, db) = open_temp_db().await;
    let customer = db.find_or_create_customer("C상사").await.unwrap();
    assert!(!db.complete_latest_interaction(customer.id).await.unwrap());
}

#[tokio::test]
async fn cursor_upsert_and_reset() {
    let (_dir, db) = open_temp_db().await;

    assert!(db.cursor_get("korea_room").await.unwrap().is_none());

    db.cursor_put("korea_room", 128).await.unwrap();
    db.cursor_put("china_room", 64).await.unwrap();
    db.cursor_put("korea_room", 256).await.unwrap();

    let cursor = db.cursor_get("korea_room").await.unwrap().unwrap();
    assert_eq!(cursor.byte_offset, 256);

    let all = db.cursor_list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].source_key, "china_room");

    assert!(db.cursor_reset("korea_room").await.unwrap());
    assert!(db.cursor_get("korea_room").await.unwrap().is_none());
    assert!(!db.cursor_reset("korea_room").await.unwrap());
}

#[tokio::test]
async fn review_queue_lifecycle() {
    let (_dir, db) = open_temp_db().await;

    let id = db
        .review_enqueue(&NewReviewItem {
            source_key: "korea_room".to_string(),
            sender: "미등록업체".to_string(),
            intent: Intent::Payment,
            value: 0,
            content: "입금했습니다".to_string(),
            occurred_at: Utc::now(),
            reason: ReviewReason::ZeroAmount,
            note: None,
        })
        .await
        .unwrap();

    let pending = db.review_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].intent, Intent::Payment);
    assert_eq!(pending[0].reason, ReviewReason::ZeroAmount);

    assert!(db.review_resolve(id, ReviewStatus::Accepted).await.unwrap());
    assert!(db.review_pending().await.unwrap().is_empty());

    // Already resolved: second resolve is a no-op.
    assert!(!db
        .review_resolve(id, ReviewStatus::Discarded)
        .await
        .unwrap());

    let item = db.review_get(id).await.unwrap().unwrap();
    assert_eq!(item.status, ReviewStatus::Accepted);
}
