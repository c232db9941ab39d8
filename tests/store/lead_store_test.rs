//! Tests for `src/store/mod.rs`: SQLite lead store.

use chrono::{TimeZone, Utc};

use leadline::leads::LeadRecord;
use leadline::store::{LeadStore, SqliteLeadStore, StoreError};

use crate::common::memory_pool;

fn record(name: &str, contact: &str) -> LeadRecord {
    LeadRecord {
        name: name.to_owned(),
        contact: contact.to_owned(),
        original_message: format!("I am {name}"),
        captured_at: Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

async fn setup_store() -> SqliteLeadStore {
    SqliteLeadStore::from_pool(memory_pool().await)
        .await
        .expect("schema should apply")
}

#[tokio::test]
async fn append_returns_increasing_ids() {
    let store = setup_store().await;

    let first = store
        .append(&record("Ana", "ana@x.com"))
        .await
        .expect("append should succeed");
    let second = store
        .append(&record("Juan", "555-0001"))
        .await
        .expect("append should succeed");

    assert!(second > first);
}

#[tokio::test]
async fn append_persists_every_field() {
    let store = setup_store().await;
    let lead = record("Ana Perez", "ana@x.com");

    let id = store.append(&lead).await.expect("append should succeed");
    let rows = store.recent(5).await.expect("read should succeed");

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, id);
    assert_eq!(row.name, "Ana Perez");
    assert_eq!(row.contact, "ana@x.com");
    assert_eq!(row.original_message, "I am Ana Perez");
    assert_eq!(row.captured_at, "2026-03-01T12:00:00+00:00");
}

#[tokio::test]
async fn identical_leads_are_not_merged() {
    let store = setup_store().await;
    let lead = record("Ana", "ana@x.com");

    store.append(&lead).await.expect("append should succeed");
    store.append(&lead).await.expect("append should succeed");

    let rows = store.recent(10).await.expect("read should succeed");
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn recent_is_newest_first_and_limited() {
    let store = setup_store().await;
    for name in ["a", "b", "c"] {
        store
            .append(&record(name, "x"))
            .await
            .expect("append should succeed");
    }

    let rows = store.recent(2).await.expect("read should succeed");
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b"]);
}

#[tokio::test]
async fn append_on_closed_pool_fails() {
    let store = setup_store().await;
    store.pool().close().await;

    let result = store.append(&record("Ana", "ana@x.com")).await;
    assert!(matches!(result, Err(StoreError::Database(_))));
}

#[tokio::test]
async fn open_creates_database_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("nested").join("leads.db");

    let store = SqliteLeadStore::open(&path)
        .await
        .expect("open should succeed");
    store
        .append(&record("Ana", "ana@x.com"))
        .await
        .expect("append should succeed");

    assert!(path.exists(), "database file should be created");
}
