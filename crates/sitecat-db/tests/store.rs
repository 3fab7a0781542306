//! Integration tests for the result store and batch tracker against an
//! in-memory SQLite database.

use sitecat_core::{ClassificationRecord, Label};
use sitecat_db::{OrderBy, ResultFilter};
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    let pool = sitecat_db::connect_in_memory()
        .await
        .expect("in-memory pool");
    sitecat_db::init_schema(&pool).await.expect("schema init");
    pool
}

fn record(domain: &str, label: Label, confidence: f64) -> ClassificationRecord {
    ClassificationRecord {
        domain: domain.to_string(),
        label,
        summary: format!("summary for {domain}"),
        confidence,
        snippet: "Welcome to our products...".to_string(),
        html_content: "Welcome to our products page.".to_string(),
        ocr_content: String::new(),
        extraction_method: "html".to_string(),
        processing_method: "http fetcher (headless)".to_string(),
    }
}

#[tokio::test]
async fn upsert_inserts_fresh_records_and_lookup_finds_them() {
    let pool = test_pool().await;

    let records = vec![
        record("example.com", Label::Marketing, 0.85),
        record("portal.company.com", Label::Portal, 0.92),
    ];
    let summary = sitecat_db::upsert_batch(&pool, &records, "batch_1", false)
        .await
        .unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.skipped, 0);

    assert!(sitecat_db::domain_exists(&pool, "example.com")
        .await
        .unwrap());
    assert!(sitecat_db::domain_exists(&pool, "EXAMPLE.COM")
        .await
        .unwrap());
    assert!(!sitecat_db::domain_exists(&pool, "missing.com")
        .await
        .unwrap());

    let row = sitecat_db::get_result(&pool, "  Example.com ")
        .await
        .unwrap()
        .expect("record should exist");
    assert_eq!(row.domain, "example.com");
    assert_eq!(row.label(), Label::Marketing);
    assert_eq!(row.batch_id.as_deref(), Some("batch_1"));
}

#[tokio::test]
async fn duplicate_without_overwrite_is_skipped_case_insensitively() {
    let pool = test_pool().await;

    sitecat_db::upsert_batch(
        &pool,
        &[record("Example.com", Label::Marketing, 0.8)],
        "batch_1",
        false,
    )
    .await
    .unwrap();

    // Same domain, different case, trailing space: must be skipped.
    let summary = sitecat_db::upsert_batch(
        &pool,
        &[record("example.com ", Label::Portal, 0.9)],
        "batch_2",
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.skipped, 1);

    let row = sitecat_db::get_result(&pool, "example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.label(), Label::Marketing, "original record untouched");
    assert_eq!(row.domain, "Example.com", "original casing preserved");
}

#[tokio::test]
async fn non_ascii_domain_dedups_across_case_variants() {
    let pool = test_pool().await;

    // SQLite's LOWER only folds ASCII; the normalized key must come from
    // Rust for these two to collide.
    sitecat_db::upsert_batch(
        &pool,
        &[record("Ürün.com", Label::Marketing, 0.8)],
        "batch_1",
        false,
    )
    .await
    .unwrap();

    let summary = sitecat_db::upsert_batch(
        &pool,
        &[record("ürün.com", Label::Portal, 0.9)],
        "batch_2",
        false,
    )
    .await
    .unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.skipped, 1);

    let row = sitecat_db::get_result(&pool, " ÜRÜN.COM ")
        .await
        .unwrap()
        .expect("lookup must match despite case and whitespace");
    assert_eq!(row.domain, "Ürün.com");
    assert_eq!(row.label(), Label::Marketing);
    assert!(sitecat_db::domain_exists(&pool, "ürün.com").await.unwrap());
}

#[tokio::test]
async fn overwrite_replaces_without_duplicating() {
    let pool = test_pool().await;

    sitecat_db::upsert_batch(
        &pool,
        &[record("example.com", Label::Marketing, 0.8)],
        "batch_1",
        false,
    )
    .await
    .unwrap();

    let summary = sitecat_db::upsert_batch(
        &pool,
        &[record("Example.com", Label::Portal, 0.95)],
        "batch_2",
        true,
    )
    .await
    .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.inserted, 0);

    let rows = sitecat_db::query_results(
        &pool,
        &ResultFilter {
            domain_substring: Some("example".to_string()),
            ..ResultFilter::default()
        },
        OrderBy::default(),
        None,
        0,
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1, "exactly one active record after overwrite");
    assert_eq!(rows[0].label(), Label::Portal);
    assert_eq!(rows[0].batch_id.as_deref(), Some("batch_2"));
}

#[tokio::test]
async fn query_filters_are_and_combined() {
    let pool = test_pool().await;

    let records = vec![
        record("shop.example.com", Label::Marketing, 0.9),
        record("portal.example.com", Label::Portal, 0.7),
        record("other.net", Label::Other, 0.4),
    ];
    sitecat_db::upsert_batch(&pool, &records, "batch_1", false)
        .await
        .unwrap();

    let rows = sitecat_db::query_results(
        &pool,
        &ResultFilter {
            domain_substring: Some("EXAMPLE".to_string()),
            min_confidence: Some(0.8),
            ..ResultFilter::default()
        },
        OrderBy::default(),
        None,
        0,
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].domain, "shop.example.com");

    let rows = sitecat_db::query_results(
        &pool,
        &ResultFilter {
            label: Some(Label::Portal),
            batch_id: Some("batch_1".to_string()),
            ..ResultFilter::default()
        },
        OrderBy::default(),
        None,
        0,
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].domain, "portal.example.com");

    let rows = sitecat_db::query_results(
        &pool,
        &ResultFilter::default(),
        OrderBy::DomainAsc,
        Some(2),
        1,
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].domain, "portal.example.com");
    assert_eq!(rows[1].domain, "shop.example.com");
}

#[tokio::test]
async fn stats_count_totals_and_labels() {
    let pool = test_pool().await;

    let records = vec![
        record("a.com", Label::Marketing, 0.9),
        record("b.com", Label::Marketing, 0.8),
        record("c.com", Label::Error, 0.0),
    ];
    sitecat_db::upsert_batch(&pool, &records, "batch_1", false)
        .await
        .unwrap();
    sitecat_db::upsert_batch(&pool, &[record("d.com", Label::Other, 0.5)], "batch_2", false)
        .await
        .unwrap();

    let all = sitecat_db::stats(&pool, None).await.unwrap();
    assert_eq!(all.total, 4);
    assert_eq!(all.by_label.get("Marketing"), Some(&2));
    assert_eq!(all.by_label.get("Error"), Some(&1));

    let batch = sitecat_db::stats(&pool, Some("batch_2")).await.unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.by_label.get("Other"), Some(&1));
}

#[tokio::test]
async fn delete_batch_removes_results_and_metadata() {
    let pool = test_pool().await;
    let config = serde_json::json!({"method": "html"});

    sitecat_db::begin_batch(&pool, "batch_1", 2, &config)
        .await
        .unwrap();
    sitecat_db::upsert_batch(
        &pool,
        &[
            record("a.com", Label::Marketing, 0.9),
            record("b.com", Label::Portal, 0.8),
        ],
        "batch_1",
        false,
    )
    .await
    .unwrap();

    let deleted = sitecat_db::delete_batch(&pool, "batch_1").await.unwrap();
    assert_eq!(deleted, 2);
    assert!(sitecat_db::get_batch(&pool, "batch_1").await.unwrap().is_none());
    assert!(!sitecat_db::domain_exists(&pool, "a.com").await.unwrap());
}

#[tokio::test]
async fn clear_all_reports_counts_and_empties_the_store() {
    let pool = test_pool().await;
    let config = serde_json::json!({});

    sitecat_db::begin_batch(&pool, "batch_1", 1, &config)
        .await
        .unwrap();
    sitecat_db::upsert_batch(&pool, &[record("a.com", Label::Other, 0.3)], "batch_1", false)
        .await
        .unwrap();

    let summary = sitecat_db::clear_all(&pool).await.unwrap();
    assert_eq!(summary.results_deleted, 1);
    assert_eq!(summary.batches_deleted, 1);

    let stats = sitecat_db::stats(&pool, None).await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn reset_schema_leaves_a_usable_empty_store() {
    let pool = test_pool().await;

    sitecat_db::upsert_batch(&pool, &[record("a.com", Label::Other, 0.3)], "batch_1", false)
        .await
        .unwrap();

    sitecat_db::reset_schema(&pool).await.unwrap();

    assert!(!sitecat_db::domain_exists(&pool, "a.com").await.unwrap());
    sitecat_db::upsert_batch(&pool, &[record("b.com", Label::Portal, 0.6)], "batch_2", false)
        .await
        .unwrap();
    assert!(sitecat_db::domain_exists(&pool, "b.com").await.unwrap());
}

#[tokio::test]
async fn vacuum_is_a_no_op_semantically() {
    let pool = test_pool().await;
    sitecat_db::upsert_batch(&pool, &[record("a.com", Label::Other, 0.3)], "batch_1", false)
        .await
        .unwrap();

    sitecat_db::vacuum(&pool).await.unwrap();
    assert!(sitecat_db::domain_exists(&pool, "a.com").await.unwrap());
}

#[tokio::test]
async fn batch_lifecycle_processing_to_completed() {
    let pool = test_pool().await;
    let config = serde_json::json!({"method": "html", "workers": 4});

    sitecat_db::begin_batch(&pool, "batch_1", 3, &config)
        .await
        .unwrap();

    let row = sitecat_db::get_batch(&pool, "batch_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "processing");
    assert_eq!(row.total_domains, 3);
    assert!(row.started_at.is_some());
    assert!(row.completed_at.is_none());

    sitecat_db::complete_batch(&pool, "batch_1").await.unwrap();

    let row = sitecat_db::get_batch(&pool, "batch_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "completed");
    assert!(row.completed_at.is_some());

    // A second completion is an invalid transition.
    let err = sitecat_db::complete_batch(&pool, "batch_1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        sitecat_db::DbError::InvalidBatchTransition { .. }
    ));
}

#[tokio::test]
async fn list_batches_includes_result_counts() {
    let pool = test_pool().await;
    let config = serde_json::json!({});

    sitecat_db::begin_batch(&pool, "batch_1", 2, &config)
        .await
        .unwrap();
    sitecat_db::upsert_batch(
        &pool,
        &[
            record("a.com", Label::Marketing, 0.9),
            record("b.com", Label::Portal, 0.8),
        ],
        "batch_1",
        false,
    )
    .await
    .unwrap();
    sitecat_db::begin_batch(&pool, "batch_2", 1, &config)
        .await
        .unwrap();

    let batches = sitecat_db::list_batches(&pool).await.unwrap();
    assert_eq!(batches.len(), 2);

    let b1 = batches.iter().find(|b| b.batch_id == "batch_1").unwrap();
    assert_eq!(b1.result_count, 2);
    let b2 = batches.iter().find(|b| b.batch_id == "batch_2").unwrap();
    assert_eq!(b2.result_count, 0);
}
