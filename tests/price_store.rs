use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use stockdata_backend::config::DatabaseConfig;
use stockdata_backend::error::StoreError;
use stockdata_backend::models::{PriceBar, PriceUpdate};
use stockdata_backend::services::price_store::PriceStore;
use tempfile::{tempdir, TempDir};

async fn open_store() -> (TempDir, PriceStore) {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        path: dir.path().join("stock_data.db"),
        ..Default::default()
    };
    let store = PriceStore::open(&config).await.expect("Failed to open store");
    (dir, store)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn bar(company: &str, d: u32, close: f64) -> PriceBar {
    PriceBar {
        company: company.to_string(),
        date: day(d),
        open: 10.0,
        high: 11.0,
        low: 9.0,
        close,
        volume: 1000,
    }
}

#[tokio::test]
async fn test_upsert_same_key_keeps_last_write() {
    let (_dir, store) = open_store().await;

    store.upsert(&bar("Acme", 2, 10.5)).await.unwrap();
    store.upsert(&bar("Acme", 2, 12.25)).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let saved = store
        .query_by_company_and_date("Acme", day(2))
        .await
        .unwrap()
        .expect("bar should exist");
    assert_eq!(saved.close, 12.25);
}

#[tokio::test]
async fn test_queries_by_date_and_company() {
    let (_dir, store) = open_store().await;

    store
        .upsert_batch(&[bar("Acme", 2, 10.5), bar("Acme", 3, 10.8)])
        .await
        .unwrap();
    store
        .upsert_batch(&[bar("Globex", 2, 55.0)])
        .await
        .unwrap();

    let on_second = store.query_by_date(day(2)).await.unwrap();
    let companies: Vec<_> = on_second.iter().map(|b| b.company.as_str()).collect();
    assert_eq!(companies, vec!["Acme", "Globex"]);

    let acme = store.query_by_company("Acme").await.unwrap();
    assert_eq!(acme.len(), 2);
    assert!(acme.iter().all(|b| b.company == "Acme"));

    assert!(store.query_by_date(day(4)).await.unwrap().is_empty());
    assert!(store.query_by_company("Initech").await.unwrap().is_empty());
    assert!(store
        .query_by_company_and_date("Globex", day(3))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_upsert_batch_replaces_existing_rows() {
    let (_dir, store) = open_store().await;

    store.upsert(&bar("Acme", 2, 1.0)).await.unwrap();
    let written = store
        .upsert_batch(&[bar("Acme", 2, 2.0), bar("Acme", 3, 3.0)])
        .await
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(store.count().await.unwrap(), 2);
    let saved = store
        .query_by_company_and_date("Acme", day(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.close, 2.0);
}

#[tokio::test]
async fn test_update_only_volume_keeps_prices() {
    let (_dir, store) = open_store().await;
    let original = bar("Acme", 2, 10.5);
    store.upsert(&original).await.unwrap();

    let update = PriceUpdate {
        volume: Some(2500),
        ..Default::default()
    };
    store.update_fields("Acme", day(2), &update).await.unwrap();

    let saved = store
        .query_by_company_and_date("Acme", day(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.volume, 2500);
    assert_eq!(saved.open, original.open);
    assert_eq!(saved.high, original.high);
    assert_eq!(saved.low, original.low);
    assert_eq!(saved.close, original.close);
}

#[tokio::test]
async fn test_update_applies_explicit_zero() {
    let (_dir, store) = open_store().await;
    store.upsert(&bar("Acme", 2, 10.5)).await.unwrap();

    let update = PriceUpdate {
        volume: Some(0),
        low: Some(0.0),
        ..Default::default()
    };
    store.update_fields("Acme", day(2), &update).await.unwrap();

    let saved = store
        .query_by_company_and_date("Acme", day(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.volume, 0);
    assert_eq!(saved.low, 0.0);
    assert_eq!(saved.close, 10.5);
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let (_dir, store) = open_store().await;
    store.upsert(&bar("Acme", 2, 10.5)).await.unwrap();

    let update = PriceUpdate {
        close: Some(11.0),
        ..Default::default()
    };
    let err = store
        .update_fields("Acme", day(9), &update)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        path: dir.path().join("stock_data.db"),
        ..Default::default()
    };

    let store = PriceStore::open(&config).await.unwrap();
    store.upsert(&bar("Acme", 2, 10.5)).await.unwrap();
    store.close().await;

    let reopened = PriceStore::open(&config).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_write_lock_held_elsewhere_is_unavailable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        path: dir.path().join("stock_data.db"),
        busy_timeout_secs: 0,
        ..Default::default()
    };
    let store = PriceStore::open(&config).await.unwrap();

    // 另一个连接持有写锁
    let options = SqliteConnectOptions::new().filename(&config.path);
    let mut other = SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::query("BEGIN IMMEDIATE").execute(&mut other).await.unwrap();

    let err = store.upsert(&bar("Acme", 2, 10.5)).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)), "got {:?}", err);

    sqlx::query("ROLLBACK").execute(&mut other).await.unwrap();
    store.upsert(&bar("Acme", 2, 10.5)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}
