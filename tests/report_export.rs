use std::fs;

use tempfile::TempDir;

use product_ingest::IngestionError;
use product_ingest::config::StoreConfig;
use product_ingest::ingestion::{IngestionOptions, IngestionPipeline};
use product_ingest::reporting::{QUERY_LOG_FILE, ReportQuery, default_report_queries, export_reports};
use rusqlite::types::Value;

fn populated() -> (TempDir, StoreConfig) {
    let dir = TempDir::new().expect("tempdir");
    let config = StoreConfig::new(dir.path().join("reports.sqlite3"));
    IngestionPipeline::new(config.clone(), IngestionOptions::default())
        .run_path("tests/fixtures/products.csv")
        .unwrap();
    (dir, config)
}

fn ids(csv_path: &std::path::Path) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(csv_path).unwrap();
    rdr.records()
        .map(|r| r.unwrap().get(0).unwrap().to_string())
        .collect()
}

#[test]
fn default_reports_export_one_file_per_query() {
    let (dir, config) = populated();
    let out = dir.path().join("out");
    let summary = export_reports(&config, &default_report_queries(&config.table), &out).unwrap();

    assert_eq!(summary.files.len(), 3);
    assert_eq!(summary.rows, vec![1, 1, 3]);
    assert_eq!(ids(&summary.files[0]), vec!["1"]);
    assert_eq!(ids(&summary.files[1]), vec!["2"]);
    // Ordered by price, highest first; the undated blender is excluded.
    assert_eq!(ids(&summary.files[2]), vec!["6", "1", "5"]);

    let header = fs::read_to_string(&summary.files[0]).unwrap();
    assert!(header.starts_with(
        "ProductID,Name,Category,Rating,Reviews,Brand,Stock,LaunchDate,Discount,Price\n"
    ));
}

#[test]
fn query_log_records_sql_and_parameters() {
    let (dir, config) = populated();
    let out = dir.path().join("out");
    let summary = export_reports(&config, &default_report_queries(&config.table), &out).unwrap();

    assert_eq!(summary.query_log, out.join(QUERY_LOG_FILE));
    let log = fs::read_to_string(&summary.query_log).unwrap();
    assert!(log.contains("Report 1: "));
    assert!(log.contains("Report 3: "));
    assert!(log.contains("ORDER BY Price DESC"));
    assert!(log.contains("-- params: ['2022-01-01', 'Home & Kitchen', 'Sports', 10]"));
    assert!(log.contains("-- prepared: SELECT * FROM products WHERE Rating < ?1"));
    assert!(log.contains(
        "SELECT * FROM products WHERE LaunchDate > '2022-01-01' AND Category IN ('Home & Kitchen', 'Sports')"
    ));
    assert!(log.contains("Brand IN ('Nike', 'Sony')"));
}

#[test]
fn null_cells_export_as_empty() {
    let (dir, config) = populated();
    let query = ReportQuery::new(
        "Undated products",
        format!("SELECT ProductID, LaunchDate FROM {} WHERE LaunchDate IS NULL", config.table),
        Vec::<Value>::new(),
    );
    let summary = export_reports(&config, &[query], dir.path().join("out")).unwrap();

    let body = fs::read_to_string(&summary.files[0]).unwrap();
    assert_eq!(body, "ProductID,LaunchDate\n3,\n");
}

#[test]
fn reports_never_write_to_the_store() {
    let (dir, config) = populated();
    let query = ReportQuery::new(
        "Not a read",
        format!("DELETE FROM {}", config.table),
        Vec::new(),
    );
    let err = export_reports(&config, &[query], dir.path().join("out")).unwrap_err();
    assert!(matches!(err, IngestionError::Store(_)));
}

#[test]
fn missing_database_is_a_store_error() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new(dir.path().join("absent.sqlite3"));
    let err = export_reports(&config, &default_report_queries("products"), dir.path().join("out"))
        .unwrap_err();
    assert!(matches!(err, IngestionError::Store(_)));
    assert!(!config.database.exists());
}
