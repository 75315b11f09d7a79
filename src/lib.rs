//! `product-ingest` loads product CSV files into a SQLite table with insert-or-ignore semantics
//! and exports a fixed set of reports from the populated table.
//!
//! The primary entrypoint is [`ingestion::IngestionPipeline`]. A run reads the CSV header,
//! checks it against [`types::Schema::products`], normalizes each row into a
//! [`types::Product`] and upserts every valid row in a single transaction. Re-running on the same
//! input leaves the table unchanged.
//!
//! ## Failure model
//!
//! - **Batch-level** ([`IngestionError`]): a missing required column, an unreadable input file,
//!   or a store error. A missing column is detected before the store is opened, so nothing is
//!   written.
//! - **Row-level** ([`RowRejection`]): a value that cannot be coerced. The row is skipped, logged
//!   through `tracing`, reported to the configured observer and listed in the returned
//!   [`ingestion::IngestionReport`]; the rest of the batch still commits.
//!
//! ## Normalization
//!
//! - `Discount` accepts `15`, `15.0` and `15%`; all store as `15.0`.
//! - `LaunchDate` accepts `yyyy-mm-dd` then `dd-mm-yyyy`; anything else stores as NULL and the row
//!   is kept.
//! - Integer columns accept integral floats (`"12.0"`); float columns must be finite.
//!
//! ## Quick example
//!
//! ```no_run
//! use product_ingest::config::StoreConfig;
//! use product_ingest::ingestion::{IngestionOptions, IngestionPipeline};
//!
//! # fn main() -> Result<(), product_ingest::IngestionError> {
//! let pipeline = IngestionPipeline::new(
//!     StoreConfig::new("product_db.sqlite3"),
//!     IngestionOptions::default(),
//! );
//! let report = pipeline.run_path("sample_data.csv")?;
//! println!("inserted={} rejected={}", report.inserted, report.rejected.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: pipeline, header validation, row normalization, observers
//! - [`store`]: SQLite product table
//! - [`reporting`]: fixed report exports
//! - [`config`]: store configuration
//! - [`types`]: schema and record types
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod ingestion;
pub mod reporting;
pub mod store;
pub mod types;

pub use error::{IngestionError, IngestionResult, RowRejection};
