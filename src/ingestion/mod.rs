//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`IngestionPipeline`] (from [`pipeline`]) which:
//!
//! - validates the CSV header before touching the store
//! - normalizes each row into a [`crate::types::Product`], skipping rows that fail coercion
//! - upserts every valid row in one transaction
//! - optionally reports rejections/success/failure/alerts to an [`IngestionObserver`]
//!
//! The building blocks are also available on their own:
//! - [`schema`]: header validation
//! - [`normalize`]: per-row coercion

pub mod normalize;
pub mod observability;
pub mod pipeline;
pub mod schema;

pub use normalize::{normalize_row, parse_discount, parse_launch_date};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
};
pub use pipeline::{IngestionOptions, IngestionPipeline, IngestionReport, RejectedRow};
pub use schema::{ColumnIndex, validate_headers};
