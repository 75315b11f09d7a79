//! The ingestion run: read → validate headers → normalize rows → upsert → commit.
//!
//! Most callers should use [`IngestionPipeline::run_path`]. A run either fails outright (missing
//! columns, unreadable input, store errors) or returns an [`IngestionReport`] listing every row
//! it skipped.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{IngestionError, IngestionResult, RowRejection};
use crate::store::{ProductBatch, ProductStore, UpsertOutcome};
use crate::types::{Schema, columns};

use super::normalize::normalize_row;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::schema::{ColumnIndex, validate_headers};

/// Options controlling observer wiring.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Optional observer for audit trails/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// A skipped input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line in the input where the record starts (the header is line 1).
    pub line: u64,
    /// Raw identifier cell, when one could be read.
    pub product_id: Option<String>,
    /// Why the row was skipped.
    pub reason: RowRejection,
}

/// Outcome of a committed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    /// Data rows read from the input (header excluded).
    pub rows_read: usize,
    /// Rows newly written to the store.
    pub inserted: usize,
    /// Rows whose identifier was already stored (including repeats within the input).
    pub already_present: usize,
    /// Rows skipped, in input order.
    pub rejected: Vec<RejectedRow>,
}

impl IngestionReport {
    /// Counts-only view of the report.
    pub fn stats(&self) -> IngestionStats {
        IngestionStats {
            rows_read: self.rows_read,
            inserted: self.inserted,
            already_present: self.already_present,
            rejected: self.rejected.len(),
        }
    }
}

/// Ingests product CSV input into the store described by a [`StoreConfig`].
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    config: StoreConfig,
    options: IngestionOptions,
    schema: Schema,
}

impl IngestionPipeline {
    /// Create a pipeline. The config is validated when a run starts.
    pub fn new(config: StoreConfig, options: IngestionOptions) -> Self {
        Self {
            config,
            options,
            schema: Schema::products(),
        }
    }

    /// Store configuration used by this pipeline.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Ingest a CSV file.
    ///
    /// When an observer is configured, this reports:
    ///
    /// - `on_row_rejected` for every skipped row
    /// - `on_success` on commit, with counts
    /// - `on_failure` on failure, with a computed severity
    /// - `on_alert` on failure when the severity is >= `options.alert_at_or_above`
    pub fn run_path(&self, path: impl AsRef<Path>) -> IngestionResult<IngestionReport> {
        let path = path.as_ref();
        let ctx = IngestionContext {
            source: Some(path.to_path_buf()),
            table: self.config.table.clone(),
        };
        let result = reader_builder()
            .from_path(path)
            .map_err(IngestionError::from)
            .and_then(|mut rdr| self.ingest(&mut rdr, &ctx));
        self.finish(&ctx, result)
    }

    /// Ingest CSV data from any reader.
    pub fn run_reader<R: Read>(&self, reader: R) -> IngestionResult<IngestionReport> {
        let ctx = IngestionContext {
            source: None,
            table: self.config.table.clone(),
        };
        let mut rdr = reader_builder().from_reader(reader);
        let result = self.ingest(&mut rdr, &ctx);
        self.finish(&ctx, result)
    }

    fn ingest<R: Read>(
        &self,
        rdr: &mut csv::Reader<R>,
        ctx: &IngestionContext,
    ) -> IngestionResult<IngestionReport> {
        self.config.validate()?;
        info!(%ctx, "ingestion started");

        // Nothing touches the store until the header checks out.
        let headers = rdr.headers()?.clone();
        let index = validate_headers(&headers, &self.schema)?;

        let mut store = ProductStore::open(&self.config)?;
        store.ensure_schema()?;

        let mut report = IngestionReport::default();
        let interrupted = {
            let batch = store.begin()?;
            let interrupted = self.ingest_records(rdr, &batch, &index, ctx, &mut report);
            batch.commit()?;
            interrupted
        };
        store.close()?;

        if let Some(e) = interrupted {
            warn!(%ctx, committed = report.inserted, "input stream interrupted after partial commit");
            return Err(e.into());
        }
        Ok(report)
    }

    /// Feed every record into `batch`. Returns the I/O error that cut the input short, if any.
    fn ingest_records<R: Read>(
        &self,
        rdr: &mut csv::Reader<R>,
        batch: &ProductBatch<'_>,
        index: &ColumnIndex,
        ctx: &IngestionContext,
        report: &mut IngestionReport,
    ) -> Option<csv::Error> {
        let mut record = StringRecord::new();
        loop {
            // Fallback line when the reader has no position: header plus rows so far.
            let fallback_line = report.rows_read as u64 + 2;
            match rdr.read_record(&mut record) {
                Ok(false) => return None,
                Ok(true) => {
                    report.rows_read += 1;
                    let line = record.position().map_or(fallback_line, |p| p.line());
                    self.ingest_record(batch, &record, index, line, ctx, report);
                }
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Some(e),
                Err(e) => {
                    report.rows_read += 1;
                    let line = e.position().map_or(fallback_line, |p| p.line());
                    let rejected = RejectedRow {
                        line,
                        product_id: None,
                        reason: RowRejection::Malformed {
                            message: e.to_string(),
                        },
                    };
                    self.reject(ctx, report, rejected);
                }
            }
        }
    }

    fn ingest_record(
        &self,
        batch: &ProductBatch<'_>,
        record: &StringRecord,
        index: &ColumnIndex,
        line: u64,
        ctx: &IngestionContext,
        report: &mut IngestionReport,
    ) {
        let product_id = index
            .position(columns::PRODUCT_ID)
            .and_then(|p| record.get(p))
            .map(|s| s.trim().to_owned());

        let product = match normalize_row(record, index) {
            Ok(product) => product,
            Err(reason) => {
                let rejected = RejectedRow {
                    line,
                    product_id,
                    reason,
                };
                self.reject(ctx, report, rejected);
                return;
            }
        };

        match batch.upsert(&product) {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::AlreadyPresent) => {
                debug!(line, product_id = product.product_id, "identifier already stored; skipping");
                report.already_present += 1;
            }
            Err(e) => {
                let rejected = RejectedRow {
                    line,
                    product_id,
                    reason: RowRejection::Write {
                        message: e.to_string(),
                    },
                };
                self.reject(ctx, report, rejected);
            }
        }
    }

    fn reject(&self, ctx: &IngestionContext, report: &mut IngestionReport, rejected: RejectedRow) {
        warn!(
            line = rejected.line,
            product_id = rejected.product_id.as_deref().unwrap_or(""),
            kind = rejected.reason.kind(),
            "skipping row: {}",
            rejected.reason
        );
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_row_rejected(ctx, &rejected);
        }
        report.rejected.push(rejected);
    }

    fn finish(
        &self,
        ctx: &IngestionContext,
        result: IngestionResult<IngestionReport>,
    ) -> IngestionResult<IngestionReport> {
        match &result {
            Ok(report) => {
                let stats = report.stats();
                info!(
                    %ctx,
                    rows_read = stats.rows_read,
                    inserted = stats.inserted,
                    already_present = stats.already_present,
                    rejected = stats.rejected,
                    "ingestion committed"
                );
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_success(ctx, stats);
                }
            }
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                warn!(%ctx, severity = ?sev, "ingestion failed: {e}");
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_failure(ctx, sev, e);
                    if sev >= self.options.alert_at_or_above {
                        obs.on_alert(ctx, sev, e);
                    }
                }
            }
        }
        result
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // Short or long records are handled per row instead of failing the reader.
    builder.has_headers(true).flexible(true);
    builder
}
