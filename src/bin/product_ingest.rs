use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use product_ingest::config::StoreConfig;
use product_ingest::ingestion::{
    FileObserver, IngestionObserver, IngestionOptions, IngestionPipeline, IngestionReport, IngestionSeverity,
};
use product_ingest::reporting::{default_report_queries, export_reports};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "product-ingest", version, about = "Load product CSVs into SQLite and export reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Upsert rows from a CSV file into the product table
    Ingest {
        /// Input CSV file
        csv: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
        /// Append an audit line per skipped row and per run outcome to this file
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
    /// Export the fixed reports from an already populated table
    Report {
        #[command(flatten)]
        store: StoreArgs,
        /// Directory for report CSVs and the query log
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
    /// Ingest, then export reports
    Run {
        /// Input CSV file
        csv: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
        /// Directory for report CSVs and the query log
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
        /// Append an audit line per skipped row and per run outcome to this file
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// TOML file with `database`, `table` and `busy_timeout_ms`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,
    /// Override the product table name
    #[arg(long)]
    table: Option<String>,
}

impl StoreArgs {
    fn resolve(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => StoreConfig::default(),
        };
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(table) = &self.table {
            config.table = table.clone();
        }
        config.validate().context("validating store config")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest {
            csv,
            store,
            audit_log,
        } => {
            let config = store.resolve()?;
            ingest(config, &csv, audit_log)?;
        }
        Commands::Report { store, out_dir } => {
            let config = store.resolve()?;
            report(&config, &out_dir)?;
        }
        Commands::Run {
            csv,
            store,
            out_dir,
            audit_log,
        } => {
            let config = store.resolve()?;
            ingest(config.clone(), &csv, audit_log)?;
            report(&config, &out_dir)?;
        }
    }
    Ok(())
}

fn ingest(config: StoreConfig, csv: &Path, audit_log: Option<PathBuf>) -> Result<IngestionReport> {
    let options = IngestionOptions {
        observer: audit_log.map(|p| -> Arc<dyn IngestionObserver> { Arc::new(FileObserver::new(p)) }),
        alert_at_or_above: IngestionSeverity::Critical,
    };
    let pipeline = IngestionPipeline::new(config, options);
    let report = pipeline
        .run_path(csv)
        .with_context(|| format!("ingesting {}", csv.display()))?;
    info!(
        inserted = report.inserted,
        already_present = report.already_present,
        rejected = report.rejected.len(),
        "done"
    );
    Ok(report)
}

fn report(config: &StoreConfig, out_dir: &Path) -> Result<()> {
    let queries = default_report_queries(&config.table);
    let summary = export_reports(config, &queries, out_dir)
        .with_context(|| format!("exporting reports to {}", out_dir.display()))?;
    info!(
        reports = summary.files.len(),
        query_log = %summary.query_log.display(),
        "reports written"
    );
    Ok(())
}
