use std::fmt;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Batch-level error returned by the pipeline, store and reporting functions.
///
/// Any of these aborts the run. Row-level problems never surface here; they are reported as
/// [`RowRejection`]s inside the [`crate::ingestion::IngestionReport`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error that is not attributable to a single row.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite error while opening, preparing or committing.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values are invalid.
    #[error("invalid config: {message}")]
    Config { message: String },

    /// The input header is missing one or more required columns.
    #[error("schema mismatch: missing required columns {missing:?}")]
    MissingColumns { missing: Vec<String> },
}

/// Why a single input row was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RowRejection {
    /// A value could not be coerced to the column's type.
    Coercion {
        column: String,
        raw: String,
        message: String,
    },
    /// A value had the right type but an unreadable textual form (e.g. a malformed discount).
    Parse {
        column: String,
        raw: String,
        message: String,
    },
    /// The CSV record itself could not be read.
    Malformed { message: String },
    /// The store refused the row.
    Write { message: String },
}

impl RowRejection {
    /// Short machine-friendly label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Coercion { .. } => "coercion",
            Self::Parse { .. } => "parse",
            Self::Malformed { .. } => "malformed",
            Self::Write { .. } => "write",
        }
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coercion {
                column,
                raw,
                message,
            } => write!(
                f,
                "failed to coerce column '{column}': {message} (raw='{raw}')"
            ),
            Self::Parse {
                column,
                raw,
                message,
            } => write!(f, "failed to parse column '{column}': {message} (raw='{raw}')"),
            Self::Malformed { message } => write!(f, "malformed record: {message}"),
            Self::Write { message } => write!(f, "store rejected row: {message}"),
        }
    }
}
