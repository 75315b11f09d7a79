//! Store configuration.
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! database = "data/product_db.sqlite3"
//! table = "products"
//! busy_timeout_ms = 5000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};

/// Default database file.
pub const DEFAULT_DATABASE: &str = "product_db.sqlite3";
/// Default product table name.
pub const DEFAULT_TABLE: &str = "products";
/// Default SQLite busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where and how the product store lives.
///
/// # Invariants
/// - `table` is a plain SQL identifier; it is interpolated into DDL/DML.
/// - `database` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Name of the product table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            table: default_table(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Config for `database` with default table and timeout.
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> IngestionResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Check the invariants listed on the type.
    pub fn validate(&self) -> IngestionResult<()> {
        if self.database.as_os_str().is_empty() {
            return Err(IngestionError::Config {
                message: "database path must not be empty".to_string(),
            });
        }
        if !is_identifier(&self.table) {
            return Err(IngestionError::Config {
                message: format!(
                    "table name '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                    self.table
                ),
            });
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;
    use crate::error::IngestionError;

    #[test]
    fn missing_keys_take_defaults() {
        let config = StoreConfig::from_toml_str("database = \"x.db\"\n").unwrap();
        assert_eq!(config.database.to_str(), Some("x.db"));
        assert_eq!(config.table, "products");
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn rejects_table_names_that_are_not_identifiers() {
        for bad in ["", "1products", "products; DROP TABLE x", "prod-ucts"] {
            let config = StoreConfig {
                table: bad.to_string(),
                ..StoreConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(IngestionError::Config { .. })),
                "accepted {bad:?}"
            );
        }
        let ok = StoreConfig {
            table: "_products_2024".to_string(),
            ..StoreConfig::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = StoreConfig::from_toml_str("password = \"root\"\n").unwrap_err();
        assert!(matches!(err, IngestionError::ConfigParse(_)));
    }
}
