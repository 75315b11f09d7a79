//! Fixed read-only reports over the populated product store.
//!
//! Each [`ReportQuery`] is exported to its own CSV file (`report_<n>.csv`, 1-based) and every
//! query that ran is recorded in `queries.txt`, both as literal SQL and as the prepared
//! statement with its bound parameters.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params_from_iter};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::IngestionResult;
use crate::store::ProductStore;

/// Name of the query log written next to the report files.
pub const QUERY_LOG_FILE: &str = "queries.txt";

/// A fixed, parameterized read query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    /// Human-readable description, written to the query log.
    pub title: String,
    /// SQL with `?N` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
}

impl ReportQuery {
    pub fn new(title: impl Into<String>, sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            title: title.into(),
            sql: sql.into(),
            params,
        }
    }

    /// The query with every `?N` placeholder replaced by its bound value as a SQL literal.
    ///
    /// Placeholders without a bound value are left as written. `?` inside string literals is not
    /// special-cased; the report queries never contain one.
    pub fn literal_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut rest = self.sql.as_str();
        while let Some(at) = rest.find('?') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            let bound = after[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match bound {
                Some(value) => out.push_str(&render_param(value)),
                None => out.push_str(&rest[at..at + 1 + digits]),
            }
            rest = &after[digits..];
        }
        out.push_str(rest);
        out
    }
}

/// Files written by [`export_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// One CSV per query, in query order.
    pub files: Vec<PathBuf>,
    /// Row count of each exported result set, in query order.
    pub rows: Vec<usize>,
    /// Path of the query log.
    pub query_log: PathBuf,
}

/// The standard product reports for `table`.
pub fn default_report_queries(table: &str) -> Vec<ReportQuery> {
    vec![
        ReportQuery::new(
            "Well-reviewed Nike/Sony products rated under 4.5",
            format!(
                "SELECT * FROM {table} WHERE Rating < ?1 AND Reviews > ?2 AND Brand IN (?3, ?4)"
            ),
            vec![
                Value::Real(4.5),
                Value::Integer(200),
                Value::Text("Nike".to_string()),
                Value::Text("Sony".to_string()),
            ],
        ),
        ReportQuery::new(
            "In-stock electronics rated 4.5 or higher",
            format!("SELECT * FROM {table} WHERE Category = ?1 AND Rating >= ?2 AND Stock > ?3"),
            vec![
                Value::Text("Electronics".to_string()),
                Value::Real(4.5),
                Value::Integer(0),
            ],
        ),
        ReportQuery::new(
            "Discounted home/sports launches after 2022-01-01, priciest first",
            format!(
                "SELECT * FROM {table} WHERE LaunchDate > ?1 AND Category IN (?2, ?3) \
                 AND Discount >= ?4 ORDER BY Price DESC"
            ),
            vec![
                Value::Text("2022-01-01".to_string()),
                Value::Text("Home & Kitchen".to_string()),
                Value::Text("Sports".to_string()),
                Value::Real(10.0),
            ],
        ),
    ]
}

/// Run `queries` against the store read-only and write their results under `out_dir`.
pub fn export_reports(
    config: &StoreConfig,
    queries: &[ReportQuery],
    out_dir: impl AsRef<Path>,
) -> IngestionResult<ReportSummary> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let store = ProductStore::open_read_only(config)?;
    let mut files = Vec::with_capacity(queries.len());
    let mut rows = Vec::with_capacity(queries.len());
    for (i, query) in queries.iter().enumerate() {
        let path = out_dir.join(format!("report_{}.csv", i + 1));
        let n = export_one(store.connection(), query, &path)?;
        info!(report = i + 1, rows = n, path = %path.display(), "report exported");
        files.push(path);
        rows.push(n);
    }
    store.close()?;

    let query_log = out_dir.join(QUERY_LOG_FILE);
    write_query_log(&query_log, queries)?;

    Ok(ReportSummary {
        files,
        rows,
        query_log,
    })
}

fn export_one(conn: &Connection, query: &ReportQuery, path: &Path) -> IngestionResult<usize> {
    let mut stmt = conn.prepare(&query.sql)?;
    let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&headers)?;

    let mut result = stmt.query(params_from_iter(query.params.iter()))?;
    let mut cells = Vec::with_capacity(headers.len());
    let mut n = 0;
    while let Some(row) = result.next()? {
        cells.clear();
        for i in 0..headers.len() {
            cells.push(render_cell(row.get_ref(i)?));
        }
        wtr.write_record(&cells)?;
        n += 1;
    }
    wtr.flush()?;
    Ok(n)
}

fn render_cell(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn render_param(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn write_query_log(path: &Path, queries: &[ReportQuery]) -> IngestionResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (i, query) in queries.iter().enumerate() {
        let params: Vec<String> = query.params.iter().map(render_param).collect();
        writeln!(out, "Report {}: {}", i + 1, query.title)?;
        writeln!(out, "{}", query.literal_sql())?;
        writeln!(out, "-- prepared: {}", query.sql)?;
        writeln!(out, "-- params: [{}]", params.join(", "))?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ReportQuery, default_report_queries, render_param};
    use rusqlite::types::Value;

    #[test]
    fn literal_sql_inlines_each_placeholder_once() {
        let params: Vec<Value> = (1..=10).map(Value::Integer).collect();
        let q = ReportQuery::new("t", "SELECT ?1, ?10, ?11, ? FROM t", params);
        assert_eq!(q.literal_sql(), "SELECT 1, 10, ?11, ? FROM t");

        let q = ReportQuery::new(
            "t",
            "SELECT * FROM products WHERE Brand IN (?1, ?2)",
            vec![Value::Text("Nike".into()), Value::Text("O'Neil".into())],
        );
        assert_eq!(q.literal_sql(), "SELECT * FROM products WHERE Brand IN ('Nike', 'O''Neil')");
    }

    #[test]
    fn default_queries_bind_every_placeholder() {
        for q in default_report_queries("products") {
            let placeholders = (1..=q.params.len()).filter(|i| q.sql.contains(&format!("?{i}"))).count();
            assert_eq!(placeholders, q.params.len(), "{}", q.title);
            assert!(q.sql.contains("FROM products"));
        }
    }

    #[test]
    fn text_params_are_quoted_for_the_log() {
        assert_eq!(render_param(&Value::Text("Home & Kitchen".into())), "'Home & Kitchen'");
        assert_eq!(render_param(&Value::Text("O'Neil".into())), "'O''Neil'");
        assert_eq!(render_param(&Value::Real(4.5)), "4.5");
    }
}
