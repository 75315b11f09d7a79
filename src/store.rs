//! SQLite-backed product table.
//!
//! The store only ever inserts: [`ProductBatch::upsert`] uses `INSERT OR IGNORE`, so an
//! identifier that is already present leaves the existing row untouched.

use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::IngestionResult;
use crate::types::{Product, Schema};

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was created.
    Inserted,
    /// A row with the same identifier already existed; nothing changed.
    AlreadyPresent,
}

/// An open connection to the product store.
#[derive(Debug)]
pub struct ProductStore {
    conn: Connection,
    table: String,
}

impl ProductStore {
    /// Open (creating if needed) the database described by `config`.
    pub fn open(config: &StoreConfig) -> IngestionResult<Self> {
        config.validate()?;
        let conn = Connection::open(&config.database)?;
        Self::with_connection(conn, config)
    }

    /// Open an existing database without write access.
    pub fn open_read_only(config: &StoreConfig) -> IngestionResult<Self> {
        config.validate()?;
        let conn = Connection::open_with_flags(
            &config.database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::with_connection(conn, config)
    }

    fn with_connection(conn: Connection, config: &StoreConfig) -> IngestionResult<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(Self {
            conn,
            table: config.table.clone(),
        })
    }

    /// Table name this store writes to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Underlying connection, for read queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the product table if it does not exist. Safe to call on every run.
    pub fn ensure_schema(&self) -> IngestionResult<()> {
        let ddl = create_table_sql(&self.table, &Schema::products());
        debug!(table = %self.table, "ensuring product table");
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    /// Start a write batch. Nothing is durable until [`ProductBatch::commit`].
    pub fn begin(&mut self) -> IngestionResult<ProductBatch<'_>> {
        let insert_sql = insert_sql(&self.table, &Schema::products());
        let tx = self.conn.transaction()?;
        Ok(ProductBatch { tx, insert_sql })
    }

    /// Number of rows in the product table.
    pub fn count(&self) -> IngestionResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Fetch one product by identifier.
    pub fn get(&self, product_id: i64) -> IngestionResult<Option<Product>> {
        let sql = format!(
            "SELECT ProductID, Name, Category, Rating, Reviews, Brand, Stock, LaunchDate, Discount, Price \
             FROM {} WHERE ProductID = ?1",
            self.table
        );
        let product = self
            .conn
            .query_row(&sql, [product_id], |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    rating: row.get(3)?,
                    reviews: row.get(4)?,
                    brand: row.get(5)?,
                    stock: row.get(6)?,
                    launch_date: row.get(7)?,
                    discount: row.get(8)?,
                    price: row.get(9)?,
                })
            })
            .optional()?;
        Ok(product)
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> IngestionResult<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

/// A pending set of upserts, committed as one transaction.
///
/// Dropping a batch without committing rolls it back.
pub struct ProductBatch<'s> {
    tx: Transaction<'s>,
    insert_sql: String,
}

impl ProductBatch<'_> {
    /// Insert `product` unless its identifier is already present.
    pub fn upsert(&self, product: &Product) -> rusqlite::Result<UpsertOutcome> {
        let mut stmt = self.tx.prepare_cached(&self.insert_sql)?;
        let changed = stmt.execute(params![
            product.product_id,
            product.name,
            product.category,
            product.rating,
            product.reviews,
            product.brand,
            product.stock,
            product.launch_date,
            product.discount,
            product.price,
        ])?;
        Ok(if changed == 0 {
            UpsertOutcome::AlreadyPresent
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Make every upsert in this batch durable.
    pub fn commit(self) -> IngestionResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn create_table_sql(table: &str, schema: &Schema) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let key = if i == 0 { " PRIMARY KEY" } else { "" };
            format!("{} {}{key}", f.name, f.data_type.sql_type())
        })
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {table} ({})", columns.join(", "))
}

fn insert_sql(table: &str, schema: &Schema) -> String {
    let names: Vec<&str> = schema.field_names().collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT OR IGNORE INTO {table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::{create_table_sql, insert_sql};
    use crate::types::Schema;

    #[test]
    fn ddl_keys_the_table_on_product_id() {
        let ddl = create_table_sql("products", &Schema::products());
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS products (ProductID INTEGER PRIMARY KEY, "));
        assert!(ddl.contains("LaunchDate TEXT"));
        assert!(ddl.contains("Discount REAL"));
        assert!(ddl.ends_with("Price REAL)"));
    }

    #[test]
    fn insert_ignores_existing_keys() {
        let sql = insert_sql("products", &Schema::products());
        assert!(sql.starts_with("INSERT OR IGNORE INTO products (ProductID, Name,"));
        assert!(sql.ends_with("?9, ?10)"));
    }
}
