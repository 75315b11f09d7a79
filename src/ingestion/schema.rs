//! Header validation.

use csv::StringRecord;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Field, Schema};

/// Resolved positions of schema fields within an input header.
///
/// Produced by [`validate_headers`]; input columns may appear in any order and extra columns are
/// ignored.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    schema: Schema,
    positions: Vec<usize>,
}

impl ColumnIndex {
    /// The schema this index was resolved against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Input position of `column`, if it is part of the schema.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.schema.index_of(column).map(|i| self.positions[i])
    }

    /// Schema field and raw cell for `column` in `record`.
    ///
    /// Short records yield an empty cell rather than an error; the caller decides whether an
    /// empty value is acceptable.
    pub(crate) fn cell<'r>(
        &self,
        record: &'r StringRecord,
        column: &str,
    ) -> Option<(&Field, &'r str)> {
        let i = self.schema.index_of(column)?;
        let raw = record.get(self.positions[i]).unwrap_or("");
        Some((&self.schema.fields[i], raw))
    }
}

/// Check `headers` against `schema` and resolve column positions.
///
/// Header names are whitespace-trimmed before comparison. All missing columns are reported at
/// once, in schema order.
pub fn validate_headers(headers: &StringRecord, schema: &Schema) -> IngestionResult<ColumnIndex> {
    let trimmed: Vec<&str> = headers.iter().map(str::trim).collect();

    let mut positions = Vec::with_capacity(schema.fields.len());
    let mut missing = Vec::new();
    for field in &schema.fields {
        match trimmed.iter().position(|h| *h == field.name) {
            Some(idx) => positions.push(idx),
            None => missing.push(field.name.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(IngestionError::MissingColumns { missing });
    }

    Ok(ColumnIndex {
        schema: schema.clone(),
        positions,
    })
}
