//! Core data model types for ingestion.
//!
//! The input shape is described by a [`Schema`] (a list of typed [`Field`]s); each valid input
//! row becomes one [`Product`].

use chrono::NaiveDate;

/// Header names of the product input, in store column order.
pub mod columns {
    pub const PRODUCT_ID: &str = "ProductID";
    pub const NAME: &str = "Name";
    pub const CATEGORY: &str = "Category";
    pub const RATING: &str = "Rating";
    pub const REVIEWS: &str = "Reviews";
    pub const BRAND: &str = "Brand";
    pub const STOCK: &str = "Stock";
    pub const LAUNCH_DATE: &str = "LaunchDate";
    pub const DISCOUNT: &str = "Discount";
    pub const PRICE: &str = "Price";
}

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer. Integral floats such as `12.0` are accepted.
    Int64,
    /// Finite 64-bit floating point number.
    Float64,
    /// UTF-8 string, trimmed.
    Utf8,
    /// Calendar date; unparseable values become null.
    Date,
    /// Percentage points, written either bare (`15`) or percent-suffixed (`15%`).
    Percent,
}

impl DataType {
    /// SQLite column affinity used when creating the store table.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Int64 => "INTEGER",
            Self::Float64 | Self::Percent => "REAL",
            Self::Utf8 | Self::Date => "TEXT",
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Maximum length in characters for text fields.
    pub max_chars: Option<usize>,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            max_chars: None,
        }
    }

    /// Limit the field to `max_chars` characters.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }
}

/// A list of fields describing the expected shape of incoming data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// The fixed product schema. The first field is the primary key.
    pub fn products() -> Self {
        Self::new(vec![
            Field::new(columns::PRODUCT_ID, DataType::Int64),
            Field::new(columns::NAME, DataType::Utf8).with_max_chars(100),
            Field::new(columns::CATEGORY, DataType::Utf8).with_max_chars(100),
            Field::new(columns::RATING, DataType::Float64),
            Field::new(columns::REVIEWS, DataType::Int64),
            Field::new(columns::BRAND, DataType::Utf8).with_max_chars(50),
            Field::new(columns::STOCK, DataType::Int64),
            Field::new(columns::LAUNCH_DATE, DataType::Date),
            Field::new(columns::DISCOUNT, DataType::Percent),
            Field::new(columns::PRICE, DataType::Float64),
        ])
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns a field by name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One normalized product row, keyed by `product_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub reviews: i64,
    pub brand: String,
    pub stock: i64,
    /// `None` when the input date was empty or in an unrecognized format.
    pub launch_date: Option<NaiveDate>,
    /// Percentage points, e.g. `15.0` for "15%".
    pub discount: f64,
    pub price: f64,
}
