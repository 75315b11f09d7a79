//! Row normalization: typed coercion of one raw CSV record into a [`Product`].

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::RowRejection;
use crate::types::{Field, Product, columns};

use super::schema::ColumnIndex;

/// ISO launch date format, tried first.
pub const ISO_DATE: &str = "%Y-%m-%d";
/// Day-first launch date format, tried when the ISO form does not match.
pub const DAY_FIRST_DATE: &str = "%d-%m-%Y";

/// Normalize one input record.
///
/// Every numeric field must coerce or the whole row is rejected; nothing is partially kept.
/// The launch date is the only nullable field: empty or unrecognized dates become `None`.
pub fn normalize_row(record: &StringRecord, index: &ColumnIndex) -> Result<Product, RowRejection> {
    Ok(Product {
        product_id: coerce_int(lookup(record, index, columns::PRODUCT_ID)?)?,
        name: coerce_text(lookup(record, index, columns::NAME)?)?,
        category: coerce_text(lookup(record, index, columns::CATEGORY)?)?,
        rating: coerce_float(lookup(record, index, columns::RATING)?)?,
        reviews: coerce_int(lookup(record, index, columns::REVIEWS)?)?,
        brand: coerce_text(lookup(record, index, columns::BRAND)?)?,
        stock: coerce_int(lookup(record, index, columns::STOCK)?)?,
        launch_date: parse_launch_date(lookup(record, index, columns::LAUNCH_DATE)?.1),
        discount: coerce_percent(lookup(record, index, columns::DISCOUNT)?)?,
        price: coerce_float(lookup(record, index, columns::PRICE)?)?,
    })
}

/// Parse a launch date as [`ISO_DATE`], then [`DAY_FIRST_DATE`]. Returns `None` if neither
/// matches.
///
/// Both forms need a 4-digit year; chrono's `%Y` alone would read `01-05-20` as year 1.
pub fn parse_launch_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if four_digit_year(trimmed.split('-').next()) {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, ISO_DATE) {
            return Some(date);
        }
    }
    if four_digit_year(trimmed.rsplit('-').next()) {
        return NaiveDate::parse_from_str(trimmed, DAY_FIRST_DATE).ok();
    }
    None
}

fn four_digit_year(part: Option<&str>) -> bool {
    part.is_some_and(|p| p.len() == 4 && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a discount written as `15`, `15.0` or `15%` into percentage points.
pub fn parse_discount(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    number
        .parse::<f64>()
        .map_err(|e| format!("expected a number or percentage: {e}"))
}

fn lookup<'r, 'i>(
    record: &'r StringRecord,
    index: &'i ColumnIndex,
    column: &str,
) -> Result<(&'i Field, &'r str), RowRejection> {
    index
        .cell(record, column)
        .ok_or_else(|| RowRejection::Malformed {
            message: format!("column '{column}' is not part of the schema"),
        })
}

fn coercion(field: &Field, raw: &str, message: impl Into<String>) -> RowRejection {
    RowRejection::Coercion {
        column: field.name.clone(),
        raw: raw.to_owned(),
        message: message.into(),
    }
}

fn non_empty<'r>(field: &Field, raw: &'r str) -> Result<&'r str, RowRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(coercion(field, raw, "missing value"));
    }
    Ok(trimmed)
}

fn coerce_int((field, raw): (&Field, &str)) -> Result<i64, RowRejection> {
    let trimmed = non_empty(field, raw)?;
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }

    // Spreadsheet exports often write integers as `12.0`.
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(v as i64)
        }
        Ok(_) => Err(coercion(field, raw, "expected an integer")),
        Err(e) => Err(coercion(field, raw, e.to_string())),
    }
}

fn coerce_float((field, raw): (&Field, &str)) -> Result<f64, RowRejection> {
    let trimmed = non_empty(field, raw)?;
    let v = trimmed
        .parse::<f64>()
        .map_err(|e| coercion(field, raw, e.to_string()))?;
    finite(field, raw, v)
}

fn coerce_percent((field, raw): (&Field, &str)) -> Result<f64, RowRejection> {
    non_empty(field, raw)?;
    let v = parse_discount(raw).map_err(|message| RowRejection::Parse {
        column: field.name.clone(),
        raw: raw.to_owned(),
        message,
    })?;
    finite(field, raw, v)
}

fn coerce_text((field, raw): (&Field, &str)) -> Result<String, RowRejection> {
    let trimmed = raw.trim();
    if let Some(max) = field.max_chars {
        let len = trimmed.chars().count();
        if len > max {
            return Err(coercion(
                field,
                raw,
                format!("text is {len} characters, limit is {max}"),
            ));
        }
    }
    Ok(trimmed.to_owned())
}

fn finite(field: &Field, raw: &str, v: f64) -> Result<f64, RowRejection> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(coercion(field, raw, "expected a finite number"))
    }
}
