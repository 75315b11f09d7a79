use chrono::NaiveDate;
use csv::StringRecord;

use product_ingest::RowRejection;
use product_ingest::ingestion::{ColumnIndex, normalize_row, validate_headers};
use product_ingest::types::Schema;

const HEADER: &[&str] = &[
    "ProductID",
    "Name",
    "Category",
    "Rating",
    "Reviews",
    "Brand",
    "Stock",
    "LaunchDate",
    "Discount",
    "Price",
];

fn index() -> ColumnIndex {
    validate_headers(&StringRecord::from(HEADER.to_vec()), &Schema::products()).unwrap()
}

fn row(cells: &[&str]) -> StringRecord {
    StringRecord::from(cells.to_vec())
}

fn shoe_with(column: usize, value: &str) -> StringRecord {
    let mut cells = vec![
        "1",
        "Running Shoe",
        "Sports",
        "4.2",
        "350",
        "Nike",
        "40",
        "2023-05-01",
        "15%",
        "89.99",
    ];
    cells[column] = value;
    row(&cells)
}

#[test]
fn normalizes_a_complete_row() {
    let product = normalize_row(&shoe_with(1, "  Running Shoe  "), &index()).unwrap();

    assert_eq!(product.product_id, 1);
    assert_eq!(product.name, "Running Shoe");
    assert_eq!(product.category, "Sports");
    assert_eq!(product.rating, 4.2);
    assert_eq!(product.reviews, 350);
    assert_eq!(product.brand, "Nike");
    assert_eq!(product.stock, 40);
    assert_eq!(product.launch_date, NaiveDate::from_ymd_opt(2023, 5, 1));
    assert_eq!(product.discount, 15.0);
    assert_eq!(product.price, 89.99);
}

#[test]
fn percent_and_bare_discounts_normalize_identically() {
    let idx = index();
    let percent = normalize_row(&shoe_with(8, "15%"), &idx).unwrap();
    let bare = normalize_row(&shoe_with(8, "15.0"), &idx).unwrap();

    assert_eq!(percent.discount, 15.0);
    assert_eq!(percent.discount, bare.discount);
}

#[test]
fn both_date_formats_yield_the_same_day() {
    let idx = index();
    let iso = normalize_row(&shoe_with(7, "2023-05-01"), &idx).unwrap();
    let day_first = normalize_row(&shoe_with(7, "01-05-2023"), &idx).unwrap();

    assert_eq!(iso.launch_date, day_first.launch_date);
    assert_eq!(iso.launch_date, NaiveDate::from_ymd_opt(2023, 5, 1));
}

#[test]
fn unparseable_date_is_null_but_row_is_kept() {
    let product = normalize_row(&shoe_with(7, "not-a-date"), &index()).unwrap();
    assert_eq!(product.launch_date, None);
    assert_eq!(product.product_id, 1);

    let empty = normalize_row(&shoe_with(7, ""), &index()).unwrap();
    assert_eq!(empty.launch_date, None);
}

#[test]
fn non_numeric_rating_is_a_coercion_rejection() {
    let err = normalize_row(&shoe_with(3, "excellent"), &index()).unwrap_err();
    match err {
        RowRejection::Coercion { column, raw, .. } => {
            assert_eq!(column, "Rating");
            assert_eq!(raw, "excellent");
        }
        other => panic!("unexpected rejection: {other}"),
    }
}

#[test]
fn malformed_discount_is_a_parse_rejection() {
    let err = normalize_row(&shoe_with(8, "lots%"), &index()).unwrap_err();
    assert!(matches!(err, RowRejection::Parse { ref column, .. } if column == "Discount"));
    assert_eq!(err.kind(), "parse");
}

#[test]
fn empty_discount_is_rejected_not_defaulted() {
    let err = normalize_row(&shoe_with(8, "  "), &index()).unwrap_err();
    assert!(err.to_string().contains("missing value"));
}

#[test]
fn integral_float_ids_coerce_but_fractions_do_not() {
    let idx = index();
    assert_eq!(normalize_row(&shoe_with(0, "12.0"), &idx).unwrap().product_id, 12);

    let err = normalize_row(&shoe_with(0, "12.5"), &idx).unwrap_err();
    assert!(err.to_string().contains("column 'ProductID'"));
}

#[test]
fn non_finite_floats_are_rejected() {
    let err = normalize_row(&shoe_with(9, "NaN"), &index()).unwrap_err();
    assert!(err.to_string().contains("finite"));
}

#[test]
fn over_long_brand_is_rejected() {
    let brand = "B".repeat(51);
    let err = normalize_row(&shoe_with(5, &brand), &index()).unwrap_err();
    assert!(err.to_string().contains("limit is 50"));

    let brand = "B".repeat(50);
    assert!(normalize_row(&shoe_with(5, &brand), &index()).is_ok());
}

#[test]
fn short_record_is_rejected_as_missing_value() {
    let err = normalize_row(&row(&["7", "Thing", "Sports"]), &index()).unwrap_err();
    match err {
        RowRejection::Coercion { column, message, .. } => {
            assert_eq!(column, "Rating");
            assert_eq!(message, "missing value");
        }
        other => panic!("unexpected rejection: {other}"),
    }
}
