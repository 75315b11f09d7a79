use criterion::{Criterion, black_box, criterion_group, criterion_main};
use csv::StringRecord;

use product_ingest::ingestion::{normalize_row, parse_discount, parse_launch_date, validate_headers};
use product_ingest::types::Schema;

fn bench_normalize(c: &mut Criterion) {
    let headers = StringRecord::from(vec![
        "ProductID", "Name", "Category", "Rating", "Reviews", "Brand", "Stock", "LaunchDate", "Discount", "Price",
    ]);
    let index = validate_headers(&headers, &Schema::products()).expect("headers");
    let iso = StringRecord::from(vec![
        "1", "Running Shoe", "Sports", "4.2", "350", "Nike", "40", "2023-05-01", "15%", "89.99",
    ]);
    let day_first = StringRecord::from(vec![
        "2", "Headphones", "Electronics", "4.7", "1200", "Sony", "12", "01-05-2023", "10", "299.0",
    ]);

    c.bench_function("normalize_row/iso_date", |b| {
        b.iter(|| normalize_row(black_box(&iso), &index))
    });
    c.bench_function("normalize_row/day_first_date", |b| {
        b.iter(|| normalize_row(black_box(&day_first), &index))
    });
    c.bench_function("parse_discount/percent", |b| b.iter(|| parse_discount(black_box("12.5%"))));
    c.bench_function("parse_launch_date/unparseable", |b| {
        b.iter(|| parse_launch_date(black_box("not-a-date")))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
