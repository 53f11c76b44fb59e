//! Benchmark: record building and duplicate lookup.
//!
//! Run with: cargo bench --bench extraction

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lead_intake::models::PhoneNumber;
use lead_intake::pipeline::{find_duplicate, RecordBuilder};

const NOTIFICATION: &str = "WhatsApp • Yesterday 10:42 PM\n+91 98765 43210: Hi, I need help registering a private limited company";

fn bench_build_record(c: &mut Criterion) {
    let builder = RecordBuilder::new().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    c.bench_function("build_record", |b| {
        b.iter(|| builder.build(black_box(NOTIFICATION), "Dattu", now).unwrap());
    });
}

/// Duplicate lookup scans the whole phone column, so cost grows with the sheet.
fn bench_find_duplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_duplicate");
    let phone = PhoneNumber::from_match("+919876543210");

    for rows in [1_000usize, 10_000, 50_000] {
        let column: Vec<String> = (0..rows).map(|i| format!("+91{:010}", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &column, |b, column| {
            b.iter(|| find_duplicate(black_box(column), &phone));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_record, bench_find_duplicate);
criterion_main!(benches);
