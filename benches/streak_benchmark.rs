use chrono::{DateTime, Days, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fitstreak::models::StreakReport;

/// Build a ten-year history with an entry on every third day skipped and
/// three activities per completed day (duplicates exercise the bucketing).
fn sparse_history(start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut dates = Vec::new();
    for day in 0..3650u64 {
        if day % 3 == 2 {
            continue;
        }
        let base = start.checked_add_days(Days::new(day)).unwrap();
        for hour in [6, 12, 20] {
            dates.push(base + chrono::Duration::hours(hour));
        }
    }
    dates
}

/// Build an unbroken ten-year history, one activity per day.
fn dense_history(start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    (0..3650u64)
        .map(|day| start.checked_add_days(Days::new(day)).unwrap())
        .collect()
}

fn benchmark_streak_computation(c: &mut Criterion) {
    let start = DateTime::parse_from_rfc3339("2015-01-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let sparse = sparse_history(start);
    let dense = dense_history(start);

    let mut group = c.benchmark_group("streak_computation");

    group.bench_function("sparse_ten_years", |b| {
        b.iter(|| StreakReport::from_dates(black_box(&sparse)))
    });

    group.bench_function("dense_ten_years", |b| {
        b.iter(|| StreakReport::from_dates(black_box(&dense)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_streak_computation);
criterion_main!(benches);
