//! Scope matcher benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::str::FromStr;
use wavemap_auth::scope::{is_satisfied, missing, ScopeGrant};

fn grants(raw: &[&str]) -> Vec<ScopeGrant> {
    raw.iter()
        .map(|s| ScopeGrant::from_str(s).unwrap())
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let required = grants(&[
        "read:stations",
        "write:stations",
        "read:bands",
        "read:operators",
    ]);
    let granted_exact = grants(&[
        "read:stations",
        "write:stations",
        "read:bands",
        "read:operators",
        "read:regions",
    ]);
    let granted_wildcard = grants(&["read:*", "write:stations"]);
    let granted_universal = grants(&["*"]);
    let granted_miss = grants(&["read:stations"]);

    c.bench_function("is_satisfied_exact", |b| {
        b.iter(|| is_satisfied(black_box(&required), black_box(&granted_exact)))
    });

    c.bench_function("is_satisfied_wildcard", |b| {
        b.iter(|| is_satisfied(black_box(&required), black_box(&granted_wildcard)))
    });

    c.bench_function("is_satisfied_universal", |b| {
        b.iter(|| is_satisfied(black_box(&required), black_box(&granted_universal)))
    });

    c.bench_function("missing_partial_cover", |b| {
        b.iter(|| missing(black_box(&required), black_box(&granted_miss)))
    });
}

fn bench_parsing(c: &mut Criterion) {
    c.bench_function("parse_scope_grant", |b| {
        b.iter(|| ScopeGrant::from_str(black_box("write:stations")))
    });
}

criterion_group!(benches, bench_matcher, bench_parsing);
criterion_main!(benches);
