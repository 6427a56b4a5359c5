//! Front-end benchmarks for sqlvibe
//!
//! Measures tokenizing, parsing and cache-key normalization over a small set
//! of representative statements, plus the cost of a warm plan-cache lookup.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlvibe::sql::{normalize, parse, tokenize, PlanCache};

const STATEMENTS: [(&str, &str); 5] = [
    ("point_select", "SELECT name, email FROM users WHERE id = 42"),
    (
        "join_order_limit",
        "SELECT u.name, o.total FROM users u JOIN orders o ON u.id = o.user_id \
         WHERE o.total > 100 ORDER BY o.total DESC LIMIT 10",
    ),
    (
        "window",
        "SELECT dept, RANK() OVER (PARTITION BY dept ORDER BY salary DESC) FROM staff",
    ),
    (
        "cte_aggregate",
        "WITH recent AS (SELECT * FROM orders WHERE created > '2024-01-01') \
         SELECT user_id, COUNT(*), SUM(total) FROM recent GROUP BY user_id HAVING COUNT(*) > 2",
    ),
    (
        "insert_values",
        "INSERT INTO users (id, name, email) VALUES (1, 'alice', 'a@example.com'), \
         (2, 'bob', 'b@example.com')",
    ),
];

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    for (name, sql) in STATEMENTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), sql, |b, sql| {
            b.iter(|| tokenize(black_box(sql)))
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, sql) in STATEMENTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), sql, |b, sql| {
            b.iter(|| parse(black_box(sql)))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for (name, sql) in STATEMENTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), sql, |b, sql| {
            b.iter(|| normalize(black_box(sql)))
        });
    }
    group.finish();
}

fn bench_plan_cache_hit(c: &mut Criterion) {
    let cache = PlanCache::new(64);
    let sql = "SELECT name FROM users WHERE id = ?";
    let _ = cache.get_or_parse(sql);

    c.bench_function("plan_cache_hit", |b| {
        b.iter(|| cache.get_or_parse(black_box(sql)))
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse,
    bench_normalize,
    bench_plan_cache_hit
);
criterion_main!(benches);
