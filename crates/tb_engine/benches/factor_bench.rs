//! Factorization and solvability throughput on small textbook polynomials.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tb_engine::{AlgebraEngine, SymbolicEngine};

const CASES: &[(&str, &str)] = &[
    ("quadratic", "x^2 - 5*x + 6"),
    ("cubic_split", "x^3 - 6*x^2 + 11*x - 6"),
    ("quartic_pairs", "x^4 - x^2 - 2"),
    ("sextic_cubics", "x^6 + x^4 - x^3 - 2*x - 2"),
    ("quintic_s5", "x^5 - x - 1"),
];

fn bench_factor(c: &mut Criterion) {
    let engine = SymbolicEngine::new();
    let mut group = c.benchmark_group("factor_polynomial");
    for (name, text) in CASES {
        let e = engine.parse(text).expect("bench input parses");
        group.bench_function(*name, |b| {
            b.iter(|| engine.factor_polynomial(black_box(&e), "x"))
        });
    }
    group.finish();
}

fn bench_galois(c: &mut Criterion) {
    let engine = SymbolicEngine::new();
    let e = engine.parse("x^5 + 15*x + 12").expect("bench input parses");
    let factors = engine.factor_polynomial(&e, "x").expect("polynomial");
    let (quintic, _) = &factors[0];
    c.bench_function("galois_quintic_f20", |b| {
        b.iter(|| engine.galois_group(black_box(quintic)))
    });
}

criterion_group!(benches, bench_factor, bench_galois);
criterion_main!(benches);
