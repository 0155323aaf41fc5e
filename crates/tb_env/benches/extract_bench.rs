//! Workspace extraction cost, which is quadratic in entry length.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeSet;
use tb_engine::SymbolicEngine;
use tb_env::{ExtractionPolicy, Extractor};

fn bench_entry_length(c: &mut Criterion) {
    let engine = SymbolicEngine::new();
    let known: BTreeSet<String> = ["x".to_string()].into_iter().collect();
    let extractor = Extractor::new(&engine, ExtractionPolicy::Permissive, 256);
    let base = "the answer is (1 + I*sqrt(3))/2 or maybe x^2 - 5*x + 6 ";

    let mut group = c.benchmark_group("extract");
    for len in [16usize, 64, 128, 256] {
        let entry: String = base.chars().cycle().take(len).collect();
        group.bench_with_input(BenchmarkId::from_parameter(len), &entry, |b, entry| {
            b.iter(|| extractor.extract(black_box(&[entry.as_str()]), &known))
        });
    }
    group.finish();
}

fn bench_episode_substitute(c: &mut Criterion) {
    use tb_env::{Action, EnvConfig, Episode};

    c.bench_function("episode_quadratic_roots", |b| {
        b.iter(|| {
            let mut ep = Episode::symbolic("x^2 - 5*x + 6 = 0", None, EnvConfig::multi_root())
                .expect("episode");
            ep.step(Action::Write("(5 + 1)/2 and (5 - 1)/2".into()))
                .expect("write");
            let two = tb_engine::AlgebraEngine::number(ep.engine(), 2);
            ep.step(Action::Substitute {
                target: None,
                expr: two,
            })
            .expect("substitute")
        })
    });
}

criterion_group!(benches, bench_entry_length, bench_episode_substitute);
criterion_main!(benches);
