//! Benchmarks for tiered matching over large checkpoint libraries.

use std::hint::black_box;

use ckptresolver::{CandidateRecord, ExtensionSet, Matcher};
use criterion::{Criterion, criterion_group, criterion_main};

fn library(size: usize) -> Vec<CandidateRecord> {
    (0..size)
        .map(|i| {
            let ext = if i % 3 == 0 { "sft" } else { "safetensors" };
            CandidateRecord::new(format!("family_{}/model_{:05}.{}", i % 40, i, ext), "/models/checkpoints")
        })
        .collect()
}

/// Exact filename hit: tiers 1-2 only.
fn bench_exact_filename_10k(c: &mut Criterion) {
    let candidates = library(10_000);
    let preferred = ExtensionSet::safe();
    let matcher = Matcher::default();

    c.bench_function("exact_filename_10k", |b| {
        b.iter(|| {
            let m = matcher.resolve(black_box("MODEL_04242.safetensors"), black_box(&candidates), Some(&preferred));
            assert!(m.is_ok());
        });
    });
}

/// Miss: all five tiers evaluated.
fn bench_not_found_10k(c: &mut Criterion) {
    let candidates = library(10_000);
    let matcher = Matcher::default();

    c.bench_function("not_found_10k", |b| {
        b.iter(|| {
            let m = matcher.resolve(black_box("does-not-exist"), black_box(&candidates), None);
            assert!(m.is_err());
        });
    });
}

criterion_group!(benches, bench_exact_filename_10k, bench_not_found_10k);
criterion_main!(benches);
