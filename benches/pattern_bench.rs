// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Benchmarks for pattern compilation and evaluation.
#![allow(missing_docs, clippy::cast_precision_loss)]

use behavior_pattern::{BehaviorRegistry, Event, Pattern, PatternSet};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const FUNNEL: &str = "view[2:] -> (add_to_cart | wishlist){s:600} -> purchase{s:3600} => Converted";

/// Cycles view, view, add_to_cart, purchase, noise with half-second spacing.
fn make_events(registry: &mut BehaviorRegistry, n: usize) -> Vec<Event> {
    let cycle = ["view", "view", "add_to_cart", "purchase", "noise"];
    (0..n)
        .map(|i| Event::named(registry, cycle[i % cycle.len()], i as f64 * 0.5))
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_parse");
    for text in [
        "A => Single",
        "A -> B -> C => Chain",
        FUNNEL,
        "((A & B)[2] | (C & D){s:5})[1:3] -> E[+] -> (F | G | H)[*] => Nested",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(text.len()), &text, |b, text| {
            b.iter(|| {
                let mut registry = BehaviorRegistry::new();
                Pattern::parse(black_box(text), &mut registry).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_evaluate");

    for &n in &[100_usize, 1_000, 10_000, 100_000, 1_000_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut registry = BehaviorRegistry::new();
            let mut pattern = Pattern::parse(FUNNEL, &mut registry).unwrap();
            let events = make_events(&mut registry, n);
            b.iter(|| pattern.evaluate(black_box(&events)));
        });
    }

    group.finish();
}

fn bench_pattern_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_set_evaluate");

    for &n in &[1_000_usize, 100_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut set = PatternSet::new();
            set.parse_all(&[
                FUNNEL,
                "view -> purchase => Direct",
                "add_to_cart -> noise{s:1} => Abandoned",
            ])
            .unwrap();
            let names = ["view", "view", "add_to_cart", "purchase", "noise"];
            let events: Vec<Event> = (0..n)
                .map(|i| set.event(names[i % names.len()], i as f64 * 0.5))
                .collect();
            b.iter(|| set.evaluate(black_box(&events)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_pattern_set);
criterion_main!(benches);
