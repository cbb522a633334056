// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use elevated::{Mutator, MutatorConfig, Node, Registry, Shared, codec, compare, model, registry};
use std::{collections::BTreeMap, hint::black_box};
use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};

#[derive(Debug, Default)]
struct Entry {
    id: Option<i64>,
    weight: Option<f64>,
    title: Option<String>,
    next: Option<Shared<Entry>>,
}

model!(Entry as "Entry" {
    primitive id,
    primitive weight,
    primitive title,
    scalar next,
});

#[derive(Debug, Default)]
struct Index {
    entries: Vec<Shared<Entry>>,
    by_name: BTreeMap<String, Shared<Entry>>,
}

model!(Index as "Index" {
    array entries,
    map by_name,
});

/// An index of `len` entries, each linked to its predecessor and listed by name.
fn index(len: i64) -> Node {
    let mut entries: Vec<Shared<Entry>> = Vec::new();
    for id in 0..len {
        entries.push(Shared::new(Entry {
            id: Some(id),
            weight: Some(id as f64 / 3.0),
            title: Some(format!("entry {id}")),
            next: entries.last().cloned(),
        }));
    }
    let by_name = entries
        .iter()
        .map(|entry| (entry.borrow().title.clone().unwrap_or_default(), entry.clone()))
        .collect();
    Node::new(Index { entries, by_name })
}

fn fixture() -> (&'static Registry, &'static Node) {
    let registry = registry![Entry, Index].expect("types are distinct");
    let registry: &'static Registry = Box::leak(Box::new(registry));
    let index: &'static Node = Box::leak(Box::new(index(256)));
    (registry, index)
}

fn codec_benchmarks() -> impl IntoBenchmarks {
    let (registry, index) = fixture();
    let json = codec::encode(registry, index).expect("encodes");
    let json: &'static _ = Box::leak(Box::new(json));
    [
        benchmark_fn("codec::encode", move |b| {
            b.iter(move || codec::encode(registry, black_box(index)))
        }),
        benchmark_fn("codec::decode", move |b| {
            b.iter(move || codec::decode(registry, black_box(json)))
        }),
    ]
}

fn compare_benchmarks() -> impl IntoBenchmarks {
    let (registry, index) = fixture();
    let other: &'static Node = Box::leak(Box::new(self::index(256)));
    [
        benchmark_fn("compare::identical", move |b| {
            b.iter(move || compare(registry, black_box(index), black_box(index)))
        }),
        benchmark_fn("compare::equal", move |b| {
            b.iter(move || compare(registry, black_box(index), black_box(other)))
        }),
    ]
}

fn mutation_benchmarks() -> impl IntoBenchmarks {
    let (registry, index) = fixture();
    [
        benchmark_fn("mutation::clone", move |b| {
            b.iter(move || elevated::clone_node(registry, black_box(index)))
        }),
        benchmark_fn("mutation::mutate", move |b| {
            let mut mutator = Mutator::with_config(registry, MutatorConfig::default().with_seed(1));
            b.iter(move || mutator.mutate(black_box(index)))
        }),
    ]
}

tango_benchmarks!(
    codec_benchmarks(),
    compare_benchmarks(),
    mutation_benchmarks()
);
tango_main!();
