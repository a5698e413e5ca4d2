//! Store operation benchmarks.
//!
//! Benchmarks:
//! - In-memory get/set (no serialization)
//! - Save of the whole map at different sizes
//! - Registry flush over many stores
//!
//! Run with:
//! ```bash
//! cargo bench --bench store_ops
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mirrorstore::{MemoryBackend, Registry, RegistryConfig, StoreOptions};
use serde_json::json;
use std::hint::black_box;
use std::time::Duration;

fn registry() -> Registry {
    let config = RegistryConfig {
        flush_on_drop: false,
        ..RegistryConfig::default()
    };
    Registry::new(MemoryBackend::new(), config)
}

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.measurement_time(Duration::from_secs(5));

    let registry = registry();
    let store = registry.connect("bench", StoreOptions::new()).unwrap();
    store.set("count", "42", false);

    group.bench_function("get_coerced", |b| {
        b.iter(|| black_box(store.get(black_box("count"))))
    });

    group.bench_function("set_in_memory", |b| {
        b.iter(|| store.set("count", black_box(7), false))
    });

    for entries in [10usize, 100, 1000] {
        let store = registry
            .connect(&format!("save-{entries}"), StoreOptions::new())
            .unwrap();
        store.set_state(
            (0..entries).map(|i| (format!("key-{i}"), json!({"value": i, "label": "entry"}))),
            false,
        );

        group.bench_with_input(BenchmarkId::new("save", entries), &store, |b, store| {
            b.iter(|| store.save())
        });
    }

    group.finish();
}

fn flush_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    let registry = registry();
    for i in 0..50 {
        let store = registry
            .connect(&format!("store-{i}"), StoreOptions::new())
            .unwrap();
        store.set("value", i, false);
    }

    group.bench_function("flush_50_stores", |b| b.iter(|| black_box(registry.flush())));

    group.finish();
}

criterion_group!(benches, store_benchmarks, flush_benchmarks);
criterion_main!(benches);
