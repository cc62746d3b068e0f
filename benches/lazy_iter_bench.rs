//! Benchmark for the lazy batched traversal at several batch sizes.

use std::hint::black_box;

use bstree_map::OrderedMap;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures::StreamExt;

fn benchmark_lazy_iter(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = criterion.benchmark_group("lazy_iter");

    let size = 10_000_usize;
    let map: OrderedMap = (0..size)
        .map(|index| (format!("{:08}", index.wrapping_mul(2_654_435_761) % size), "value"))
        .collect();

    for batch_size in [1, 64, 1024, 0] {
        group.bench_with_input(
            BenchmarkId::new("OrderedMap", batch_size),
            &batch_size,
            |bencher, &batch_size| {
                bencher.to_async(&runtime).iter(|| async {
                    let entries = map
                        .lazy_iter(batch_size)
                        .fold(0, |total, batch| async move { total + batch.len() })
                        .await;
                    black_box(entries)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_lazy_iter);
criterion_main!(benches);
