use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use indexed_tree::BTree;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const N: u64 = 10_000;

fn shuffled_keys() -> Vec<u64> {
    let mut keys: Vec<u64> = (0..N).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(42));
    keys
}

fn build(order: usize, keys: &[u64]) -> BTree<u64, u64> {
    let mut tree = BTree::new(order).expect("valid order");
    for &k in keys {
        tree.insert(k, k);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut group = c.benchmark_group("insert_random");
    for order in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, &order| {
            b.iter(|| black_box(build(order, &keys)));
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut group = c.benchmark_group("search_hit");
    for order in [4, 16, 64] {
        let tree = build(order, &keys);
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, _| {
            b.iter(|| {
                for k in &keys {
                    black_box(tree.search(k));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_search);
criterion_main!(benches);
