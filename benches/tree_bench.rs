//! Benchmarks for tree construction, walks and persistent writes
//!
//! Run with:
//! ```bash
//! cargo bench --bench tree_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ssz_tree::tree::subtree_fill_to_contents;
use ssz_tree::{
    Encodable, Gindex, Node, NodeIter, Root, TreeBacked, TypeDef, Uint64, View, ViewArena,
};

fn leaves(n: u64) -> Vec<Node> {
    (0..n).map(|i| Node::leaf(Root::from_length(i + 1))).collect()
}

fn balances(n: u64) -> View {
    TypeDef::list(TypeDef::uint64(), 1 << 40)
        .from_elements((0..n).map(|i| View::Basic(Uint64(i).into())).collect())
        .expect("list fits its limit")
}

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_root");
    for n in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(balances(n)).hash_tree_root())
        });
    }
    group.finish();
}

fn bench_node_iter(c: &mut Criterion) {
    let depth = 16;
    let tree = subtree_fill_to_contents(&leaves(1 << depth), depth).expect("tree fits");
    c.bench_function("node_iter_65536", |b| {
        b.iter(|| {
            NodeIter::new(tree.clone(), depth, 1 << depth)
                .expect("length fits")
                .filter_map(|n| n.ok())
                .count()
        })
    });
    c.bench_function("getter_65536", |b| {
        b.iter(|| {
            (0..1u64 << depth)
                .map(|i| tree.getter(Gindex::from_index(i, depth).expect("index fits")))
                .filter_map(|n| n.ok())
                .count()
        })
    });
}

fn bench_writes(c: &mut Criterion) {
    let list = balances(100_000);
    c.bench_function("set_basic_then_root", |b| {
        b.iter_batched(
            || {
                let mut arena = ViewArena::new();
                let id = arena.insert(list.clone());
                (arena, id)
            },
            |(mut arena, id)| {
                for i in (0..100_000u64).step_by(997) {
                    arena.set_basic(id, i, Uint64(i * 2).into()).expect("index in range");
                }
                arena.get(id).expect("view exists").hash_tree_root()
            },
            criterion::BatchSize::SmallInput,
        )
    });
    c.bench_function("encode_100000", |b| b.iter(|| list.encode_bytes().expect("encodes")));
}

criterion_group!(benches, bench_merkle_root, bench_node_iter, bench_writes);
criterion_main!(benches);
