use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bvtree::{BoundablePointSet, BvTree, ParallelConfig, VolumeKind};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_SETS: usize = 200_000;

fn benchmark_parallelism(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let sets: Vec<_> = (0..N_SETS)
        .map(|i| {
            let p = DVec3::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0));
            BoundablePointSet::new(i, vec![p])
        })
        .collect();

    let mut group = c.benchmark_group(format!("parallelism_{}k", N_SETS / 1000));
    group.sample_size(10);

    let max_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
    let mut cores_list = Vec::new();
    let mut cores = 1;
    while cores <= max_cores {
        cores_list.push(cores);
        cores *= 2;
    }
    if cores_list.last().map_or(false, |&last| last < max_cores) {
        cores_list.push(max_cores);
    }

    for &num_threads in &cores_list {
        group.bench_with_input(BenchmarkId::new("aabb", num_threads), &num_threads, |b, &n| {
            let mut tree = BvTree::new(VolumeKind::Aabb, 0.01).unwrap();
            b.iter(|| {
                tree.parallel_build(sets.clone(), 0.01, n).unwrap();
                black_box(tree.num_nodes());
            })
        });

        group.bench_with_input(BenchmarkId::new("obb", num_threads), &num_threads, |b, &n| {
            let mut tree = BvTree::new(VolumeKind::Obb, 0.01).unwrap();
            b.iter(|| {
                tree.parallel_build(sets.clone(), 0.01, n).unwrap();
                black_box(tree.num_nodes());
            })
        });
    }

    // Inline threshold sweep on the default pool.
    for min in [64, 512, 4096] {
        let config = ParallelConfig::default().with_min_parallel_elements(min);
        group.bench_with_input(BenchmarkId::new("threshold", min), &config, |b, config| {
            let mut tree = BvTree::new(VolumeKind::Aabb, 0.01).unwrap();
            b.iter(|| {
                tree.parallel_build_with(sets.clone(), 0.01, config).unwrap();
                black_box(tree.num_nodes());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parallelism);
criterion_main!(benches);
