//! # World Benchmark
//!
//! Full world ticks over scattered bodies, plus broad-phase queries.
//!
//! Run with: `cargo bench --package skirmish_physics`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{EntityManager, Group};
use skirmish_physics::{Aabb, BodyDesc, Vec2f, Vec2i, World, WorldConfig};

const SOLID: Group = Group::new(0);
const MOVER: Group = Group::new(1);

/// Side of the square arena in world units.
const ARENA: i32 = 200_000;

/// Builds a world with one static solid per ten movers.
fn scattered(movers: usize, seed: u64) -> World {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = World::new(WorldConfig::default()).unwrap();

    for _ in 0..movers / 10 {
        let center = Vec2i::new(rng.gen_range(0..ARENA), rng.gen_range(0..ARENA));
        world
            .create_body(
                BodyDesc::new(center, Vec2i::new(500, 500))
                    .group(SOLID.mask())
                    .resolve(true),
            )
            .unwrap();
    }
    for _ in 0..movers {
        let center = Vec2i::new(rng.gen_range(0..ARENA), rng.gen_range(0..ARENA));
        let velocity = Vec2f::new(rng.gen_range(-5000.0..5000.0), rng.gen_range(-5000.0..5000.0));
        world
            .create_body(
                BodyDesc::new(center, Vec2i::new(300, 300))
                    .dynamic()
                    .group(MOVER.mask())
                    .check(SOLID | MOVER)
                    .resolve(true)
                    .velocity(velocity),
            )
            .unwrap();
    }
    world
}

/// Benchmark: one full world update (step + dispatch + reclaim).
fn bench_world_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_update");

    for movers in [1_000, 10_000] {
        let mut world = scattered(movers, 7);
        let mut entities = EntityManager::default();
        group.bench_with_input(BenchmarkId::from_parameter(movers), &movers, |b, _| {
            b.iter(|| black_box(world.update(1.0 / 60.0, &mut entities)));
        });
    }

    group.finish();
}

/// Benchmark: region and distance queries against a static layout.
fn bench_queries(c: &mut Criterion) {
    let world = scattered(10_000, 11);
    let area = Aabb::new(Vec2i::new(ARENA / 2, ARENA / 2), Vec2i::new(5_000, 5_000)).unwrap();

    c.bench_function("query_region_10k", |b| {
        b.iter(|| black_box(world.query_region(area).count()));
    });
    c.bench_function("query_distance_10k", |b| {
        b.iter(|| black_box(world.query_distance(Vec2i::new(ARENA / 2, ARENA / 2), 5_000).count()));
    });
}

criterion_group!(benches, bench_world_update, bench_queries);
criterion_main!(benches);
