//! Simulation benchmarks for crawl_core.
//!
//! Run with: `cargo bench -p crawl_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crawl_core::prelude::*;
use crawl_core::map_generation::generate_map;

/// Map generation, enemy ticks and visibility recomputation.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("generate_map", |b| {
        let mut seed = 0_u64;
        b.iter(|| {
            seed += 1;
            let mut rng = SeededRandom::new(seed);
            black_box(generate_map(&mut rng))
        });
    });

    c.bench_function("enemy_tick", |b| {
        let mut game = GameInstance::from_seed(42);
        b.iter(|| {
            if !game.is_playing() {
                game.restart_with_seed(42);
            }
            black_box(game.enemy_tick())
        });
    });

    c.bench_function("visibility_recompute", |b| {
        let grid = Grid::new(Cell::Floor);
        let hero = Position::new(20, 12);
        b.iter(|| black_box(VisibilityMask::recompute(&grid, black_box(hero))));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
