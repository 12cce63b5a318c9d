//! Gradient precompute benchmark.
//!
//! The builder's linear-scan extraction is O(N²) in open cells; this keeps
//! an eye on what that costs for a realistic hall footprint.

use concourse_logic::cost::CostSurface;
use concourse_logic::gradient;
use concourse_logic::grid::{Cell, Grid};
use criterion::{criterion_group, criterion_main, Criterion};

fn hall_surface(side: i32) -> CostSurface {
    let mut grid = Grid::filled(side, side, 0.0);
    // Wall band through the middle with gaps at both ends.
    for y in 6..side - 6 {
        grid.set(Cell::new(side / 2, y), 1.0);
    }
    CostSurface::from_grid(grid)
}

fn bench_gradient_build(c: &mut Criterion) {
    let cost = hall_surface(48);
    let exits: Vec<Cell> = (20..28).map(|x| Cell::new(x, 0)).collect();

    c.bench_function("gradient_build_48x48", |b| {
        b.iter(|| gradient::build(&cost, &exits, None).unwrap())
    });

    let weights = Grid::filled(48, 48, 2);
    c.bench_function("gradient_build_48x48_weighted", |b| {
        b.iter(|| gradient::build(&cost, &exits, Some(&weights)).unwrap())
    });
}

criterion_group!(benches, bench_gradient_build);
criterion_main!(benches);
