use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use surface_math::advisor::suggest_dimensions;
use surface_math::sor::{sor_sweep, SweepContext};
use surface_math::stencil::{BoundaryConstants, StencilCoefficients, StencilTable};
use surface_types::state::{NodeBounds, NodeStatus, PaddedGrid};

fn random_status(n: usize, fixed: usize) -> Array2<NodeStatus> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut status = Array2::from_elem((n, n), NodeStatus::Free);
    for _ in 0..fixed {
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        status[[j, i]] = NodeStatus::Fixed;
    }
    status
}

fn bench_sweep(c: &mut Criterion, n: usize, tension: f64) {
    let coeffs = StencilCoefficients::new(tension, 1.0);
    let boundary = BoundaryConstants::new(tension, 1.0);
    let table = StencilTable::new(1);
    let status = random_status(n, n * n / 50);
    let bounds = NodeBounds::default();
    let ctx = SweepContext {
        coeffs: &coeffs,
        boundary: &boundary,
        table: &table,
        status: &status,
        briggs: &[],
        bounds: &bounds,
        omega: 1.4,
    };
    let mut grid = PaddedGrid::try_new(n, n).expect("lattice should allocate");
    grid.set_node(n / 2, n / 2, 1.0);

    c.bench_function(&format!("sor_sweep_{n}x{n}_t{tension}"), |b| {
        b.iter(|| black_box(sor_sweep(&mut grid, &ctx)))
    });
}

fn bench_sweep_129(c: &mut Criterion) {
    bench_sweep(c, 129, 0.0);
}

fn bench_sweep_257_tension(c: &mut Criterion) {
    bench_sweep(c, 257, 0.25);
}

fn bench_advisor(c: &mut Criterion) {
    let mut group = c.benchmark_group("advisor");
    group.sample_size(10);
    group.bench_function("suggest_1001x733", |b| {
        b.iter(|| black_box(suggest_dimensions(1001, 733)))
    });
    group.finish();
}

criterion_group!(benches, bench_sweep_129, bench_sweep_257_tension, bench_advisor);
criterion_main!(benches);
