//! Misfit of a finished lattice at the data.
//!
//! Each sample not sitting on a fixed node is re-estimated from its node
//! by a third-order Taylor expansion built from finite differences.

use ndarray::Array2;
use surface_math::sor::extrapolate_boundary;
use surface_math::stencil::{BoundaryConstants, StencilCoefficients, StencilTable};
use surface_types::state::{GridGeometry, NodeStatus, PaddedGrid, ResidualReport};

use crate::points::SampleSet;

/// Compute the report on a full-resolution lattice in working units.
/// Refreshes the ghost ring at stride 1.
pub fn residual_report(
    grid: &mut PaddedGrid,
    samples: &SampleSet,
    status: &Array2<NodeStatus>,
    geometry: &GridGeometry,
    coeffs: &StencilCoefficients,
    boundary: &BoundaryConstants,
    z_scale: f64,
) -> ResidualReport {
    let table = StencilTable::new(1);
    extrapolate_boundary(grid, boundary, coeffs, &table);

    let n_data = samples.len();
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for s in samples.iter() {
        let fi = geometry.index_x(s.x);
        let fj = geometry.index_y(s.y);
        let i = fi.round();
        let j = fj.round();
        if i < 0.0 || j < 0.0 || i as usize >= geometry.nx || j as usize >= geometry.ny {
            continue;
        }
        if status[[j as usize, i as usize]].is_fixed() {
            continue;
        }
        let estimate = taylor_estimate(grid, i as isize, j as isize, fi - i, fj - j);
        let err = (s.z - estimate) * z_scale;
        sum += err;
        sum_sq += err * err;
    }

    let mut roughness = 0.0;
    for j in 0..geometry.ny as isize {
        for i in 0..geometry.nx as isize {
            let lap = grid.get(i + 1, j) + grid.get(i - 1, j) + grid.get(i, j + 1)
                + grid.get(i, j - 1)
                - 4.0 * grid.get(i, j);
            roughness += lap * lap;
        }
    }

    let n = n_data.max(1) as f64;
    ResidualReport {
        n_data,
        n_nodes: geometry.n_nodes(),
        mean_error: sum / n,
        rms_error: (sum_sq / n).sqrt(),
        roughness: roughness * z_scale * z_scale,
    }
}

/// Third-order Taylor estimate at offset (dx, dy) from node (i, j),
/// offsets in node units.
fn taylor_estimate(grid: &PaddedGrid, i: isize, j: isize, dx: f64, dy: f64) -> f64 {
    let u = |di: isize, dj: isize| grid.get(i + di, j + dj);
    let c = u(0, 0);

    let d1x = 0.5 * (u(1, 0) - u(-1, 0));
    let d1y = 0.5 * (u(0, 1) - u(0, -1));
    let d2x = u(1, 0) - 2.0 * c + u(-1, 0);
    let d2y = u(0, 1) - 2.0 * c + u(0, -1);
    let dxy = 0.25 * (u(1, 1) - u(-1, 1) - u(1, -1) + u(-1, -1));
    let d3x = 0.5 * (u(2, 0) - 2.0 * u(1, 0) + 2.0 * u(-1, 0) - u(-2, 0));
    let d3y = 0.5 * (u(0, 2) - 2.0 * u(0, 1) + 2.0 * u(0, -1) - u(0, -2));
    let d3x2y = 0.5 * ((u(1, 1) - 2.0 * u(0, 1) + u(-1, 1)) - (u(1, -1) - 2.0 * u(0, -1) + u(-1, -1)));
    let d3xy2 = 0.5 * ((u(1, 1) - 2.0 * u(1, 0) + u(1, -1)) - (u(-1, 1) - 2.0 * u(-1, 0) + u(-1, -1)));

    c + dx * d1x
        + dy * d1y
        + dx * dx * (0.5 * d2x + dx * d3x / 6.0)
        + dy * dy * (0.5 * d2y + dy * d3y / 6.0)
        + dx * dy * (dxy + 0.5 * dx * d3x2y + 0.5 * dy * d3xy2)
}
