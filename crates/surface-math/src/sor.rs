//! Gauss-Seidel successive over-relaxation for the tension-blended
//! biharmonic stencil.
//!
//! Each sweep first refreshes the ghost ring from the boundary conditions,
//! then updates every non-fixed node in raster order (rows outer, columns
//! inner) at the current stride, in place.

use log::{debug, trace, warn};
use ndarray::Array2;
use surface_types::error::{SurfaceError, SurfaceResult};
use surface_types::state::{IterationMode, LevelDiagnostics, NodeBounds, NodeStatus, PaddedGrid};

use crate::briggs::BriggsCoefficients;
use crate::stencil::{
    edge_case, BoundaryConstants, StencilCoefficients, StencilTable, E, E2, N, N2, NE, NW, S,
    S2, SE, STENCIL_SIZE, SW, W, W2,
};

/// Everything a sweep reads besides the node values.
pub struct SweepContext<'a> {
    pub coeffs: &'a StencilCoefficients,
    pub boundary: &'a BoundaryConstants,
    pub table: &'a StencilTable,
    /// Per-node status at finest resolution, [ny, nx].
    pub status: &'a Array2<NodeStatus>,
    pub briggs: &'a [BriggsCoefficients],
    pub bounds: &'a NodeBounds,
    pub omega: f64,
}

/// Stop criteria for one level.
#[derive(Debug, Clone, Copy)]
pub struct SolveLimits {
    /// Convergence limit in data units, before division by the stride.
    pub limit: f64,
    /// Working-to-data unit factor applied to the tracked change.
    pub z_scale: f64,
    pub max_iterations: usize,
}

/// Fill the two-node ghost ring around the lattice at the table's stride.
pub fn extrapolate_boundary(
    grid: &mut PaddedGrid,
    boundary: &BoundaryConstants,
    coeffs: &StencilCoefficients,
    table: &StencilTable,
) {
    let g = table.stride() as isize;
    let nx = grid.nx() as isize;
    let ny = grid.ny() as isize;
    let (xe, ye) = (nx - 1, ny - 1);
    let bc = boundary;

    // First ring: tension condition across the south/north and west/east edges
    let mut i = 0;
    while i <= xe {
        let v = bc.y0 * grid.get(i, 0) + bc.y1 * grid.get(i, g);
        grid.set(i, -1, v);
        let v = bc.y0 * grid.get(i, ye) + bc.y1 * grid.get(i, ye - g);
        grid.set(i, ny, v);
        i += g;
    }
    let mut j = 0;
    while j <= ye {
        let v = bc.x1 * grid.get(g, j) + bc.x0 * grid.get(0, j);
        grid.set(-1, j, v);
        let v = bc.x1 * grid.get(xe - g, j) + bc.x0 * grid.get(xe, j);
        grid.set(nx, j, v);
        j += g;
    }

    // Corners: zero twist
    let v = grid.get(g, -1) + grid.get(-1, g) - grid.get(g, g);
    grid.set(-1, -1, v);
    let v = grid.get(g, ny) + grid.get(-1, ye - g) - grid.get(g, ye - g);
    grid.set(-1, ny, v);
    let v = grid.get(xe - g, -1) + grid.get(nx, g) - grid.get(xe - g, g);
    grid.set(nx, -1, v);
    let v = grid.get(xe - g, ny) + grid.get(nx, ye - g) - grid.get(xe - g, ye - g);
    grid.set(nx, ny, v);

    // Second ring: zero normal gradient of the Laplacian
    let (em2, tpem2) = (coeffs.eps_m2, coeffs.two_plus_em2);
    let (ep2, tpep2) = (coeffs.eps_p2, coeffs.two_plus_ep2);
    let nbx = xe / g;
    let nby = ye / g;

    let mut bi = 0;
    while bi <= nbx {
        let i = bi * g;
        let xc = edge_case(bi as usize, (nbx - bi) as usize);
        let at = |grid: &PaddedGrid, st: &[(isize, isize); STENCIL_SIZE], k: usize, j: isize| {
            let (di, dj) = st[k];
            grid.get(i + di, j + dj)
        };

        let st = table.stencil(xc, 0);
        let v = at(grid, st, N2, 0)
            + em2 * (at(grid, st, NW, 0) + at(grid, st, NE, 0) - at(grid, st, SW, 0) - at(grid, st, SE, 0))
            + tpem2 * (at(grid, st, S, 0) - at(grid, st, N, 0));
        let (di, dj) = st[S2];
        grid.set(i + di, dj, v);

        let st = table.stencil(xc, 4);
        let v = at(grid, st, S2, ye)
            - em2 * (at(grid, st, NW, ye) + at(grid, st, NE, ye) - at(grid, st, SW, ye) - at(grid, st, SE, ye))
            - tpem2 * (at(grid, st, S, ye) - at(grid, st, N, ye));
        let (di, dj) = st[N2];
        grid.set(i + di, ye + dj, v);

        bi += 1;
    }

    let mut bj = 0;
    while bj <= nby {
        let j = bj * g;
        let yc = edge_case(bj as usize, (nby - bj) as usize);
        let at = |grid: &PaddedGrid, st: &[(isize, isize); STENCIL_SIZE], k: usize, i: isize| {
            let (di, dj) = st[k];
            grid.get(i + di, j + dj)
        };

        let st = table.stencil(0, yc);
        let v = at(grid, st, E2, 0)
            + ep2 * (at(grid, st, NE, 0) + at(grid, st, SE, 0) - at(grid, st, NW, 0) - at(grid, st, SW, 0))
            + tpep2 * (at(grid, st, W, 0) - at(grid, st, E, 0));
        let (di, dj) = st[W2];
        grid.set(di, j + dj, v);

        let st = table.stencil(4, yc);
        let v = at(grid, st, W2, xe)
            - ep2 * (at(grid, st, NE, xe) + at(grid, st, SE, xe) - at(grid, st, NW, xe) - at(grid, st, SW, xe))
            - tpep2 * (at(grid, st, W, xe) - at(grid, st, E, xe));
        let (di, dj) = st[E2];
        grid.set(xe + di, j + dj, v);

        bj += 1;
    }
}

/// One in-place SOR sweep. Returns the largest |change| in working units.
pub fn sor_sweep(grid: &mut PaddedGrid, ctx: &SweepContext) -> f64 {
    extrapolate_boundary(grid, ctx.boundary, ctx.coeffs, ctx.table);

    let g = ctx.table.stride();
    let nbx = (grid.nx() - 1) / g;
    let nby = (grid.ny() - 1) / g;
    let omega = ctx.omega;
    let c = ctx.coeffs;
    let mut max_change: f64 = 0.0;

    for bj in 0..=nby {
        let j = bj * g;
        let yc = edge_case(bj, nby - bj);
        for bi in 0..=nbx {
            let i = bi * g;
            let status = ctx.status[[j, i]];
            if status.is_fixed() {
                continue;
            }
            let xc = edge_case(bi, nbx - bi);
            let st = ctx.table.stencil(xc, yc);
            let (ii, jj) = (i as isize, j as isize);

            let candidate = match status {
                NodeStatus::Quadrant { quadrant, briggs } => {
                    let mut sum = 0.0;
                    for (k, &(di, dj)) in st.iter().enumerate() {
                        sum += c.constrained[k] * grid.get(ii + di, jj + dj);
                    }
                    let br = &ctx.briggs[briggs];
                    let busum = br.neighbour_sum(grid, ii, jj, quadrant, st);
                    (sum + c.a0_const_2 * (busum + br.b[5]))
                        / (c.a0_const_1 + c.a0_const_2 * br.b[4])
                }
                _ => {
                    let mut sum = 0.0;
                    for (k, &(di, dj)) in st.iter().enumerate() {
                        sum += c.free[k] * grid.get(ii + di, jj + dj);
                    }
                    sum
                }
            };

            let old = grid.node(i, j);
            let new = ctx.bounds.clip(i, j, (1.0 - omega) * old + omega * candidate);
            grid.set_node(i, j, new);
            let change = (new - old).abs();
            if change > max_change || change.is_nan() {
                max_change = change;
            }
        }
    }

    max_change
}

/// Sweep until the largest change (data units) drops to `limit / stride`
/// or the iteration cap is hit. `total_iterations` accumulates across levels.
pub fn sor_solve(
    grid: &mut PaddedGrid,
    ctx: &SweepContext,
    mode: IterationMode,
    limits: SolveLimits,
    total_iterations: &mut usize,
) -> SurfaceResult<LevelDiagnostics> {
    let stride = ctx.table.stride();
    let threshold = limits.limit / stride as f64;
    let mut iterations = 0;
    let mut max_change = f64::INFINITY;
    let mut converged = false;

    while iterations < limits.max_iterations {
        max_change = sor_sweep(grid, ctx) * limits.z_scale;
        iterations += 1;
        *total_iterations += 1;
        if !max_change.is_finite() {
            return Err(SurfaceError::SolverDiverged {
                grid_factor: stride,
                iteration: iterations,
            });
        }
        trace!("stride {stride} {mode:?} sweep {iterations}: max change {max_change:.3e}");
        if max_change <= threshold {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(
            "stride {stride} {mode:?}: converged after {iterations} sweeps (max change {max_change:.3e} <= {threshold:.3e})"
        );
    } else {
        warn!(
            "stride {stride} {mode:?}: {iterations} sweeps without convergence (max change {max_change:.3e} > {threshold:.3e})"
        );
    }

    Ok(LevelDiagnostics {
        grid_factor: stride,
        mode,
        iterations,
        max_change,
        threshold,
        total_iterations: *total_iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        coeffs: StencilCoefficients,
        boundary: BoundaryConstants,
        table: StencilTable,
        status: Array2<NodeStatus>,
        bounds: NodeBounds,
    }

    impl Fixture {
        fn new(nx: usize, ny: usize, tension: f64, stride: usize) -> Self {
            Fixture {
                coeffs: StencilCoefficients::new(tension, 1.0),
                boundary: BoundaryConstants::new(tension, 1.0),
                table: StencilTable::new(stride),
                status: Array2::from_elem((ny, nx), NodeStatus::Free),
                bounds: NodeBounds::default(),
            }
        }

        fn ctx(&self) -> SweepContext<'_> {
            SweepContext {
                coeffs: &self.coeffs,
                boundary: &self.boundary,
                table: &self.table,
                status: &self.status,
                briggs: &[],
                bounds: &self.bounds,
                omega: 1.4,
            }
        }
    }

    fn limits(max_iterations: usize) -> SolveLimits {
        SolveLimits {
            limit: 1e-9,
            z_scale: 1.0,
            max_iterations,
        }
    }

    #[test]
    fn test_ghosts_extend_plane() {
        // Linear extrapolation (Tb = 0) reproduces a plane exactly
        let f = Fixture::new(7, 6, 0.0, 1);
        let mut grid = PaddedGrid::try_new(7, 6).unwrap();
        for j in 0..6 {
            for i in 0..7 {
                grid.set_node(i, j, 2.0 + 0.5 * i as f64 - 0.25 * j as f64);
            }
        }
        extrapolate_boundary(&mut grid, &f.boundary, &f.coeffs, &f.table);

        let mut ghosts: Vec<(isize, isize)> = vec![(-1, -1), (-1, 6), (7, -1), (7, 6)];
        for i in 0..7 {
            ghosts.extend([(i, -1), (i, 6), (i, -2), (i, 7)]);
        }
        for j in 0..6 {
            ghosts.extend([(-1, j), (7, j), (-2, j), (8, j)]);
        }
        for (i, j) in ghosts {
            let expected = 2.0 + 0.5 * i as f64 - 0.25 * j as f64;
            assert!(
                (grid.get(i, j) - expected).abs() < 1e-12,
                "ghost ({i},{j}) = {} expected {expected}",
                grid.get(i, j)
            );
        }
    }

    #[test]
    fn test_plane_is_fixed_point() {
        let f = Fixture::new(9, 9, 0.0, 1);
        let mut grid = PaddedGrid::try_new(9, 9).unwrap();
        for j in 0..9 {
            for i in 0..9 {
                grid.set_node(i, j, 1.0 + 0.1 * i as f64 + 0.3 * j as f64);
            }
        }
        let change = sor_sweep(&mut grid, &f.ctx());
        assert!(change < 1e-12, "plane should be preserved, change {change}");
    }

    #[test]
    fn test_fixed_nodes_untouched() {
        let mut f = Fixture::new(9, 9, 0.25, 1);
        f.status[[4, 4]] = NodeStatus::Fixed;
        let mut grid = PaddedGrid::try_new(9, 9).unwrap();
        grid.set_node(4, 4, 3.0);
        let mut total = 0;
        let diag = sor_solve(&mut grid, &f.ctx(), IterationMode::DataConstrained, limits(50), &mut total)
            .unwrap();
        assert_eq!(grid.node(4, 4), 3.0);
        assert_eq!(diag.iterations, total);
        assert!(grid.node(3, 4) > 0.0);
    }

    #[test]
    fn test_bounds_hold_after_every_sweep() {
        let mut f = Fixture::new(9, 9, 0.0, 1);
        f.status[[1, 1]] = NodeStatus::Fixed;
        f.status[[7, 7]] = NodeStatus::Fixed;
        f.bounds.upper = Some(Array2::from_elem((9, 9), 0.5));
        let mut grid = PaddedGrid::try_new(9, 9).unwrap();
        grid.set_node(1, 1, 0.0);
        grid.set_node(7, 7, 0.5);
        for _ in 0..20 {
            sor_sweep(&mut grid, &f.ctx());
            assert!(grid.nodes().iter().all(|&v| v <= 0.5));
        }
    }

    #[test]
    fn test_iteration_cap_not_fatal() {
        let mut f = Fixture::new(17, 17, 0.0, 1);
        f.status[[8, 8]] = NodeStatus::Fixed;
        let mut grid = PaddedGrid::try_new(17, 17).unwrap();
        grid.set_node(8, 8, 10.0);
        let mut total = 5;
        let diag = sor_solve(&mut grid, &f.ctx(), IterationMode::FillIn, limits(3), &mut total)
            .unwrap();
        assert!(!diag.converged);
        assert_eq!(diag.iterations, 3);
        assert_eq!(diag.total_iterations, 8);
    }

    #[test]
    fn test_divergence_reported() {
        let f = Fixture::new(9, 9, 0.0, 1);
        let mut grid = PaddedGrid::try_new(9, 9).unwrap();
        grid.set_node(4, 4, f64::NAN);
        let mut total = 0;
        let res = sor_solve(&mut grid, &f.ctx(), IterationMode::DataConstrained, limits(10), &mut total);
        assert!(matches!(res, Err(SurfaceError::SolverDiverged { grid_factor: 1, iteration: 1 })));
    }
}
