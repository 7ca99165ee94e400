//! Bilinear forecast of newly introduced nodes after a stride refinement.

use surface_types::state::{NodeBounds, PaddedGrid};

/// Fill every node on the `new_stride` lattice that is not on the
/// `old_stride` lattice by bilinear interpolation of the four surrounding
/// old nodes, then clip it to the bounds. Old nodes are left unchanged.
///
/// `old_stride` must be a multiple of `new_stride`.
pub fn fill_in_forecast(
    grid: &mut PaddedGrid,
    old_stride: usize,
    new_stride: usize,
    bounds: &NodeBounds,
) {
    let nx = grid.nx();
    let ny = grid.ny();
    let inv = 1.0 / old_stride as f64;

    for j in (0..ny).step_by(new_stride) {
        let j0 = (j / old_stride) * old_stride;
        let tj = (j - j0) as f64 * inv;
        let j1 = if j > j0 { (j0 + old_stride).min(ny - 1) } else { j0 };
        for i in (0..nx).step_by(new_stride) {
            if i % old_stride == 0 && j % old_stride == 0 {
                continue;
            }
            let i0 = (i / old_stride) * old_stride;
            let ti = (i - i0) as f64 * inv;
            let i1 = if i > i0 { (i0 + old_stride).min(nx - 1) } else { i0 };

            let v00 = grid.node(i0, j0);
            let v10 = grid.node(i1, j0);
            let v01 = grid.node(i0, j1);
            let v11 = grid.node(i1, j1);
            let v = (1.0 - tj) * ((1.0 - ti) * v00 + ti * v10) + tj * ((1.0 - ti) * v01 + ti * v11);
            grid.set_node(i, j, bounds.clip(i, j, v));
        }
    }
}

/// True when node (i, j) already existed at `old_stride`.
#[inline]
pub fn on_coarse_lattice(i: usize, j: usize, old_stride: usize) -> bool {
    i % old_stride == 0 && j % old_stride == 0
}
