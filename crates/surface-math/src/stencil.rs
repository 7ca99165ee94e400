// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Finite-Difference Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 12-point tension-blended biharmonic stencil.
//!
//! Discretises (1-T)·∇⁴u - T·∇²u = 0 with aspect ratio ε = dx/dy.
//! Neighbour slots are ordered
//!
//! ```text
//!              0 (N2)
//!       1 (NW) 2 (N) 3 (NE)
//! 4 (W2) 5 (W)   ·   6 (E) 7 (E2)
//!       8 (SW) 9 (S) 10 (SE)
//!              11 (S2)
//! ```
//!
//! Near an edge the outer arms are truncated onto the ghost ring, which
//! sits one and two finest-resolution nodes beyond the lattice.

pub const N2: usize = 0;
pub const NW: usize = 1;
pub const N: usize = 2;
pub const NE: usize = 3;
pub const W2: usize = 4;
pub const W: usize = 5;
pub const E: usize = 6;
pub const E2: usize = 7;
pub const SW: usize = 8;
pub const S: usize = 9;
pub const SE: usize = 10;
pub const S2: usize = 11;

/// Number of stencil neighbours.
pub const STENCIL_SIZE: usize = 12;

/// Edge cases per axis: 0 on the low edge, 1 one block in, 2 interior,
/// 3 one block from the high edge, 4 on the high edge.
pub const EDGE_CASES: usize = 5;

/// Weights for free and data-constrained nodes at one tension/aspect ratio.
#[derive(Debug, Clone)]
pub struct StencilCoefficients {
    /// Free-node weights; sum to 1.
    pub free: [f64; STENCIL_SIZE],
    /// Constrained-node weights; sum to `a0_const_1`.
    pub constrained: [f64; STENCIL_SIZE],
    pub a0_const_1: f64,
    pub a0_const_2: f64,
    /// ε²
    pub eps_p2: f64,
    /// ε⁻²
    pub eps_m2: f64,
    /// 2 + 2ε²
    pub two_plus_ep2: f64,
    /// 2 + 2ε⁻²
    pub two_plus_em2: f64,
}

impl StencilCoefficients {
    pub fn new(interior_tension: f64, epsilon: f64) -> Self {
        let t = interior_tension;
        let l = 1.0 - t;
        let e2 = epsilon * epsilon;
        let e4 = e2 * e2;

        let a0 = 1.0 / (6.0 * e4 * l + 10.0 * e2 * l + 8.0 * l - 2.0 * (1.0 + e2)
            + 4.0 * t * (1.0 + e2));

        let mut c1 = [0.0; STENCIL_SIZE];
        c1[W2] = -l;
        c1[E2] = -l;
        c1[N2] = -l * e4;
        c1[S2] = -l * e4;
        c1[W] = 2.0 * l * (1.0 + e2);
        c1[E] = c1[W];
        c1[N] = c1[W] * e2;
        c1[S] = c1[N];
        for k in [NW, NE, SW, SE] {
            c1[k] = -2.0 * l * e2;
        }

        let mut c0 = [0.0; STENCIL_SIZE];
        c0[W2] = -l * a0;
        c0[E2] = c0[W2];
        c0[N2] = -l * e4 * a0;
        c0[S2] = c0[N2];
        c0[W] = (2.0 * c1[W] + t) * a0;
        c0[E] = c0[W];
        c0[N] = c0[W] * e2;
        c0[S] = c0[N];
        for k in [NW, NE, SW, SE] {
            c0[k] = c1[k] * a0;
        }

        StencilCoefficients {
            free: c0,
            constrained: c1,
            a0_const_1: 2.0 * l * (1.0 + e4),
            a0_const_2: 2.0 - t + 2.0 * l * e2,
            eps_p2: e2,
            eps_m2: 1.0 / e2,
            two_plus_ep2: 2.0 + 2.0 * e2,
            two_plus_em2: 2.0 + 2.0 / e2,
        }
    }
}

/// Ghost-ring weights from the boundary tension condition
/// (1-Tb)·∂²u/∂n² + Tb·∂u/∂n = 0.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstants {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl BoundaryConstants {
    pub fn new(boundary_tension: f64, epsilon: f64) -> Self {
        let tb = boundary_tension;
        let y_denom = 2.0 * epsilon * (1.0 - tb) + tb;
        BoundaryConstants {
            x0: 4.0 * (1.0 - tb) / (2.0 - tb),
            x1: (3.0 * tb - 2.0) / (2.0 - tb),
            y0: 4.0 * epsilon * (1.0 - tb) / y_denom,
            y1: (tb - 2.0 * epsilon * (1.0 - tb)) / y_denom,
        }
    }
}

/// Signed (di, dj) offsets of the 12 neighbours.
pub type Stencil = [(isize, isize); STENCIL_SIZE];

/// Offsets for all 25 (x-edge, y-edge) cases at one stride.
#[derive(Debug, Clone)]
pub struct StencilTable {
    stride: usize,
    cases: [Stencil; EDGE_CASES * EDGE_CASES],
}

impl StencilTable {
    pub fn new(stride: usize) -> Self {
        let g = stride as isize;
        // Per edge case: step to the low neighbour, the second low
        // neighbour, the high neighbour and the second high neighbour.
        let low = [-1, -g, -g, -g, -g];
        let low2 = [-2, -g - 1, -2 * g, -2 * g, -2 * g];
        let high = [g, g, g, g, 1];
        let high2 = [2 * g, 2 * g, 2 * g, g + 1, 2];

        let mut cases = [[(0, 0); STENCIL_SIZE]; EDGE_CASES * EDGE_CASES];
        for xc in 0..EDGE_CASES {
            for yc in 0..EDGE_CASES {
                let (w, w2, e, e2) = (low[xc], low2[xc], high[xc], high2[xc]);
                let (s, s2, n, n2) = (low[yc], low2[yc], high[yc], high2[yc]);
                let st = &mut cases[case_index(xc, yc)];
                st[N2] = (0, n2);
                st[NW] = (w, n);
                st[N] = (0, n);
                st[NE] = (e, n);
                st[W2] = (w2, 0);
                st[W] = (w, 0);
                st[E] = (e, 0);
                st[E2] = (e2, 0);
                st[SW] = (w, s);
                st[S] = (0, s);
                st[SE] = (e, s);
                st[S2] = (0, s2);
            }
        }
        StencilTable { stride, cases }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline(always)]
    pub fn stencil(&self, x_case: usize, y_case: usize) -> &Stencil {
        &self.cases[case_index(x_case, y_case)]
    }
}

#[inline(always)]
fn case_index(x_case: usize, y_case: usize) -> usize {
    x_case * EDGE_CASES + y_case
}

/// Edge case of a node `from_low` blocks above the low edge and
/// `from_high` blocks below the high edge.
#[inline(always)]
pub fn edge_case(from_low: usize, from_high: usize) -> usize {
    if from_low < 2 {
        from_low
    } else if from_high < 2 {
        4 - from_high
    } else {
        2
    }
}
