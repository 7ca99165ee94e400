//! Briggs off-node data constraint.
//!
//! When the nearest sample to a node does not coincide with it, the
//! node update is folded with a local Taylor relation between the node,
//! three or four of its neighbours and the sample value.

use surface_types::state::{PaddedGrid, Quadrant};

use crate::stencil::{Stencil, E, N, NE, NW, S, SE, SW, W};

/// Six correction weights for one constrained node.
/// `b[4]` is the node's self-weight and `b[5]` the data term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BriggsCoefficients {
    pub b: [f64; 6],
}

impl BriggsCoefficients {
    /// `dx`, `dy`: sample offset from the node as a fraction of the current
    /// block, `z`: sample value in working units, `eps_p2`: ε².
    /// The offsets must not both be zero.
    pub fn new(dx: f64, dy: f64, z: f64, eps_p2: f64) -> Self {
        let xx = dx.abs();
        let yy = dy.abs();
        let one_plus_e2 = 1.0 + eps_p2;
        let xys = 1.0 + xx + yy;
        let btemp = 2.0 * one_plus_e2 / ((xx + yy) * xys);

        let mut b = [0.0; 6];
        b[0] = 1.0 - 0.5 * btemp * (xx + xx * xx);
        b[1] = eps_p2 - 1.0 + one_plus_e2 * (1.0 + xx - yy) / xys;
        b[2] = 1.0 - eps_p2 + one_plus_e2 * (1.0 + yy - xx) / xys;
        b[3] = eps_p2 - 0.5 * btemp * (yy + yy * yy);
        b[4] = b[0] + b[1] + b[2] + b[3] + btemp;
        b[5] = btemp * z;
        BriggsCoefficients { b }
    }

    /// Weighted neighbour sum for the node at (i, j). Neighbour selection
    /// mirrors the quadrant the sample sits in.
    #[inline]
    pub fn neighbour_sum(
        &self,
        grid: &PaddedGrid,
        i: isize,
        j: isize,
        quadrant: Quadrant,
        stencil: &Stencil,
    ) -> f64 {
        let at = |k: usize| {
            let (di, dj) = stencil[k];
            grid.get(i + di, j + dj)
        };
        let b = &self.b;
        match quadrant {
            Quadrant::First => b[0] * at(SE) + b[1] * at(S) + b[2] * at(W) + b[3] * at(NW),
            Quadrant::Second => b[0] * at(SW) + b[1] * at(S) + b[2] * at(E) + b[3] * at(NE),
            Quadrant::Third => b[0] * at(NW) + b[1] * at(N) + b[2] * at(E) + b[3] * at(SE),
            Quadrant::Fourth => b[0] * at(NE) + b[1] * at(N) + b[2] * at(W) + b[3] * at(SW),
        }
    }
}
