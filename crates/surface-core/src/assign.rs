// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Constraint Assignment
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nearest-sample assignment at one stride.
//!
//! For each occupied cell the first (nearest) sample either snaps onto
//! the node, which is then held fixed, or becomes a Briggs constraint on
//! the node's update.

use ndarray::Array2;
use surface_math::briggs::BriggsCoefficients;
use surface_types::state::{NodeBounds, NodeStatus, PaddedGrid, Quadrant};

use crate::points::{CellIndexer, SampleSet};
use crate::trend::Trend;

/// Counts from one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub fixed: usize,
    pub quadrant: usize,
}

/// Inputs shared by every assignment pass.
pub struct Assigner<'a> {
    pub trend: &'a Trend,
    pub bounds: &'a NodeBounds,
    pub snap_fraction: f64,
    /// ε²
    pub eps_p2: f64,
}

impl Assigner<'_> {
    /// Rebuild node status and Briggs records for the indexer's stride.
    /// `samples` must be reindexed at the same stride.
    pub fn assign(
        &self,
        grid: &mut PaddedGrid,
        status: &mut Array2<NodeStatus>,
        briggs: &mut Vec<BriggsCoefficients>,
        samples: &SampleSet,
        indexer: &CellIndexer,
    ) -> AssignmentSummary {
        let g = indexer.stride();
        for j in (0..status.nrows()).step_by(g) {
            for i in (0..status.ncols()).step_by(g) {
                status[[j, i]] = NodeStatus::Free;
            }
        }
        briggs.clear();

        let (cell_x, cell_y) = indexer.cell_size();
        let tolerance = self.snap_fraction * cell_x.min(cell_y);
        let x_inc = cell_x / g as f64;
        let y_inc = cell_y / g as f64;
        let mut summary = AssignmentSummary::default();
        let mut last_cell = None;

        for s in samples.iter() {
            let Some(cell) = s.cell else { continue };
            if last_cell == Some(cell) {
                continue;
            }
            last_cell = Some(cell);

            let (i, j) = indexer.node_of(cell);
            let (node_x, node_y) = indexer.node_xy(cell);
            let dx = s.x - node_x;
            let dy = s.y - node_y;

            if dx.abs() < tolerance && dy.abs() < tolerance {
                let z = s.z + self.trend.node_correction(dx / x_inc, dy / y_inc);
                grid.set_node(i, j, self.bounds.clip(i, j, z));
                status[[j, i]] = NodeStatus::Fixed;
                summary.fixed += 1;
            } else {
                let xx = dx / cell_x;
                let yy = dy / cell_y;
                let quadrant = Quadrant::classify(xx, yy);
                status[[j, i]] = NodeStatus::Quadrant {
                    quadrant,
                    briggs: briggs.len(),
                };
                briggs.push(BriggsCoefficients::new(xx, yy, s.z, self.eps_p2));
                summary.quadrant += 1;
            }
        }

        summary
    }
}
