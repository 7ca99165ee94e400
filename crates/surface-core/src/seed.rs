//! Radius-limited weighted-average seeding of the coarsest lattice.

use log::warn;
use surface_types::config::SeedKernel;
use surface_types::state::{NodeBounds, PaddedGrid};

use crate::points::{CellIndexer, SampleSet};

/// Fill every node at the indexer's stride with a distance-weighted mean of
/// the samples within `radius` (physical units). Nodes with nothing in
/// range take `fallback(i, j)`, the data mean expressed at that node.
/// `samples` must be reindexed at the same stride. Returns the number of
/// nodes that fell back.
pub fn seed_coarse<F>(
    grid: &mut PaddedGrid,
    samples: &SampleSet,
    indexer: &CellIndexer,
    radius: f64,
    kernel: SeedKernel,
    bounds: &NodeBounds,
    fallback: F,
) -> usize
where
    F: Fn(usize, usize) -> f64,
{
    let g = indexer.stride();
    let (cell_x, cell_y) = indexer.cell_size();
    let reach_x = (radius / cell_x).ceil() as usize;
    let reach_y = (radius / cell_y).ceil() as usize;
    let (bnx, bny) = (indexer.block_nx(), indexer.block_ny());
    let r2_max = radius * radius;
    let gauss = -4.5 / r2_max;
    let list = samples.as_slice();
    let mut fallbacks = 0;

    for bj in 0..bny {
        for bi in 0..bnx {
            let (x0, y0) = indexer.node_xy(indexer.cell_id(bi, bj));
            let mut w_sum = 0.0;
            let mut wz_sum = 0.0;
            let mut exact = None;

            let row_lo = bj.saturating_sub(reach_y);
            let row_hi = (bj + reach_y).min(bny - 1);
            let col_lo = bi.saturating_sub(reach_x);
            let col_hi = (bi + reach_x).min(bnx - 1);

            'rows: for row in row_lo..=row_hi {
                let first = indexer.cell_id(col_lo, row);
                let last = indexer.cell_id(col_hi, row);
                let start = list.partition_point(|s| s.cell < Some(first));
                for s in &list[start..] {
                    match s.cell {
                        Some(c) if c <= last => {}
                        _ => break,
                    }
                    let r2 = s.dist_sq(x0, y0);
                    if r2 > r2_max {
                        continue;
                    }
                    let w = match kernel {
                        SeedKernel::InverseDistance => {
                            if r2 == 0.0 {
                                exact = Some(s.z);
                                break 'rows;
                            }
                            1.0 / r2
                        }
                        SeedKernel::Gaussian => (gauss * r2).exp(),
                    };
                    w_sum += w;
                    wz_sum += w * s.z;
                }
            }

            let (i, j) = (bi * g, bj * g);
            let value = match exact {
                Some(z) => z,
                None if w_sum > 0.0 => wz_sum / w_sum,
                None => {
                    fallbacks += 1;
                    fallback(i, j)
                }
            };
            grid.set_node(i, j, bounds.clip(i, j, value));
        }
    }

    if fallbacks > 0 {
        warn!(
            "{fallbacks} coarse nodes had no sample within radius {radius}; seeded with the data mean"
        );
    }
    fallbacks
}
