// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Sample Store
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Scattered samples and their binning into lattice cells.
//!
//! A cell at stride g is the block of finest nodes that round to the same
//! coarse node. Cell ids are flattened row-major: `bj * block_nx + bi`.

use std::cmp::Ordering;

use log::debug;
use surface_types::error::{SurfaceError, SurfaceResult};
use surface_types::state::{GridGeometry, Sample};

/// Maps positions to cells at one stride.
#[derive(Debug, Clone, Copy)]
pub struct CellIndexer {
    x0: f64,
    y0: f64,
    x_inc: f64,
    y_inc: f64,
    stride: usize,
    block_nx: usize,
    block_ny: usize,
}

impl CellIndexer {
    pub fn new(geometry: &GridGeometry, stride: usize) -> Self {
        CellIndexer {
            x0: geometry.x0(),
            y0: geometry.y0(),
            x_inc: geometry.x_inc,
            y_inc: geometry.y_inc,
            stride,
            block_nx: (geometry.nx - 1) / stride + 1,
            block_ny: (geometry.ny - 1) / stride + 1,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn block_nx(&self) -> usize {
        self.block_nx
    }

    pub fn block_ny(&self) -> usize {
        self.block_ny
    }

    /// Current cell size in physical units (x, y).
    pub fn cell_size(&self) -> (f64, f64) {
        let g = self.stride as f64;
        (self.x_inc * g, self.y_inc * g)
    }

    /// Block coordinates of the nearest node at this stride, or `None`
    /// outside the lattice.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (cx, cy) = self.cell_size();
        let bi = ((x - self.x0) / cx).round();
        let bj = ((y - self.y0) / cy).round();
        if !(bi >= 0.0 && bj >= 0.0) {
            return None;
        }
        let (bi, bj) = (bi as usize, bj as usize);
        if bi >= self.block_nx || bj >= self.block_ny {
            return None;
        }
        Some((bi, bj))
    }

    #[inline]
    pub fn cell_id(&self, bi: usize, bj: usize) -> usize {
        bj * self.block_nx + bi
    }

    /// Block coordinates of a cell id.
    #[inline]
    pub fn block_of(&self, id: usize) -> (usize, usize) {
        (id % self.block_nx, id / self.block_nx)
    }

    /// Finest-resolution node index of a cell's node.
    #[inline]
    pub fn node_of(&self, id: usize) -> (usize, usize) {
        let (bi, bj) = self.block_of(id);
        (bi * self.stride, bj * self.stride)
    }

    /// Physical position of a cell's node.
    #[inline]
    pub fn node_xy(&self, id: usize) -> (f64, f64) {
        let (i, j) = self.node_of(id);
        (
            self.x0 + i as f64 * self.x_inc,
            self.y0 + j as f64 * self.y_inc,
        )
    }
}

/// Comparator state for the (cell, distance to cell node) ordering.
struct SortContext<'a> {
    indexer: &'a CellIndexer,
}

impl SortContext<'_> {
    fn distance_sq(&self, s: &Sample) -> f64 {
        match s.cell {
            Some(id) => {
                let (x, y) = self.indexer.node_xy(id);
                s.dist_sq(x, y)
            }
            None => f64::INFINITY,
        }
    }

    fn compare(&self, a: &Sample, b: &Sample) -> Ordering {
        a.cell
            .cmp(&b.cell)
            .then_with(|| self.distance_sq(a).total_cmp(&self.distance_sq(b)))
    }
}

/// The working sample set.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Keep finite records that fall on the finest lattice.
    pub fn ingest<I>(points: I, geometry: &GridGeometry) -> SurfaceResult<Self>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let indexer = CellIndexer::new(geometry, 1);
        let mut rejected = 0usize;
        let samples: Vec<Sample> = points
            .into_iter()
            .filter_map(|(x, y, z)| {
                let keep = x.is_finite()
                    && y.is_finite()
                    && z.is_finite()
                    && indexer.locate(x, y).is_some();
                if !keep {
                    rejected += 1;
                }
                keep.then(|| Sample::new(x, y, z))
            })
            .collect();

        if rejected > 0 {
            debug!("{rejected} samples outside the lattice or non-finite were skipped");
        }
        if samples.is_empty() {
            return Err(SurfaceError::NoData(
                "no finite samples inside the grid region".to_string(),
            ));
        }
        Ok(SampleSet { samples })
    }

    /// Recompute cell ids at the indexer's stride, drop samples that fall
    /// outside, and stable-sort by (cell, distance to the cell's node).
    pub fn reindex(&mut self, indexer: &CellIndexer) {
        for s in &mut self.samples {
            s.cell = indexer
                .locate(s.x, s.y)
                .map(|(bi, bj)| indexer.cell_id(bi, bj));
        }
        self.samples.retain(|s| s.cell.is_some());
        let ctx = SortContext { indexer };
        self.samples.sort_by(|a, b| ctx.compare(a, b));
    }

    /// Keep only the nearest sample per cell. Call on a freshly reindexed
    /// set. Returns the number discarded.
    pub fn discard_duplicates(&mut self) -> usize {
        let before = self.samples.len();
        self.samples.dedup_by(|later, kept| later.cell == kept.cell);
        before - self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn mean_z(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.z).sum::<f64>() / self.samples.len() as f64
    }

    pub fn rms_z(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let ss: f64 = self.samples.iter().map(|s| s.z * s.z).sum();
        (ss / self.samples.len() as f64).sqrt()
    }

    /// (min, max) of z.
    pub fn z_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.z), hi.max(s.z))
            })
    }
}
