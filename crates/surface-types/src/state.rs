// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{s, Array1, Array2, ArrayView2};

use crate::config::{GridRegion, Registration};
use crate::constants::{GRID_PADDING, MIN_NODES_PER_SIDE, REGION_SLOP};
use crate::error::{SurfaceError, SurfaceResult};

/// Output lattice geometry.
/// Node (i, j) sits at (x[i], y[j]); arrays are stored [ny, nx] (rows = y).
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub nx: usize,
    pub ny: usize,
    pub x_inc: f64,
    pub y_inc: f64,
    pub registration: Registration,
    pub x: Array1<f64>, // node x coordinates [nx]
    pub y: Array1<f64>, // node y coordinates [ny]
}

impl GridGeometry {
    /// Derive the node lattice from a region. Pixel registration puts the
    /// nodes at cell centres, so the lattice has one node fewer per axis.
    pub fn from_region(region: &GridRegion) -> SurfaceResult<Self> {
        let nx = axis_nodes(region.x_min, region.x_max, region.x_inc, region.registration, "x")?;
        let ny = axis_nodes(region.y_min, region.y_max, region.y_inc, region.registration, "y")?;
        if nx < MIN_NODES_PER_SIDE || ny < MIN_NODES_PER_SIDE {
            return Err(SurfaceError::GridTooSmall { nx, ny });
        }

        let shift = match region.registration {
            Registration::Gridline => 0.0,
            Registration::Pixel => 0.5,
        };
        let x = Array1::from_shape_fn(nx, |i| region.x_min + (i as f64 + shift) * region.x_inc);
        let y = Array1::from_shape_fn(ny, |j| region.y_min + (j as f64 + shift) * region.y_inc);

        Ok(GridGeometry {
            nx,
            ny,
            x_inc: region.x_inc,
            y_inc: region.y_inc,
            registration: region.registration,
            x,
            y,
        })
    }

    /// x of the first node.
    pub fn x0(&self) -> f64 {
        self.x[0]
    }

    /// y of the first node.
    pub fn y0(&self) -> f64 {
        self.y[0]
    }

    /// Fractional node index along x (finest resolution).
    #[inline]
    pub fn index_x(&self, x: f64) -> f64 {
        (x - self.x[0]) / self.x_inc
    }

    /// Fractional node index along y (finest resolution).
    #[inline]
    pub fn index_y(&self, y: f64) -> f64 {
        (y - self.y[0]) / self.y_inc
    }

    pub fn n_nodes(&self) -> usize {
        self.nx * self.ny
    }
}

fn axis_nodes(
    min: f64,
    max: f64,
    inc: f64,
    registration: Registration,
    axis: &str,
) -> SurfaceResult<usize> {
    if !(min.is_finite() && max.is_finite() && inc.is_finite()) {
        return Err(SurfaceError::ConfigError(format!(
            "{axis} bounds and spacing must be finite"
        )));
    }
    if inc <= 0.0 {
        return Err(SurfaceError::ConfigError(format!(
            "{axis} spacing must be positive, got {inc}"
        )));
    }
    if max <= min {
        return Err(SurfaceError::ConfigError(format!(
            "{axis}_max ({max}) must exceed {axis}_min ({min})"
        )));
    }
    let intervals = (max - min) / inc;
    let whole = intervals.round();
    if (intervals - whole).abs() > REGION_SLOP * intervals.max(1.0) {
        return Err(SurfaceError::ConfigError(format!(
            "{axis} range {} is not a whole number of increments {inc}",
            max - min
        )));
    }
    let intervals = whole as usize;
    Ok(match registration {
        Registration::Gridline => intervals + 1,
        Registration::Pixel => intervals,
    })
}

/// A scattered observation. `cell` is the flattened cell id at the current
/// resolution, `None` when the sample falls outside the lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub cell: Option<usize>,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Sample {
            x,
            y,
            z,
            cell: None,
        }
    }

    #[inline]
    pub fn dist_sq(&self, x0: f64, y0: f64) -> f64 {
        let dx = self.x - x0;
        let dy = self.y - y0;
        dx * dx + dy * dy
    }
}

/// Position of an off-node sample relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// dx >= 0, dy >= 0
    First,
    /// dx < 0, dy >= 0
    Second,
    /// dx < 0, dy < 0
    Third,
    /// dx >= 0, dy < 0
    Fourth,
}

impl Quadrant {
    /// Classify an offset from the node. The x sign is decided first, so a
    /// sample on a cell edge (dx == 0 or dy == 0) falls on the east/north side.
    pub fn classify(dx: f64, dy: f64) -> Self {
        if dx >= 0.0 {
            if dy >= 0.0 {
                Quadrant::First
            } else {
                Quadrant::Fourth
            }
        } else if dy >= 0.0 {
            Quadrant::Second
        } else {
            Quadrant::Third
        }
    }
}

/// Role of a node during a relaxation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Plain minimum-curvature update.
    #[default]
    Free,
    /// Nearest sample lies off-node; `briggs` indexes its correction record.
    Quadrant { quadrant: Quadrant, briggs: usize },
    /// Value is held; the relaxer never writes it.
    Fixed,
}

impl NodeStatus {
    pub fn is_fixed(&self) -> bool {
        matches!(self, NodeStatus::Fixed)
    }
}

/// Node values with a ghost margin of `GRID_PADDING` nodes on every side.
///
/// Indices are signed node coordinates: (0, 0) is the first real node and
/// (-2, -2) the outermost ghost. The margin is measured in finest-resolution
/// nodes regardless of the current stride.
#[derive(Debug, Clone)]
pub struct PaddedGrid {
    nx: usize,
    ny: usize,
    data: Array2<f64>, // [ny + 4, nx + 4]
}

const PAD: isize = GRID_PADDING as isize;

impl PaddedGrid {
    /// Allocate a zeroed lattice. Allocation failure is returned, not aborted.
    pub fn try_new(nx: usize, ny: usize) -> SurfaceResult<Self> {
        let rows = ny + 2 * GRID_PADDING;
        let cols = nx + 2 * GRID_PADDING;
        let len = rows
            .checked_mul(cols)
            .ok_or(SurfaceError::Allocation(usize::MAX))?;

        let mut buf: Vec<f64> = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| SurfaceError::Allocation(len))?;
        buf.resize(len, 0.0);
        let data = Array2::from_shape_vec((rows, cols), buf)
            .map_err(|e| SurfaceError::LinAlg(format!("padded grid shape: {e}")))?;

        Ok(PaddedGrid { nx, ny, data })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Value at signed node coordinate (i, j), ghosts included.
    #[inline(always)]
    pub fn get(&self, i: isize, j: isize) -> f64 {
        self.data[[(j + PAD) as usize, (i + PAD) as usize]]
    }

    #[inline(always)]
    pub fn set(&mut self, i: isize, j: isize, value: f64) {
        self.data[[(j + PAD) as usize, (i + PAD) as usize]] = value;
    }

    /// Value at real node (i, j).
    #[inline(always)]
    pub fn node(&self, i: usize, j: usize) -> f64 {
        self.data[[j + GRID_PADDING, i + GRID_PADDING]]
    }

    #[inline(always)]
    pub fn set_node(&mut self, i: usize, j: usize, value: f64) {
        self.data[[j + GRID_PADDING, i + GRID_PADDING]] = value;
    }

    /// View of the real nodes only, [ny, nx].
    pub fn nodes(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![
            GRID_PADDING..GRID_PADDING + self.ny,
            GRID_PADDING..GRID_PADDING + self.nx
        ])
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}

/// Optional per-node lower/upper limits in working units, [ny, nx].
/// NaN entries leave that node unbounded.
#[derive(Debug, Clone, Default)]
pub struct NodeBounds {
    pub lower: Option<Array2<f64>>,
    pub upper: Option<Array2<f64>>,
}

impl NodeBounds {
    pub fn is_active(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    /// Clip a candidate value at node (i, j). The lower limit wins when the
    /// two disagree.
    #[inline]
    pub fn clip(&self, i: usize, j: usize, value: f64) -> f64 {
        if let Some(lower) = &self.lower {
            let lo = lower[[j, i]];
            if !lo.is_nan() && value < lo {
                return lo;
            }
        }
        if let Some(upper) = &self.upper {
            let hi = upper[[j, i]];
            if !hi.is_nan() && value > hi {
                return hi;
            }
        }
        value
    }
}

/// Which kind of solve produced a level record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationMode {
    /// Newly introduced nodes relaxed with the coarse nodes held fixed.
    FillIn,
    /// All nodes relaxed against the data constraints.
    DataConstrained,
}

/// Per-level convergence record.
#[derive(Debug, Clone)]
pub struct LevelDiagnostics {
    pub grid_factor: usize,
    pub mode: IterationMode,
    pub iterations: usize,
    /// Largest change of the last sweep, data units.
    pub max_change: f64,
    /// Stop threshold used at this level, data units.
    pub threshold: f64,
    pub total_iterations: usize,
    pub converged: bool,
}

/// Misfit of the finished surface at the data.
#[derive(Debug, Clone)]
pub struct ResidualReport {
    pub n_data: usize,
    pub n_nodes: usize,
    pub mean_error: f64,
    pub rms_error: f64,
    /// Sum of squared discrete Laplacians over all nodes.
    pub roughness: f64,
}
