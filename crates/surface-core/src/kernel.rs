// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Kernel
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Multigrid continuous-curvature gridding driver.
//!
//! Samples are detrended and rescaled, then relaxed on a sequence of
//! lattices from the coarsest common stride down to full resolution.
//! After each refinement the new nodes are forecast bilinearly and
//! relaxed with the old ones held (fill-in), before the data constraints
//! are reassigned and the whole lattice relaxed again.

use log::{info, warn};
use ndarray::Array2;
use surface_math::advisor::{suggest_dimensions, GridSuggestion};
use surface_math::briggs::BriggsCoefficients;
use surface_math::factors::{gcd, GridSchedule};
use surface_math::interp::{fill_in_forecast, on_coarse_lattice};
use surface_math::linalg::PlaneTrend;
use surface_math::sor::{sor_solve, SolveLimits, SweepContext};
use surface_math::stencil::{BoundaryConstants, StencilCoefficients, StencilTable};
use surface_types::config::{Registration, SurfaceConfig};
use surface_types::error::SurfaceResult;
use surface_types::state::{
    GridGeometry, IterationMode, LevelDiagnostics, NodeStatus, PaddedGrid, ResidualReport,
};

use crate::assign::Assigner;
use crate::breakline::{breakline_samples, Breakline};
use crate::constraints::{check_shape, load_bounds, Bound};
use crate::points::{CellIndexer, SampleSet};
use crate::residual::residual_report;
use crate::seed::seed_coarse;
use crate::trend::Trend;

/// Finished lattice and run record.
#[derive(Debug, Clone)]
pub struct SurfaceSolution {
    /// Node values in data units, [ny, nx].
    pub grid: Array2<f64>,
    pub geometry: GridGeometry,
    pub levels: Vec<LevelDiagnostics>,
    pub total_iterations: usize,
    pub plane: PlaneTrend,
    pub z_scale: f64,
    /// Samples used after filtering and duplicate removal.
    pub n_data: usize,
    pub n_discarded: usize,
    pub residuals: Option<ResidualReport>,
    /// The data were planar and the fitted plane was returned unrelaxed.
    pub planar_shortcut: bool,
}

/// A friendlier lattice and the region it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSuggestion {
    pub nx: usize,
    pub ny: usize,
    pub speedup: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone)]
pub enum SurfaceOutput {
    Solved(SurfaceSolution),
    /// Size query only; nothing was solved.
    Suggestions(Vec<RegionSuggestion>),
}

/// The gridding driver.
pub struct SurfaceKernel {
    config: SurfaceConfig,
    geometry: GridGeometry,
    lower: Option<Bound>,
    upper: Option<Bound>,
    breaklines: Vec<Breakline>,
}

impl SurfaceKernel {
    /// Validate the configuration and build the lattice geometry.
    pub fn new(config: SurfaceConfig) -> SurfaceResult<Self> {
        config.validate()?;
        let geometry = config.create_geometry()?;
        let lower = config.lower.map(Bound::from);
        let upper = config.upper.map(Bound::from);
        Ok(SurfaceKernel {
            config,
            geometry,
            lower,
            upper,
            breaklines: Vec::new(),
        })
    }

    /// Create a kernel from a JSON config file.
    pub fn from_file(path: &str) -> SurfaceResult<Self> {
        let config = SurfaceConfig::from_file(path)?;
        Self::new(config)
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Replace the lower bound. Grid bounds must match the lattice.
    pub fn set_lower_bound(&mut self, bound: Bound) -> SurfaceResult<()> {
        check_shape(&bound, &self.geometry)?;
        self.lower = Some(bound);
        Ok(())
    }

    /// Replace the upper bound. Grid bounds must match the lattice.
    pub fn set_upper_bound(&mut self, bound: Bound) -> SurfaceResult<()> {
        check_shape(&bound, &self.geometry)?;
        self.upper = Some(bound);
        Ok(())
    }

    pub fn add_breakline(&mut self, line: Breakline) {
        self.breaklines.push(line);
    }

    pub fn schedule(&self) -> GridSchedule {
        GridSchedule::new(self.geometry.nx, self.geometry.ny)
    }

    /// Larger regions whose lattices factor better, fastest first. The
    /// extra intervals are split between both sides of each axis.
    pub fn suggest_sizes(&self) -> Vec<RegionSuggestion> {
        let r = &self.config.region;
        let cells_offset = match r.registration {
            Registration::Gridline => 1,
            Registration::Pixel => 0,
        };
        let (nx, ny) = (self.geometry.nx, self.geometry.ny);
        suggest_dimensions(nx, ny)
            .into_iter()
            .map(|GridSuggestion { nx: sx, ny: sy, speedup }| {
                let extra_x = (sx - nx) as f64;
                let extra_y = (sy - ny) as f64;
                let west = (extra_x / 2.0).floor() * r.x_inc;
                let south = (extra_y / 2.0).floor() * r.y_inc;
                let x_min = r.x_min - west;
                let y_min = r.y_min - south;
                RegionSuggestion {
                    nx: sx,
                    ny: sy,
                    speedup,
                    x_min,
                    x_max: x_min + (sx - cells_offset) as f64 * r.x_inc,
                    y_min,
                    y_max: y_min + (sy - cells_offset) as f64 * r.y_inc,
                }
            })
            .collect()
    }

    /// Solve, or only advise on the lattice size when the config asks for
    /// a size query.
    pub fn run<I>(&self, points: I) -> SurfaceResult<SurfaceOutput>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        if self.config.size_query {
            return Ok(SurfaceOutput::Suggestions(self.suggest_sizes()));
        }
        self.solve(points).map(SurfaceOutput::Solved)
    }

    /// Grid the samples.
    pub fn solve<I>(&self, points: I) -> SurfaceResult<SurfaceSolution>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let start = std::time::Instant::now();
        let geom = &self.geometry;
        let cfg = &self.config;

        let extra = breakline_samples(&self.breaklines, geom);
        let mut samples = SampleSet::ingest(points.into_iter().chain(extra), geom)?;
        let data_range = samples.z_range();

        samples.reindex(&CellIndexer::new(geom, 1));
        let n_discarded = samples.discard_duplicates();
        if n_discarded > 0 {
            warn!(
                "{n_discarded} samples shared a node with a nearer sample and were discarded"
            );
        }

        let data_mean = samples.mean_z();
        let trend = Trend::remove(&mut samples, geom);
        let bounds = load_bounds(
            self.lower.as_ref(),
            self.upper.as_ref(),
            geom,
            data_range,
            &trend,
        )?;

        let eps = cfg.epsilon();
        let coeffs = StencilCoefficients::new(cfg.tension.interior, eps);
        let boundary = BoundaryConstants::new(cfg.tension.boundary, eps);

        if trend.is_planar() {
            info!(
                "samples are planar; returning the fitted plane ({} samples)",
                samples.len()
            );
            let mut flat = PaddedGrid::try_new(geom.nx, geom.ny)?;
            if bounds.is_active() {
                for j in 0..geom.ny {
                    for i in 0..geom.nx {
                        flat.set_node(i, j, bounds.clip(i, j, 0.0));
                    }
                }
            }
            let residuals = cfg.report_residuals.then(|| {
                let status = Array2::from_elem((geom.ny, geom.nx), NodeStatus::Free);
                residual_report(&mut flat, &samples, &status, geom, &coeffs, &boundary, 1.0)
            });
            return Ok(SurfaceSolution {
                grid: trend.restore(&flat),
                geometry: geom.clone(),
                levels: Vec::new(),
                total_iterations: 0,
                plane: trend.plane,
                z_scale: trend.z_scale,
                n_data: samples.len(),
                n_discarded,
                residuals,
                planar_shortcut: true,
            });
        }

        let limit = cfg.convergence.resolve(trend.rms);

        let schedule = self.schedule();
        if gcd(geom.nx - 1, geom.ny - 1) == 1 {
            match self.suggest_sizes().first() {
                Some(best) => warn!(
                    "nx-1 and ny-1 are mutually prime; region {}/{}/{}/{} ({}x{}) would run {:.1}x faster",
                    best.x_min, best.x_max, best.y_min, best.y_max, best.nx, best.ny, best.speedup
                ),
                None => warn!("nx-1 and ny-1 are mutually prime; expect a slow solve"),
            }
        }

        let mut grid = PaddedGrid::try_new(geom.nx, geom.ny)?;
        let mut status = Array2::from_elem((geom.ny, geom.nx), NodeStatus::Free);
        let mut briggs: Vec<BriggsCoefficients> = Vec::new();

        let assigner = Assigner {
            trend: &trend,
            bounds: &bounds,
            snap_fraction: cfg.snap_fraction,
            eps_p2: coeffs.eps_p2,
        };
        let solve_limits = SolveLimits {
            limit,
            z_scale: trend.z_scale,
            max_iterations: cfg.max_iterations,
        };

        let mut levels = Vec::with_capacity(2 * schedule.levels().len());
        let mut total_iterations = 0;
        let mut previous: Option<usize> = None;

        for &stride in schedule.levels() {
            let table = StencilTable::new(stride);

            if let Some(old) = previous {
                fill_in_forecast(&mut grid, old, stride, &bounds);
                for j in (0..geom.ny).step_by(stride) {
                    for i in (0..geom.nx).step_by(stride) {
                        status[[j, i]] = if on_coarse_lattice(i, j, old) {
                            NodeStatus::Fixed
                        } else {
                            NodeStatus::Free
                        };
                    }
                }
                briggs.clear();
                let ctx = SweepContext {
                    coeffs: &coeffs,
                    boundary: &boundary,
                    table: &table,
                    status: &status,
                    briggs: &briggs,
                    bounds: &bounds,
                    omega: cfg.over_relaxation,
                };
                let diag = sor_solve(
                    &mut grid,
                    &ctx,
                    IterationMode::FillIn,
                    solve_limits,
                    &mut total_iterations,
                )?;
                levels.push(diag);
            }

            let indexer = CellIndexer::new(geom, stride);
            samples.reindex(&indexer);

            if previous.is_none() {
                if let Some(radius) = cfg.search_radius {
                    seed_coarse(
                        &mut grid,
                        &samples,
                        &indexer,
                        radius,
                        cfg.seed_kernel,
                        &bounds,
                        |i, j| trend.to_working(i, j, data_mean),
                    );
                }
            }

            let summary = assigner.assign(&mut grid, &mut status, &mut briggs, &samples, &indexer);
            let ctx = SweepContext {
                coeffs: &coeffs,
                boundary: &boundary,
                table: &table,
                status: &status,
                briggs: &briggs,
                bounds: &bounds,
                omega: cfg.over_relaxation,
            };
            let diag = sor_solve(
                &mut grid,
                &ctx,
                IterationMode::DataConstrained,
                solve_limits,
                &mut total_iterations,
            )?;
            info!(
                "stride {stride}: {} fixed, {} Briggs nodes, {} sweeps (total {total_iterations}), max change {:.3e}",
                summary.fixed, summary.quadrant, diag.iterations, diag.max_change
            );
            levels.push(diag);
            previous = Some(stride);
        }

        let residuals = cfg.report_residuals.then(|| {
            residual_report(
                &mut grid,
                &samples,
                &status,
                geom,
                &coeffs,
                &boundary,
                trend.z_scale,
            )
        });
        if let Some(r) = &residuals {
            info!(
                "misfit over {} samples: mean {:.4e}, rms {:.4e}; roughness {:.4e}",
                r.n_data, r.mean_error, r.rms_error, r.roughness
            );
        }

        let out = trend.restore(&grid);
        info!(
            "gridded {}x{} nodes from {} samples in {total_iterations} sweeps ({:.1} ms)",
            geom.nx,
            geom.ny,
            samples.len(),
            start.elapsed().as_secs_f64() * 1e3
        );

        Ok(SurfaceSolution {
            grid: out,
            geometry: geom.clone(),
            levels,
            total_iterations,
            plane: trend.plane,
            z_scale: trend.z_scale,
            n_data: samples.len(),
            n_discarded,
            residuals,
            planar_shortcut: false,
        })
    }
}
