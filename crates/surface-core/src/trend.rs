//! Planar trend removal and restoration.
//!
//! Samples are detrended against a least-squares plane in finest node-index
//! units and scaled by the RMS of the residuals. The relaxer works entirely
//! in those units; the plane and scale are re-applied once at the end.

use log::debug;
use ndarray::Array2;
use surface_math::linalg::PlaneTrend;
use surface_types::constants::PLANAR_RMS_LIMIT;
use surface_types::state::{GridGeometry, PaddedGrid};

use crate::points::SampleSet;

#[derive(Debug, Clone, Copy)]
pub struct Trend {
    pub plane: PlaneTrend,
    /// RMS of the detrended samples, data units.
    pub rms: f64,
    /// Working-to-data factor. Equals `rms` unless the data are planar.
    pub z_scale: f64,
    planar: bool,
}

impl Trend {
    /// Fit, subtract and rescale in place. These are the only two
    /// mutations a sample's z ever sees.
    pub fn remove(samples: &mut SampleSet, geometry: &GridGeometry) -> Self {
        let (lo, hi) = samples.z_range();
        let constant = hi - lo <= PLANAR_RMS_LIMIT * lo.abs().max(hi.abs()).max(1.0);
        let plane = if constant {
            PlaneTrend::constant(samples.mean_z())
        } else {
            let fit = PlaneTrend::fit(
                samples
                    .iter()
                    .map(|s| (geometry.index_x(s.x), geometry.index_y(s.y), s.z)),
            );
            // Collinear positions leave the tilt undetermined
            if fit.is_zero() {
                PlaneTrend::constant(samples.mean_z())
            } else {
                fit
            }
        };

        let mut peak: f64 = 0.0;
        for s in samples.as_mut_slice() {
            peak = peak.max(s.z.abs());
            s.z -= plane.evaluate(geometry.index_x(s.x), geometry.index_y(s.y));
        }
        let rms = samples.rms_z();
        let planar = rms <= PLANAR_RMS_LIMIT * peak.max(1.0);
        let z_scale = if planar { 1.0 } else { rms };

        if !planar {
            for s in samples.as_mut_slice() {
                s.z /= z_scale;
            }
        }
        debug!(
            "trend z = {:.6} + {:.6} i + {:.6} j, residual rms {rms:.6e}",
            plane.c0, plane.c1, plane.c2
        );

        Trend {
            plane,
            rms,
            z_scale,
            planar,
        }
    }

    /// True when the samples lie on the fitted plane.
    pub fn is_planar(&self) -> bool {
        self.planar
    }

    /// Convert a data value at finest node (i, j) to working units.
    #[inline]
    pub fn to_working(&self, i: usize, j: usize, z: f64) -> f64 {
        (z - self.plane.evaluate(i as f64, j as f64)) / self.z_scale
    }

    /// Working-unit change of the trend between a sample and its node, for
    /// index offsets (sample minus node).
    #[inline]
    pub fn node_correction(&self, di: f64, dj: f64) -> f64 {
        (self.plane.c1 * di + self.plane.c2 * dj) / self.z_scale
    }

    /// Lattice in data units from working node values.
    pub fn restore(&self, grid: &PaddedGrid) -> Array2<f64> {
        let (nx, ny) = (grid.nx(), grid.ny());
        Array2::from_shape_fn((ny, nx), |(j, i)| {
            grid.node(i, j) * self.z_scale + self.plane.evaluate(i as f64, j as f64)
        })
    }
}
