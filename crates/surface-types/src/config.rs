// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONVERGENCE_PERCENT, DEFAULT_MAX_ITERATIONS, DEFAULT_OVER_RELAXATION,
    DEFAULT_SNAP_FRACTION,
};
use crate::error::{SurfaceError, SurfaceResult};
use crate::state::GridGeometry;

/// Top-level gridding configuration.
/// Maps 1:1 to the JSON documents under `configs/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub region: GridRegion,
    #[serde(default)]
    pub tension: TensionConfig,
    /// Anisotropy factor: physical dx / dy = aspect_ratio * x_inc / y_inc.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
    #[serde(default)]
    pub convergence: ConvergenceLimit,
    /// SOR sweep cap per resolution level.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_over_relaxation")]
    pub over_relaxation: f64,
    /// Radius for the coarse-grid seeding pass. No seeding when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_radius: Option<f64>,
    #[serde(default)]
    pub seed_kernel: SeedKernel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<BoundSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<BoundSetting>,
    /// Snap tolerance as a fraction of the smaller current cell dimension.
    #[serde(default = "default_snap_fraction")]
    pub snap_fraction: f64,
    /// Compute mean/RMS misfit and roughness after the final solve.
    #[serde(default)]
    pub report_residuals: bool,
    /// Only run the grid-size advisor; do not solve.
    #[serde(default)]
    pub size_query: bool,
}

/// Target lattice bounds and spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRegion {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_inc: f64,
    pub y_inc: f64,
    #[serde(default)]
    pub registration: Registration,
}

/// Node (gridline) or cell-centre (pixel) registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    #[default]
    Gridline,
    Pixel,
}

/// Tension in [0, 1]: 0 = minimum curvature, 1 = harmonic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TensionConfig {
    #[serde(default)]
    pub interior: f64,
    #[serde(default)]
    pub boundary: f64,
}

/// Stop criterion on the largest per-sweep change, in data units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ConvergenceLimit {
    Absolute(f64),
    /// Percent of the RMS of the detrended samples.
    PercentOfRms(f64),
}

impl Default for ConvergenceLimit {
    fn default() -> Self {
        ConvergenceLimit::PercentOfRms(DEFAULT_CONVERGENCE_PERCENT)
    }
}

impl ConvergenceLimit {
    /// Resolve to an absolute limit given the detrended sample RMS.
    pub fn resolve(&self, rms: f64) -> f64 {
        match *self {
            ConvergenceLimit::Absolute(v) => v,
            ConvergenceLimit::PercentOfRms(p) => 0.01 * p * rms,
        }
    }
}

/// Weighting used when seeding the coarsest lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedKernel {
    /// w = 1 / r²
    #[default]
    InverseDistance,
    /// w = exp(-4.5 r² / R²)
    Gaussian,
}

/// Serializable lower/upper bound setting. Grid-valued bounds are passed
/// programmatically to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BoundSetting {
    /// Minimum (lower) or maximum (upper) of the input data.
    Data,
    Value(f64),
}

fn default_aspect_ratio() -> f64 {
    1.0
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_over_relaxation() -> f64 {
    DEFAULT_OVER_RELAXATION
}
fn default_snap_fraction() -> f64 {
    DEFAULT_SNAP_FRACTION
}

impl SurfaceConfig {
    /// Configuration with default tuning for the given region.
    pub fn new(region: GridRegion) -> Self {
        SurfaceConfig {
            region,
            tension: TensionConfig::default(),
            aspect_ratio: default_aspect_ratio(),
            convergence: ConvergenceLimit::default(),
            max_iterations: default_max_iterations(),
            over_relaxation: default_over_relaxation(),
            search_radius: None,
            seed_kernel: SeedKernel::default(),
            lower: None,
            upper: None,
            snap_fraction: default_snap_fraction(),
            report_residuals: false,
            size_query: false,
        }
    }

    /// Load from a JSON file.
    pub fn from_file(path: &str) -> SurfaceResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Check every tunable and the region. Does not look at data.
    pub fn validate(&self) -> SurfaceResult<()> {
        let t = &self.tension;
        if !(0.0..=1.0).contains(&t.interior) || !(0.0..=1.0).contains(&t.boundary) {
            return Err(SurfaceError::ConfigError(format!(
                "tension must lie in [0, 1], got interior={} boundary={}",
                t.interior, t.boundary
            )));
        }
        if !(1.0..=2.0).contains(&self.over_relaxation) {
            return Err(SurfaceError::ConfigError(format!(
                "over-relaxation factor must lie in [1, 2], got {}",
                self.over_relaxation
            )));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(SurfaceError::ConfigError(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.max_iterations == 0 {
            return Err(SurfaceError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        let limit = match self.convergence {
            ConvergenceLimit::Absolute(v) | ConvergenceLimit::PercentOfRms(v) => v,
        };
        if !(limit.is_finite() && limit > 0.0) {
            return Err(SurfaceError::ConfigError(format!(
                "convergence limit must be positive, got {limit}"
            )));
        }
        if let Some(radius) = self.search_radius {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(SurfaceError::ConfigError(format!(
                    "search radius must be positive, got {radius}"
                )));
            }
        }
        if !(self.snap_fraction > 0.0 && self.snap_fraction <= 0.5) {
            return Err(SurfaceError::ConfigError(format!(
                "snap fraction must lie in (0, 0.5], got {}",
                self.snap_fraction
            )));
        }
        if let (Some(BoundSetting::Value(lo)), Some(BoundSetting::Value(hi))) =
            (self.lower, self.upper)
        {
            if lo > hi {
                return Err(SurfaceError::ConfigError(format!(
                    "lower bound {lo} exceeds upper bound {hi}"
                )));
            }
        }
        GridGeometry::from_region(&self.region).map(|_| ())
    }

    /// Build the lattice geometry for this config's region.
    pub fn create_geometry(&self) -> SurfaceResult<GridGeometry> {
        GridGeometry::from_region(&self.region)
    }

    /// Aspect-ratio epsilon used by the stencil: physical dx / dy.
    pub fn epsilon(&self) -> f64 {
        self.aspect_ratio * self.region.x_inc / self.region.y_inc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// CARGO_MANIFEST_DIR points to crates/surface-types/, configs live two
    /// levels up.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
    }

    fn config_path(relative: &str) -> String {
        project_root().join(relative).to_string_lossy().to_string()
    }

    fn region() -> GridRegion {
        GridRegion {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
            x_inc: 1.0,
            y_inc: 1.0,
            registration: Registration::Gridline,
        }
    }

    #[test]
    fn test_load_default_config() {
        let cfg = SurfaceConfig::from_file(&config_path("configs/default_surface.json")).unwrap();
        assert_eq!(cfg.max_iterations, 250);
        assert!((cfg.over_relaxation - 1.4).abs() < 1e-12);
        assert_eq!(cfg.convergence, ConvergenceLimit::PercentOfRms(0.1));
        assert!(cfg.search_radius.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_load_bounded_config() {
        let cfg = SurfaceConfig::from_file(&config_path("configs/bounded_tension.json")).unwrap();
        assert!((cfg.tension.interior - 0.25).abs() < 1e-12);
        assert!((cfg.tension.boundary - 0.25).abs() < 1e-12);
        assert_eq!(cfg.lower, Some(BoundSetting::Value(0.0)));
        assert_eq!(cfg.upper, Some(BoundSetting::Data));
        assert_eq!(cfg.region.registration, Registration::Pixel);
        assert_eq!(cfg.seed_kernel, SeedKernel::Gaussian);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_roundtrip_serialization() {
        let mut cfg = SurfaceConfig::new(region());
        cfg.lower = Some(BoundSetting::Data);
        cfg.convergence = ConvergenceLimit::Absolute(0.01);
        cfg.tension.interior = 0.09144729709272083;
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2: SurfaceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.tension.interior, 0.09144729709272083);
        assert_eq!(cfg2.lower, Some(BoundSetting::Data));
        assert_eq!(cfg2.convergence, ConvergenceLimit::Absolute(0.01));
        assert_eq!(cfg2.max_iterations, cfg.max_iterations);
    }

    #[test]
    fn test_rejects_out_of_range_tuning() {
        let mut cfg = SurfaceConfig::new(region());
        cfg.tension.interior = 1.5;
        assert!(matches!(cfg.validate(), Err(SurfaceError::ConfigError(_))));

        let mut cfg = SurfaceConfig::new(region());
        cfg.over_relaxation = 2.5;
        assert!(matches!(cfg.validate(), Err(SurfaceError::ConfigError(_))));

        let mut cfg = SurfaceConfig::new(region());
        cfg.region.x_inc = 0.0;
        assert!(matches!(cfg.validate(), Err(SurfaceError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let mut cfg = SurfaceConfig::new(region());
        cfg.region.x_max = 2.0;
        match cfg.validate() {
            Err(SurfaceError::GridTooSmall { nx, ny }) => {
                assert_eq!(nx, 3);
                assert_eq!(ny, 11);
            }
            other => panic!("expected GridTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn test_convergence_resolve() {
        assert!((ConvergenceLimit::PercentOfRms(0.1).resolve(50.0) - 0.05).abs() < 1e-15);
        assert!((ConvergenceLimit::Absolute(0.3).resolve(50.0) - 0.3).abs() < 1e-15);
    }

    #[test]
    fn test_epsilon_follows_increments() {
        let mut cfg = SurfaceConfig::new(region());
        cfg.region.y_inc = 0.5;
        cfg.region.y_max = 10.0;
        cfg.aspect_ratio = 0.5;
        assert!((cfg.epsilon() - 1.0).abs() < 1e-15);
    }
}
