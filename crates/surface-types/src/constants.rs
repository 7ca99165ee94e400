// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Smallest lattice (per side) the 12-point stencil can be applied to.
pub const MIN_NODES_PER_SIDE: usize = 4;

/// Ghost margin around the node array, in finest-resolution nodes.
pub const GRID_PADDING: usize = 2;

/// Default SOR sweep cap per resolution level.
pub const DEFAULT_MAX_ITERATIONS: usize = 250;

/// Default over-relaxation factor.
pub const DEFAULT_OVER_RELAXATION: f64 = 1.4;

/// Default convergence limit, percent of the detrended sample RMS.
pub const DEFAULT_CONVERGENCE_PERCENT: f64 = 0.1;

/// Default snap tolerance as a fraction of the smaller current cell size.
pub const DEFAULT_SNAP_FRACTION: f64 = 0.05;

/// Detrended RMS below which the data are treated as exactly planar.
pub const PLANAR_RMS_LIMIT: f64 = 1e-8;

/// Relative tolerance for "whole number of increments" region checks.
pub const REGION_SLOP: f64 = 1e-6;

/// Number of grid-size hints reported by the advisor.
pub const MAX_SUGGESTIONS: usize = 10;
