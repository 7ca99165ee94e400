// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Property-Based Tests (proptest) for surface-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for surface-math using proptest.
//!
//! Covers: stride schedule, stencil normalisation, Briggs consistency,
//! SOR sweeps under bounds, plane fitting, grid-size advice.

use ndarray::Array2;
use proptest::prelude::*;
use surface_math::advisor::{estimate_cost, suggest_dimensions};
use surface_math::briggs::BriggsCoefficients;
use surface_math::factors::GridSchedule;
use surface_math::linalg::PlaneTrend;
use surface_math::sor::{sor_sweep, SweepContext};
use surface_math::stencil::{BoundaryConstants, StencilCoefficients, StencilTable};
use surface_types::state::{NodeBounds, NodeStatus, PaddedGrid};

// ── Schedule Properties ──────────────────────────────────────────────

proptest! {
    /// Strides strictly decrease, divide their predecessor and end at 1.
    #[test]
    fn schedule_divides_down_to_one(nx in 4usize..600, ny in 4usize..600) {
        let s = GridSchedule::new(nx, ny);
        let levels = s.levels();
        prop_assert_eq!(*levels.last().unwrap(), 1);
        for w in levels.windows(2) {
            prop_assert!(w[1] < w[0]);
            prop_assert_eq!(w[0] % w[1], 0);
        }
        prop_assert_eq!((nx - 1) % levels[0], 0);
        prop_assert_eq!((ny - 1) % levels[0], 0);
    }

    /// The coarsest lattice has at least 4 nodes per side unless the run
    /// is single-level.
    #[test]
    fn coarsest_lattice_large_enough(nx in 4usize..600, ny in 4usize..600) {
        let s = GridSchedule::new(nx, ny);
        if s.coarsest() > 1 {
            let (bnx, bny) = s.block_dims(s.coarsest());
            prop_assert!(bnx >= 4 && bny >= 4);
        }
    }
}

// ── Stencil and Briggs Properties ────────────────────────────────────

proptest! {
    /// Free weights sum to 1 and constrained weights to the normaliser.
    #[test]
    fn stencil_normalisation(t in 0.0f64..1.0, eps in 0.2f64..5.0) {
        let c = StencilCoefficients::new(t, eps);
        let free: f64 = c.free.iter().sum();
        let constrained: f64 = c.constrained.iter().sum();
        prop_assert!((free - 1.0).abs() < 1e-10);
        prop_assert!((constrained - c.a0_const_1).abs() < 1e-10 * (1.0 + c.a0_const_1));
    }

    /// A constant field satisfies every Briggs relation.
    #[test]
    fn briggs_constant_consistency(
        dx in -0.5f64..0.5,
        dy in -0.5f64..0.5,
        z in -100.0f64..100.0,
        eps in 0.3f64..3.0,
    ) {
        prop_assume!(dx.abs() + dy.abs() > 1e-3);
        let c = BriggsCoefficients::new(dx, dy, z, eps * eps);
        let b = c.b;
        let lhs = b[4] * z;
        let rhs = (b[0] + b[1] + b[2] + b[3]) * z + b[5];
        prop_assert!((lhs - rhs).abs() < 1e-8 * (1.0 + lhs.abs()));
    }
}

// ── SOR Sweep Properties ─────────────────────────────────────────────

proptest! {
    /// Sweeps never leave the bounds and never produce NaN.
    #[test]
    fn sweep_respects_bounds(
        n in 5usize..20,
        tension in 0.0f64..1.0,
        spike in 1.0f64..50.0,
        lo in -2.0f64..0.0,
        hi in 0.0f64..2.0,
    ) {
        let coeffs = StencilCoefficients::new(tension, 1.0);
        let boundary = BoundaryConstants::new(tension, 1.0);
        let table = StencilTable::new(1);
        let mut status = Array2::from_elem((n, n), NodeStatus::Free);
        status[[n / 2, n / 2]] = NodeStatus::Fixed;
        let bounds = NodeBounds {
            lower: Some(Array2::from_elem((n, n), lo)),
            upper: Some(Array2::from_elem((n, n), hi)),
        };
        let ctx = SweepContext {
            coeffs: &coeffs,
            boundary: &boundary,
            table: &table,
            status: &status,
            briggs: &[],
            bounds: &bounds,
            omega: 1.4,
        };
        let mut grid = PaddedGrid::try_new(n, n).unwrap();
        grid.set_node(n / 2, n / 2, spike);
        for _ in 0..10 {
            let change = sor_sweep(&mut grid, &ctx);
            prop_assert!(change.is_finite());
            for ((j, i), &v) in grid.nodes().indexed_iter() {
                if i == n / 2 && j == n / 2 {
                    prop_assert_eq!(v, spike);
                } else {
                    prop_assert!(v >= lo && v <= hi, "node ({}, {}) = {}", i, j, v);
                }
            }
        }
    }
}

// ── Plane Fit Properties ─────────────────────────────────────────────

proptest! {
    /// Samples drawn from a plane give back that plane.
    #[test]
    fn plane_fit_exact(
        c0 in -50.0f64..50.0,
        c1 in -5.0f64..5.0,
        c2 in -5.0f64..5.0,
    ) {
        let pts: Vec<(f64, f64, f64)> = (0..20)
            .map(|k| {
                let x = (k % 5) as f64 * 3.0;
                let y = (k / 5) as f64 * 2.0 + 0.1 * k as f64;
                (x, y, c0 + c1 * x + c2 * y)
            })
            .collect();
        let p = PlaneTrend::fit(pts);
        prop_assert!((p.c0 - c0).abs() < 1e-7);
        prop_assert!((p.c1 - c1).abs() < 1e-8);
        prop_assert!((p.c2 - c2).abs() < 1e-8);
    }
}

// ── Advisor Properties ───────────────────────────────────────────────

proptest! {
    /// Every suggestion is cheaper than the request and lies in range.
    #[test]
    fn suggestions_are_cheaper(nx in 4usize..120, ny in 4usize..120) {
        let users = estimate_cost(nx, ny);
        let hints = suggest_dimensions(nx, ny);
        prop_assert!(hints.len() <= 10);
        for h in &hints {
            prop_assert!(estimate_cost(h.nx, h.ny) < users);
            prop_assert!(h.nx >= nx && h.nx - 1 <= 2 * (nx - 1));
            prop_assert!(h.ny >= ny && h.ny - 1 <= 2 * (ny - 1));
        }
    }
}
