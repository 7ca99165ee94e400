// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Grid-Size Advisor
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Relative cost model for the multigrid solve and a search for nearby
//! lattice dimensions that factor better.
//!
//! Cost is Σ over levels of nxg·nyg·L, where L is max(nxg, nyg) on the
//! coarsest level (iterations needed to propagate across it) and the
//! division factor on every later level.

use surface_types::constants::MAX_SUGGESTIONS;

use crate::factors::GridSchedule;

/// A candidate lattice predicted to solve faster than the requested one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSuggestion {
    /// Node counts.
    pub nx: usize,
    pub ny: usize,
    /// Requested cost / candidate cost; always > 1.
    pub speedup: f64,
}

/// Relative cost for an nx × ny node lattice.
pub fn estimate_cost(nx: usize, ny: usize) -> f64 {
    let schedule = GridSchedule::new(nx, ny);
    let mut cost = 0.0;
    for (k, (&grid, &factor)) in schedule
        .levels()
        .iter()
        .zip(schedule.divisors())
        .enumerate()
    {
        let (nxg, nyg) = schedule.block_dims(grid);
        let work = if k == 0 { nxg.max(nyg) } else { factor };
        cost += (nxg * nyg * work) as f64;
    }
    cost
}

/// Interval counts in [n, 2n] whose only prime factors are 2, 3 and 5.
fn smooth_counts(n: usize) -> Vec<usize> {
    let hi = 2 * n;
    let mut out = Vec::new();
    let mut p2 = 1;
    while p2 <= hi {
        let mut p3 = p2;
        while p3 <= hi {
            let mut p5 = p3;
            while p5 <= hi {
                if p5 >= n {
                    out.push(p5);
                }
                p5 *= 5;
            }
            p3 *= 3;
        }
        p2 *= 2;
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Up to `MAX_SUGGESTIONS` larger lattices predicted cheaper than nx × ny,
/// fastest first. Candidates have 2^a·3^b·5^c intervals per side, within
/// one to two times the requested intervals. An empty list is normal.
pub fn suggest_dimensions(nx: usize, ny: usize) -> Vec<GridSuggestion> {
    let users_cost = estimate_cost(nx, ny);
    let xs = smooth_counts(nx.saturating_sub(1).max(1));
    let ys = smooth_counts(ny.saturating_sub(1).max(1));

    let mut hints: Vec<GridSuggestion> = Vec::new();
    for &mx in &xs {
        for &my in &ys {
            let (cnx, cny) = (mx + 1, my + 1);
            if cnx == nx && cny == ny {
                continue;
            }
            let cost = estimate_cost(cnx, cny);
            if cost < users_cost {
                hints.push(GridSuggestion {
                    nx: cnx,
                    ny: cny,
                    speedup: users_cost / cost,
                });
            }
        }
    }

    // Fastest first; ties go to the smaller lattice.
    hints.sort_by(|a, b| {
        b.speedup
            .total_cmp(&a.speedup)
            .then((a.nx * a.ny).cmp(&(b.nx * b.ny)))
    });
    hints.truncate(MAX_SUGGESTIONS);
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_single_level() {
        // 18 x 20 runs only at stride 1: 18*20*max(18,20)
        assert_eq!(estimate_cost(18, 20), (18 * 20 * 20) as f64);
    }

    #[test]
    fn test_cost_multilevel() {
        // 13 x 13: strides 4, 2, 1 -> 4x4 (L=4), 7x7 (f=2), 13x13 (f=2)
        let expected = 4 * 4 * 4 + 7 * 7 * 2 + 13 * 13 * 2;
        assert_eq!(estimate_cost(13, 13), expected as f64);
    }

    #[test]
    fn test_smooth_counts() {
        assert_eq!(smooth_counts(17), vec![18, 20, 24, 25, 27, 30, 32]);
    }

    #[test]
    fn test_prime_dimensions_get_suggestions() {
        let hints = suggest_dimensions(18, 20);
        assert!(!hints.is_empty());
        assert!(hints.len() <= MAX_SUGGESTIONS);
        for w in hints.windows(2) {
            assert!(w[0].speedup >= w[1].speedup);
        }
        for h in &hints {
            assert!(h.speedup > 1.0);
            assert!(h.nx >= 18 && h.nx <= 35);
            assert!(h.ny >= 20 && h.ny <= 39);
        }
    }
}
