// ─────────────────────────────────────────────────────────────────────
// SCPN Surface — Grid-Factor Scheduler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coarse-to-fine stride sequence for the multigrid driver.
//!
//! The coarsest stride is gcd(nx-1, ny-1). Every refinement divides the
//! current stride by its largest remaining prime factor, so each term
//! divides the one before it and the sequence always ends at 1.

use surface_types::constants::MIN_NODES_PER_SIDE;

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Prime factors of `n` in ascending order, with multiplicity.
/// Returns an empty vector for n < 2.
pub fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    while n % 2 == 0 {
        factors.push(2);
        n /= 2;
    }
    let mut p = 3;
    while p * p <= n {
        while n % p == 0 {
            factors.push(p);
            n /= p;
        }
        p += 2;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Nodes per side of the lattice seen at stride `grid`.
#[inline]
pub fn block_dims(nx: usize, ny: usize, grid: usize) -> (usize, usize) {
    ((nx - 1) / grid + 1, (ny - 1) / grid + 1)
}

/// Stride sequence for an nx × ny node lattice.
#[derive(Debug, Clone)]
pub struct GridSchedule {
    nx: usize,
    ny: usize,
    levels: Vec<usize>,
    /// Division factor applied to reach each level; 1 for the first.
    divisors: Vec<usize>,
}

impl GridSchedule {
    /// Build the schedule. Both dimensions must be at least 2.
    pub fn new(nx: usize, ny: usize) -> Self {
        let mut grid = gcd(nx.saturating_sub(1), ny.saturating_sub(1)).max(1);
        let mut factors = prime_factors(grid);

        // Coarsest level must still see a 4x4 lattice.
        loop {
            let (bnx, bny) = block_dims(nx, ny, grid);
            if grid == 1 || (bnx >= MIN_NODES_PER_SIDE && bny >= MIN_NODES_PER_SIDE) {
                break;
            }
            grid = smart_divide(grid, &mut factors).0;
        }

        let mut levels = vec![grid];
        let mut divisors = vec![1];
        while grid > 1 {
            let (next, factor) = smart_divide(grid, &mut factors);
            grid = next;
            levels.push(grid);
            divisors.push(factor);
        }

        GridSchedule {
            nx,
            ny,
            levels,
            divisors,
        }
    }

    /// Strides from coarsest to finest.
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Factor each level's stride was divided by; the first entry is 1.
    pub fn divisors(&self) -> &[usize] {
        &self.divisors
    }

    pub fn coarsest(&self) -> usize {
        self.levels[0]
    }

    /// True when nx-1 and ny-1 share no factor and the whole run happens
    /// at full resolution.
    pub fn is_single_level(&self) -> bool {
        self.levels.len() == 1
    }

    pub fn block_dims(&self, grid: usize) -> (usize, usize) {
        block_dims(self.nx, self.ny, grid)
    }
}

/// Divide by the largest remaining factor. Returns (new stride, divisor).
fn smart_divide(grid: usize, factors: &mut Vec<usize>) -> (usize, usize) {
    match factors.pop() {
        Some(f) => (grid / f, f),
        None => (1, grid),
    }
}
