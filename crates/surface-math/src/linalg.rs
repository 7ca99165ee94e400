//! Least-squares plane z = c0 + c1·i + c2·j in node-index coordinates.

use log::warn;

/// Fitted plane. A degenerate fit is the zero plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaneTrend {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Relative determinant below which the normal equations are singular.
const SINGULAR_DET: f64 = 1e-12;

impl PlaneTrend {
    /// Horizontal plane at `z`.
    pub fn constant(z: f64) -> Self {
        PlaneTrend {
            c0: z,
            c1: 0.0,
            c2: 0.0,
        }
    }

    /// Solve the 3x3 normal equations by Cramer's rule.
    pub fn fit<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let (mut n, mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0, 0.0);
        let (mut sxx, mut syy, mut sxy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (x, y, z) in points {
            n += 1.0;
            sx += x;
            sy += y;
            sz += z;
            sxx += x * x;
            syy += y * y;
            sxy += x * y;
            sxz += x * z;
            syz += y * z;
        }

        let d = n * sxx * syy + 2.0 * sx * sy * sxy
            - n * sxy * sxy
            - sx * sx * syy
            - sy * sy * sxx;
        let scale = (n * sxx * syy).abs();
        if scale == 0.0 || d.abs() <= SINGULAR_DET * scale {
            warn!("plane fit is degenerate ({} samples); using the zero plane", n as usize);
            return PlaneTrend::default();
        }

        let a = sz * sxx * syy + sx * sxy * syz + sy * sxy * sxz
            - sz * sxy * sxy
            - sx * sxz * syy
            - sy * syz * sxx;
        let b = n * sxz * syy + sz * sy * sxy + sy * sx * syz
            - n * sxy * syz
            - sz * sx * syy
            - sy * sy * sxz;
        let c = n * sxx * syz + sx * sy * sxz + sz * sx * sxy
            - n * sxy * sxz
            - sx * sx * syz
            - sz * sy * sxx;

        PlaneTrend {
            c0: a / d,
            c1: b / d,
            c2: c / d,
        }
    }

    #[inline]
    pub fn evaluate(&self, i: f64, j: f64) -> f64 {
        self.c0 + self.c1 * i + self.c2 * j
    }

    pub fn is_zero(&self) -> bool {
        self.c0 == 0.0 && self.c1 == 0.0 && self.c2 == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_plane_recovered() {
        let pts: Vec<(f64, f64, f64)> = [(0.0, 0.0), (10.0, 0.0), (0.0, 7.0), (4.0, 3.0), (9.0, 6.5)]
            .iter()
            .map(|&(x, y)| (x, y, 3.0 - 0.5 * x + 2.0 * y))
            .collect();
        let p = PlaneTrend::fit(pts);
        assert!((p.c0 - 3.0).abs() < 1e-10);
        assert!((p.c1 + 0.5).abs() < 1e-10);
        assert!((p.c2 - 2.0).abs() < 1e-10);
        assert!((p.evaluate(2.0, 1.0) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_collinear_points_give_zero_plane() {
        let pts = (0..5).map(|k| (k as f64, 2.0 * k as f64, k as f64));
        assert!(PlaneTrend::fit(pts).is_zero());
    }

    #[test]
    fn test_single_point_is_degenerate() {
        assert!(PlaneTrend::fit([(3.0, 4.0, 9.0)]).is_zero());
    }

    #[test]
    fn test_least_squares_residuals_balance() {
        let pts: Vec<(f64, f64, f64)> = vec![
            (0.0, 0.0, 1.0),
            (4.0, 0.0, 2.0),
            (0.0, 4.0, 0.0),
            (4.0, 4.0, 5.0),
        ];
        let p = PlaneTrend::fit(pts.iter().copied());
        let resid_sum: f64 = pts.iter().map(|&(x, y, z)| z - p.evaluate(x, y)).sum();
        assert!(resid_sum.abs() < 1e-10);
    }
}
