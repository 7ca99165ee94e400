//! Soft breaklines: polylines turned into extra samples.
//!
//! Non-finite vertices are skipped and each segment is clipped to the
//! lattice footprint, then densified so consecutive vertices are at most
//! one finest-node spacing apart along each axis. The vertices are then
//! thinned to the one nearest each finest node.

use surface_types::state::GridGeometry;

use crate::points::CellIndexer;

type Vertex = (f64, f64, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Breakline {
    /// (x, y, z) vertices in order.
    pub vertices: Vec<Vertex>,
}

impl Breakline {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Breakline { vertices }
    }

    /// A breakline held at one elevation.
    pub fn with_constant_z(vertices: &[(f64, f64)], z: f64) -> Self {
        Breakline {
            vertices: vertices.iter().map(|&(x, y)| (x, y, z)).collect(),
        }
    }

    /// Vertices inside the lattice footprint (half a node beyond the outer
    /// nodes) with linear interpolation inserted between the originals.
    pub fn densify(&self, geometry: &GridGeometry) -> Vec<Vertex> {
        let (dx, dy) = (geometry.x_inc, geometry.y_inc);
        let footprint = (
            geometry.x0() - 0.5 * dx,
            geometry.x0() + (geometry.nx as f64 - 0.5) * dx,
            geometry.y0() - 0.5 * dy,
            geometry.y0() + (geometry.ny as f64 - 0.5) * dy,
        );
        let finite: Vec<Vertex> = self
            .vertices
            .iter()
            .copied()
            .filter(|&(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
            .collect();

        let mut out: Vec<Vertex> = Vec::with_capacity(finite.len());
        if let [only] = finite.as_slice() {
            out.push(*only);
        }
        for pair in finite.windows(2) {
            let Some((a, b)) = clip_segment(pair[0], pair[1], footprint) else {
                continue;
            };
            if out.last() != Some(&a) {
                out.push(a);
            }
            let steps = ((b.0 - a.0).abs() / dx)
                .max((b.1 - a.1).abs() / dy)
                .ceil()
                .max(1.0) as usize;
            for k in 1..=steps {
                let t = k as f64 / steps as f64;
                out.push((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1), a.2 + t * (b.2 - a.2)));
            }
        }
        out
    }
}

/// Liang-Barsky clip of segment a-b to (x_lo, x_hi, y_lo, y_hi), with z
/// interpolated along.
fn clip_segment(
    a: Vertex,
    b: Vertex,
    (x_lo, x_hi, y_lo, y_hi): (f64, f64, f64, f64),
) -> Option<(Vertex, Vertex)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a.0 - x_lo), (dx, x_hi - a.0), (-dy, a.1 - y_lo), (dy, y_hi - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    let at = |t: f64| (a.0 + t * dx, a.1 + t * dy, a.2 + t * (b.2 - a.2));
    Some((at(t0), at(t1)))
}

/// Densify all breaklines and keep the vertex nearest each finest node.
/// Vertices off the lattice or with non-finite values are dropped.
pub fn breakline_samples(lines: &[Breakline], geometry: &GridGeometry) -> Vec<Vertex> {
    let indexer = CellIndexer::new(geometry, 1);
    let mut tagged: Vec<(usize, f64, Vertex)> = lines
        .iter()
        .flat_map(|line| line.densify(geometry))
        .filter(|&(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
        .filter_map(|p| {
            let (bi, bj) = indexer.locate(p.0, p.1)?;
            let id = indexer.cell_id(bi, bj);
            let (nx, ny) = indexer.node_xy(id);
            let d2 = (p.0 - nx).powi(2) + (p.1 - ny).powi(2);
            Some((id, d2, p))
        })
        .collect();

    tagged.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    tagged.dedup_by(|later, kept| later.0 == kept.0);
    tagged.into_iter().map(|(_, _, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use surface_types::config::{GridRegion, Registration};

    fn geometry() -> GridGeometry {
        GridGeometry::from_region(&GridRegion {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
            x_inc: 1.0,
            y_inc: 1.0,
            registration: Registration::Gridline,
        })
        .unwrap()
    }

    #[test]
    fn test_densify_spacing() {
        let line = Breakline::new(vec![(0.0, 0.0, 0.0), (4.0, 1.0, 8.0)]);
        let pts = line.densify(&geometry());
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[2], (2.0, 0.5, 4.0));
        for w in pts.windows(2) {
            assert!((w[1].0 - w[0].0).abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_one_vertex_per_node() {
        let g = geometry();
        // Dense diagonal hits every node along it exactly once
        let line = Breakline::with_constant_z(&[(0.0, 0.0), (5.0, 5.0), (5.2, 5.1)], 3.0);
        let pts = breakline_samples(&[line], &g);
        assert_eq!(pts.len(), 6);
        assert!(pts.iter().all(|p| p.2 == 3.0));
        assert!(pts.contains(&(5.0, 5.0, 3.0)));
    }

    #[test]
    fn test_off_lattice_vertices_dropped() {
        let g = geometry();
        let line = Breakline::new(vec![(-5.0, 5.0, 1.0), (2.0, 5.0, 1.0)]);
        let pts = breakline_samples(&[line], &g);
        assert!(pts.iter().all(|p| p.0 >= -0.5));
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn test_far_vertex_clipped_to_lattice() {
        let g = geometry();
        let line = Breakline::new(vec![(0.0, 5.0, 2.0), (1e12, 5.0, 2.0)]);
        let dense = line.densify(&g);
        assert!(dense.len() <= 16, "{} vertices", dense.len());
        let pts = breakline_samples(&[line], &g);
        assert_eq!(pts.len(), 11);
        assert!(pts.iter().all(|p| p.1 == 5.0 && p.2 == 2.0));
    }

    #[test]
    fn test_non_finite_vertex_skipped() {
        let g = geometry();
        let line = Breakline::new(vec![
            (0.0, 5.0, 1.0),
            (f64::INFINITY, 5.0, 1.0),
            (f64::NAN, 2.0, 1.0),
            (3.0, 3.0, 1.0),
        ]);
        let pts = breakline_samples(&[line], &g);
        assert_eq!(pts.len(), 4);
        assert!(pts.contains(&(0.0, 5.0, 1.0)));
        assert!(pts.contains(&(3.0, 3.0, 1.0)));
    }

    #[test]
    fn test_segment_outside_lattice_ignored() {
        let g = geometry();
        let line = Breakline::new(vec![(20.0, 0.0, 1.0), (20.0, 10.0, 1.0)]);
        assert!(line.densify(&g).is_empty());
    }
}
