//! Lower/upper bound loading.

use ndarray::Array2;
use surface_types::config::BoundSetting;
use surface_types::error::{SurfaceError, SurfaceResult};
use surface_types::state::{GridGeometry, NodeBounds};

use crate::trend::Trend;

/// A lower or upper limit on the finished surface, data units.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Extreme of the input data (minimum for lower, maximum for upper).
    Data,
    Value(f64),
    /// Per-node limit, [ny, nx]. NaN leaves a node unbounded.
    Grid(Array2<f64>),
}

impl From<BoundSetting> for Bound {
    fn from(setting: BoundSetting) -> Self {
        match setting {
            BoundSetting::Data => Bound::Data,
            BoundSetting::Value(v) => Bound::Value(v),
        }
    }
}

/// Check a grid bound's footprint against the lattice.
pub fn check_shape(bound: &Bound, geometry: &GridGeometry) -> SurfaceResult<()> {
    if let Bound::Grid(g) = bound {
        let expected = (geometry.ny, geometry.nx);
        if g.dim() != expected {
            return Err(SurfaceError::ConstraintShape {
                expected,
                got: g.dim(),
            });
        }
    }
    Ok(())
}

/// Convert bounds to working units. `data_range` is the (min, max) of the
/// raw sample z.
pub fn load_bounds(
    lower: Option<&Bound>,
    upper: Option<&Bound>,
    geometry: &GridGeometry,
    data_range: (f64, f64),
    trend: &Trend,
) -> SurfaceResult<NodeBounds> {
    let lower = lower
        .map(|b| detrend_bound(b, data_range.0, geometry, trend))
        .transpose()?;
    let upper = upper
        .map(|b| detrend_bound(b, data_range.1, geometry, trend))
        .transpose()?;
    Ok(NodeBounds { lower, upper })
}

fn detrend_bound(
    bound: &Bound,
    data_extreme: f64,
    geometry: &GridGeometry,
    trend: &Trend,
) -> SurfaceResult<Array2<f64>> {
    check_shape(bound, geometry)?;
    let shape = (geometry.ny, geometry.nx);
    let out = match bound {
        Bound::Data => Array2::from_shape_fn(shape, |(j, i)| trend.to_working(i, j, data_extreme)),
        Bound::Value(v) => Array2::from_shape_fn(shape, |(j, i)| trend.to_working(i, j, *v)),
        Bound::Grid(g) => Array2::from_shape_fn(shape, |(j, i)| {
            let v = g[[j, i]];
            if v.is_nan() {
                f64::NAN
            } else {
                trend.to_working(i, j, v)
            }
        }),
    };
    Ok(out)
}
