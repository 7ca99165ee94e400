//! Continuous-curvature gridding driver.
//!
//! Sample store, trend handling, constraint assignment, seeding,
//! breaklines, residual reporting and the multigrid kernel.

pub mod assign;
pub mod breakline;
pub mod constraints;
pub mod kernel;
pub mod points;
pub mod residual;
pub mod seed;
pub mod trend;
