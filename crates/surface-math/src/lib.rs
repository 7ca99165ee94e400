//! Numerical building blocks for SCPN Surface: stride scheduling, the
//! tension-blended biharmonic stencil, Briggs constraints, SOR relaxation,
//! bilinear refinement, plane fitting and the grid-size advisor.

pub mod advisor;
pub mod briggs;
pub mod factors;
pub mod interp;
pub mod linalg;
pub mod sor;
pub mod stencil;
