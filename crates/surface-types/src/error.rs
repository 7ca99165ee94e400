use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Grid of {nx}x{ny} nodes is too small: at least 4x4 nodes are required")]
    GridTooSmall { nx: usize, ny: usize },

    #[error("Constraint grid dimension mismatch: expected {expected:?} (rows, cols), got {got:?}")]
    ConstraintShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("No usable data: {0}")]
    NoData(String),

    #[error("Solver diverged at grid factor {grid_factor}, iteration {iteration}")]
    SolverDiverged { grid_factor: usize, iteration: usize },

    #[error("Unable to allocate a lattice of {0} nodes")]
    Allocation(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
