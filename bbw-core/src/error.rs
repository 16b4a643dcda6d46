//! Error types for bbw

use thiserror::Error;

/// Main error type for bbw operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("point outside the voxel grid: {0}")]
    OutOfDomain(String),

    #[error("quadratic program failed: {0}")]
    Solver(String),

    #[error("constraint mismatch: {0}")]
    ConstraintMismatch(String),

    #[error("degenerate topology: {0}")]
    DegenerateTopology(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for bbw operations
pub type Result<T> = std::result::Result<T, Error>;
