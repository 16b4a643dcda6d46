//! Quadratic program solving capability for bbw
//!
//! The weight solve consumes its numerical backend through the
//! [`QuadraticProgramSolver`] trait, so the per-handle solve loop can run
//! against a mock in tests and against [`ClarabelSolver`] in production.
//! Solver values are created and dropped by the caller; there is no
//! process-wide solver environment.

pub mod backend;
pub mod qp;

pub use crate::backend::*;
pub use crate::qp::*;
