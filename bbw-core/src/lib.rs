//! Core data structures for bounded biharmonic weight solving
//!
//! This crate provides the leaf types shared by the rest of the workspace:
//! a dense 3D array used for occupancy and id grids, the per-node weight
//! vector, and the common error type.

pub mod array3d;
pub mod error;
pub mod weights;

pub use array3d::*;
pub use error::*;
pub use weights::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Common result type for bbw operations
pub type Result<T> = std::result::Result<T, Error>;
