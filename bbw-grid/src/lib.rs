//! Voxel grid topology and bounded biharmonic weight solving
//!
//! This crate turns a sparse voxel occupancy set into an indexed adjacency
//! graph of grid corners ("nodes") and cells ("boxes"), assembles the
//! discrete biharmonic energy over that graph, solves one constrained
//! quadratic program per skeletal handle, and answers trilinear
//! interpolation queries against the solved per-node weight field.
//!
//! The pipeline, in order:
//!
//! 1. [`BoxGrid::init_voxels`] — compact occupied cells into box ids
//! 2. [`BoxGrid::init_structure`] — activate corners, derive adjacency
//! 3. [`BoxGrid::compute_bbw`] / [`BoxGrid::compute_bone_bbw`] — solve
//! 4. [`BoxGrid::interpolated_bbw`] — query weights at arbitrary points

pub mod bbw;
pub mod grid;
pub mod handles;
pub mod laplacian;

pub use grid::*;
pub use handles::*;
