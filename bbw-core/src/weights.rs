//! Per-node blend weight storage

use serde::{Deserialize, Serialize};

/// An ordered list of per-handle weight coordinates plus their running sum.
///
/// Coordinates are appended one per handle as the solve loop progresses; the
/// running sum tracks appends but is deliberately left untouched by
/// [`WeightVector::set_coord`], which the bone-mode remap relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    coords: Vec<f64>,
    sum: f64,
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A vector of `len` zero coordinates
    pub fn zeros(len: usize) -> Self {
        Self {
            coords: vec![0.0; len],
            sum: 0.0,
        }
    }

    /// Append a coordinate and add it to the running sum
    pub fn push(&mut self, w: f64) {
        self.coords.push(w);
        self.sum += w;
    }

    /// Coordinate for handle slot `idx`
    pub fn coord(&self, idx: usize) -> f64 {
        self.coords[idx]
    }

    /// Overwrite the coordinate at `idx` without adjusting the running sum
    pub fn set_coord(&mut self, idx: usize, w: f64) {
        self.coords[idx] = w;
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// The running sum of coordinates as last declared
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Divide every coordinate by the running sum so they total 1.
    ///
    /// An all-zero vector is left unchanged rather than turned into NaNs.
    pub fn normalize(&mut self) {
        if self.sum == 0.0 {
            return;
        }
        for c in &mut self.coords {
            *c /= self.sum;
        }
        self.sum = 1.0;
    }

    /// Force the declared sum to 1 without dividing the coordinates
    pub fn declare_normalized(&mut self) {
        self.sum = 1.0;
    }
}
