//! Dense 3D array used for occupancy and id grids

use std::ops::{Index, IndexMut};

/// A bounds-checked dense 3D buffer with deep-copy value semantics.
///
/// Indices are signed so that neighbor scans can probe offsets like `x - 1`
/// and reject them through [`Array3d::valid_indices`] instead of wrapping.
/// Cloning copies the underlying storage; two copies never alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array3d<T> {
    size: [i32; 3],
    data: Vec<T>,
}

impl<T: Clone> Array3d<T> {
    /// Create an array of the given dimensions with every cell set to `fill`
    pub fn new(x_size: i32, y_size: i32, z_size: i32, fill: T) -> Self {
        assert!(
            x_size >= 0 && y_size >= 0 && z_size >= 0,
            "array dimensions must be non-negative"
        );
        let len = (x_size as usize) * (y_size as usize) * (z_size as usize);
        Self {
            size: [x_size, y_size, z_size],
            data: vec![fill; len],
        }
    }

    /// Reallocate to new dimensions, discarding previous contents
    pub fn resize(&mut self, x_size: i32, y_size: i32, z_size: i32, fill: T) {
        *self = Self::new(x_size, y_size, z_size, fill);
    }

    /// Set every cell to `value`
    pub fn fill(&mut self, value: T) {
        for cell in &mut self.data {
            *cell = value.clone();
        }
    }
}

impl<T> Array3d<T> {
    /// Dimension along axis `0`, `1`, or `2`
    pub fn size(&self, axis: usize) -> i32 {
        self.size[axis]
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `(x, y, z)` addresses a cell inside the array
    pub fn valid_indices(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x < self.size[0] && y >= 0 && y < self.size[1] && z >= 0 && z < self.size[2]
    }

    /// Cell reference, or `None` when the indices fall outside the array
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&T> {
        if self.valid_indices(x, y, z) {
            Some(&self.data[self.offset(x, y, z)])
        } else {
            None
        }
    }

    fn offset(&self, x: i32, y: i32, z: i32) -> usize {
        (x + y * self.size[0] + z * self.size[0] * self.size[1]) as usize
    }
}

impl<T> Index<(i32, i32, i32)> for Array3d<T> {
    type Output = T;

    fn index(&self, (x, y, z): (i32, i32, i32)) -> &T {
        assert!(self.valid_indices(x, y, z), "array index out of bounds");
        &self.data[self.offset(x, y, z)]
    }
}

impl<T> IndexMut<(i32, i32, i32)> for Array3d<T> {
    fn index_mut(&mut self, (x, y, z): (i32, i32, i32)) -> &mut T {
        assert!(self.valid_indices(x, y, z), "array index out of bounds");
        let offset = self.offset(x, y, z);
        &mut self.data[offset]
    }
}
