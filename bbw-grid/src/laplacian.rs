//! Discrete energy operators over the node graph

use crate::grid::{BoxGrid, NO_ID};
use sprs::{CsMat, TriMat};

impl BoxGrid {
    /// Graph Laplacian over active nodes: `-1` for every adjacency edge,
    /// valence on the diagonal. Symmetric positive semidefinite by
    /// construction; every row sums to zero.
    pub fn laplacian(&self) -> CsMat<f64> {
        let n = self.num_nodes();
        let mut triplets = TriMat::new((n, n));
        let mut valences = vec![0i64; n];
        for (v1, neighbors) in self.node_nodes.iter().enumerate() {
            for &v2 in neighbors {
                if v2 != NO_ID {
                    triplets.add_triplet(v1, v2 as usize, -1.0);
                    valences[v1] += 1;
                }
            }
        }
        for (v, &valence) in valences.iter().enumerate() {
            triplets.add_triplet(v, v, valence as f64);
        }
        triplets.to_csr()
    }

    /// Biharmonic operator `L² = L·L`, the fourth-order quadratic objective
    /// of the weight solve
    pub fn biharmonic(&self) -> CsMat<f64> {
        let l = self.laplacian();
        &l * &l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bbw_core::Array3d;

    fn full_grid(res: i32) -> BoxGrid {
        let mut grid = BoxGrid::new();
        grid.init_voxels(res, &Array3d::new(res, res, res, true))
            .unwrap();
        grid.init_structure();
        grid
    }

    fn row_sums(m: &CsMat<f64>) -> Vec<f64> {
        let mut sums = vec![0.0; m.rows()];
        for (&v, (row, _)) in m.iter() {
            sums[row] += v;
        }
        sums
    }

    #[test]
    fn test_laplacian_rows_sum_to_zero() {
        let grid = full_grid(2);
        let l = grid.laplacian();
        assert_eq!(l.rows(), 27);
        assert_eq!(l.cols(), 27);
        for s in row_sums(&l) {
            assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_laplacian_valences() {
        // single voxel: every one of its 8 corners has exactly 3 neighbors
        let mut occupancy = Array3d::new(1, 1, 1, false);
        occupancy[(0, 0, 0)] = true;
        let mut grid = BoxGrid::new();
        grid.init_voxels(1, &occupancy).unwrap();
        grid.init_structure();
        let l = grid.laplacian();
        for i in 0..8 {
            assert_relative_eq!(*l.get(i, i).unwrap(), 3.0);
        }
    }

    #[test]
    fn test_laplacian_symmetric() {
        let grid = full_grid(2);
        let l = grid.laplacian();
        for (&v, (row, col)) in l.iter() {
            assert_relative_eq!(*l.get(col, row).unwrap(), v);
        }
    }

    #[test]
    fn test_biharmonic_rows_sum_to_zero() {
        // L has zero row sums, so L² does as well
        let grid = full_grid(2);
        let l2 = grid.biharmonic();
        for s in row_sums(&l2) {
            assert_relative_eq!(s, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_grid_has_empty_operator() {
        let mut grid = BoxGrid::new();
        grid.init_voxels(2, &Array3d::new(2, 2, 2, false)).unwrap();
        grid.init_structure();
        assert_eq!(grid.laplacian().rows(), 0);
    }
}
