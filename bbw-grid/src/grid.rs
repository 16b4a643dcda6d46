//! Box grid topology: compaction, adjacency, and point location
//!
//! A 3D grid of regular boxes over the unit cube. Some boxes are empty, so
//! the dense `res³` / `(res+1)³` index spaces are compacted into sequential
//! box and node ids covering only occupied cells and the corners touching
//! them.

use bbw_core::{Array3d, Error, Point3d, Result, Vector3d, WeightVector};
use rayon::prelude::*;

/// Sentinel id for empty cells and inactive corners in the dense arrays
pub(crate) const NO_ID: i32 = -1;

/// Compacted voxel grid with box/node adjacency and the solved weight field.
///
/// Lifecycle: [`BoxGrid::init_voxels`] fixes the geometry and compacts box
/// ids, [`BoxGrid::init_structure`] derives node ids, positions, and all
/// adjacency tables, then a weight solve fills the per-node field. The
/// structure is rebuilt wholesale for any new occupancy input, never mutated
/// incrementally.
#[derive(Debug, Clone)]
pub struct BoxGrid {
    pub(crate) size: [i32; 3],
    pub(crate) lower_left: Point3d,
    pub(crate) upper_right: Point3d,
    pub(crate) frac: Vector3d,
    pub(crate) box_array: Array3d<i32>,
    pub(crate) node_array: Array3d<i32>,
    pub(crate) nnz_boxes: i32,
    pub(crate) nnz_nodes: i32,
    pub(crate) nodes: Vec<Point3d>,
    pub(crate) box_positions: Vec<Point3d>,
    /// numBoxes x 8 node ids incident to a given box
    pub(crate) box_nodes: Vec<[i32; 8]>,
    /// numNodes x 6 node ids adjacent to a given node
    pub(crate) node_nodes: Vec<[i32; 6]>,
    /// numBoxes x 6 box ids adjacent to a given box
    pub(crate) box_boxes: Vec<[i32; 6]>,
    pub(crate) weights: Vec<WeightVector>,
}

impl BoxGrid {
    pub fn new() -> Self {
        Self {
            size: [0; 3],
            lower_left: Point3d::origin(),
            upper_right: Point3d::origin(),
            frac: Vector3d::zeros(),
            box_array: Array3d::default(),
            node_array: Array3d::default(),
            nnz_boxes: 0,
            nnz_nodes: 0,
            nodes: Vec::new(),
            box_positions: Vec::new(),
            box_nodes: Vec::new(),
            node_nodes: Vec::new(),
            box_boxes: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Fix the grid geometry to the unit cube and compact occupied cells.
    ///
    /// Cells are scanned in x→y→z order; every occupied cell receives the
    /// next sequential box id, so ids increase monotonically with scan order.
    ///
    /// # Arguments
    /// * `res` - Number of cells along each axis
    /// * `occupancy` - `res×res×res` grid of occupied flags
    pub fn init_voxels(&mut self, res: i32, occupancy: &Array3d<bool>) -> Result<()> {
        if res < 0 {
            return Err(Error::InvalidData(format!("negative resolution {}", res)));
        }
        if occupancy.size(0) != res || occupancy.size(1) != res || occupancy.size(2) != res {
            return Err(Error::ConstraintMismatch(format!(
                "occupancy grid is {}x{}x{}, expected {res}x{res}x{res}",
                occupancy.size(0),
                occupancy.size(1),
                occupancy.size(2)
            )));
        }

        self.size = [res, res, res];
        self.lower_left = Point3d::origin();
        self.upper_right = Point3d::new(1.0, 1.0, 1.0);
        self.frac = if res > 0 {
            (self.upper_right - self.lower_left) / res as f64
        } else {
            Vector3d::zeros()
        };
        self.box_array.resize(res, res, res, NO_ID);
        self.node_array.resize(res + 1, res + 1, res + 1, NO_ID);

        self.nnz_boxes = 0;
        for x in 0..res {
            for y in 0..res {
                for z in 0..res {
                    if occupancy[(x, y, z)] {
                        self.box_array[(x, y, z)] = self.nnz_boxes;
                        self.nnz_boxes += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Derive node ids, node positions, and all adjacency tables.
    ///
    /// A grid corner is active iff at least one of the up to 8 boxes sharing
    /// it is occupied: the candidate boxes have lower index `x-1` or `x`
    /// along each axis, clipped to the valid range.
    pub fn init_structure(&mut self) {
        let [xs, ys, zs] = self.size;

        self.node_array.fill(NO_ID);
        self.nnz_nodes = 0;
        for x in 0..xs + 1 {
            for y in 0..ys + 1 {
                for z in 0..zs + 1 {
                    let mut occupied_neighboring_box = false;
                    for dx in -1..1 {
                        for dy in -1..1 {
                            for dz in -1..1 {
                                if let Some(&id) = self.box_array.get(x + dx, y + dy, z + dz) {
                                    if id != NO_ID {
                                        occupied_neighboring_box = true;
                                    }
                                }
                            }
                        }
                    }
                    if occupied_neighboring_box {
                        self.node_array[(x, y, z)] = self.nnz_nodes;
                        self.nnz_nodes += 1;
                    }
                }
            }
        }

        self.nodes = vec![Point3d::origin(); self.nnz_nodes as usize];
        for x in 0..xs + 1 {
            for y in 0..ys + 1 {
                for z in 0..zs + 1 {
                    let id = self.node_array[(x, y, z)];
                    if id != NO_ID {
                        self.nodes[id as usize] = self.lower_left
                            + self
                                .frac
                                .component_mul(&Vector3d::new(x as f64, y as f64, z as f64));
                    }
                }
            }
        }

        // Neighbor slots are laid out (-x, -y, -z, +x, +y, +z); slots that
        // fall outside the grid or on an inactive corner keep the sentinel.
        self.node_nodes = vec![[NO_ID; 6]; self.nnz_nodes as usize];
        for x in 0..xs + 1 {
            for y in 0..ys + 1 {
                for z in 0..zs + 1 {
                    let id = self.node_array[(x, y, z)];
                    if id == NO_ID {
                        continue;
                    }
                    let mut k = 0;
                    for dw in [-1, 1] {
                        for (ox, oy, oz) in [(dw, 0, 0), (0, dw, 0), (0, 0, dw)] {
                            if let Some(&n) = self.node_array.get(x + ox, y + oy, z + oz) {
                                self.node_nodes[id as usize][k] = n;
                            }
                            k += 1;
                        }
                    }
                }
            }
        }

        // Corner slot c uses bit 2 for the x offset, bit 1 for y, bit 0 for
        // z; bit clear means the low side of the box.
        self.box_nodes = vec![[NO_ID; 8]; self.nnz_boxes as usize];
        for x in 0..xs {
            for y in 0..ys {
                for z in 0..zs {
                    let id = self.box_array[(x, y, z)];
                    if id == NO_ID {
                        continue;
                    }
                    let mut c = 0;
                    for dx in 0..2 {
                        for dy in 0..2 {
                            for dz in 0..2 {
                                self.box_nodes[id as usize][c] =
                                    self.node_array[(x + dx, y + dy, z + dz)];
                                c += 1;
                            }
                        }
                    }
                }
            }
        }

        self.box_boxes = vec![[NO_ID; 6]; self.nnz_boxes as usize];
        for x in 0..xs {
            for y in 0..ys {
                for z in 0..zs {
                    let id = self.box_array[(x, y, z)];
                    if id == NO_ID {
                        continue;
                    }
                    let mut k = 0;
                    for dw in [-1, 1] {
                        for (ox, oy, oz) in [(dw, 0, 0), (0, dw, 0), (0, 0, dw)] {
                            if let Some(&n) = self.box_array.get(x + ox, y + oy, z + oz) {
                                self.box_boxes[id as usize][k] = n;
                            }
                            k += 1;
                        }
                    }
                }
            }
        }
    }

    /// Compute every box position as the isobarycenter of its 8 corners.
    ///
    /// Pure per-box reduction over immutable node positions, so the boxes
    /// are processed in parallel.
    pub fn compute_box_positions(&mut self) {
        let nodes = &self.nodes;
        self.box_positions = self
            .box_nodes
            .par_iter()
            .map(|corners| {
                let mut sum = Vector3d::zeros();
                for &id in corners {
                    sum += nodes[id as usize].coords;
                }
                Point3d::from(sum * 0.125)
            })
            .collect();
    }

    /// Number of active nodes
    pub fn num_nodes(&self) -> usize {
        self.nnz_nodes as usize
    }

    /// Number of occupied boxes
    pub fn num_boxes(&self) -> usize {
        self.nnz_boxes as usize
    }

    /// World position of an active node
    pub fn node_position(&self, id_node: usize) -> Point3d {
        self.nodes[id_node]
    }

    /// Isobarycenter of an occupied box; requires
    /// [`BoxGrid::compute_box_positions`]
    pub fn box_position(&self, id_box: usize) -> Point3d {
        self.box_positions[id_box]
    }

    /// Node id at corner slot `c ∈ [0, 8)` of a box
    pub fn box_node(&self, id_box: usize, c: usize) -> usize {
        self.box_nodes[id_box][c] as usize
    }

    /// Neighboring node in slot `k ∈ [0, 6)`, if present
    pub fn node_neighbor(&self, id_node: usize, k: usize) -> Option<usize> {
        match self.node_nodes[id_node][k] {
            NO_ID => None,
            n => Some(n as usize),
        }
    }

    /// Neighboring box in slot `k ∈ [0, 6)`, if present
    pub fn box_neighbor(&self, id_box: usize, k: usize) -> Option<usize> {
        match self.box_boxes[id_box][k] {
            NO_ID => None,
            n => Some(n as usize),
        }
    }

    /// Solved weight vector of a node
    pub fn node_weights(&self, id_node: usize) -> &WeightVector {
        &self.weights[id_node]
    }

    /// Solved weight of one handle at one node
    pub fn weight(&self, id_handle: usize, id_node: usize) -> f64 {
        self.weights[id_node].coord(id_handle)
    }

    pub(crate) fn domain_contains(&self, p: &Point3d) -> bool {
        p.x >= self.lower_left.x
            && p.y >= self.lower_left.y
            && p.z >= self.lower_left.z
            && p.x <= self.upper_right.x
            && p.y <= self.upper_right.y
            && p.z <= self.upper_right.z
    }

    fn cell_of(&self, p: &Point3d) -> Result<([i32; 3], Vector3d)> {
        if !self.domain_contains(p) {
            return Err(Error::OutOfDomain(format!(
                "({}, {}, {}) is outside the voxel grid",
                p.x, p.y, p.z
            )));
        }
        let float_indices = (p - self.lower_left).component_div(&self.frac);
        let int_indices = [
            float_indices.x.floor() as i32,
            float_indices.y.floor() as i32,
            float_indices.z.floor() as i32,
        ];
        if !self
            .box_array
            .valid_indices(int_indices[0], int_indices[1], int_indices[2])
        {
            return Err(Error::OutOfDomain(format!(
                "({}, {}, {}) maps to no grid cell",
                p.x, p.y, p.z
            )));
        }
        let t = Vector3d::new(
            float_indices.x - int_indices[0] as f64,
            float_indices.y - int_indices[1] as f64,
            float_indices.z - int_indices[2] as f64,
        );
        Ok((int_indices, t))
    }

    /// Locate the occupied box containing `P` along with the fractional
    /// position of `P` inside it, each component in `[0, 1]`.
    pub fn box_containing_point(&self, p: &Point3d) -> Result<(usize, Vector3d)> {
        let (idx, t) = self.cell_of(p)?;
        match self.box_array[(idx[0], idx[1], idx[2])] {
            NO_ID => Err(Error::OutOfDomain(format!(
                "({}, {}, {}) falls in an unoccupied cell",
                p.x, p.y, p.z
            ))),
            id => Ok((id as usize, t)),
        }
    }

    /// Integer cell coordinates of the cell containing `P`, occupied or not
    pub fn box_coords_containing_point(&self, p: &Point3d) -> Result<[i32; 3]> {
        let (idx, _) = self.cell_of(p)?;
        Ok(idx)
    }

    /// The active node nearest to `P`: each axis rounds to the near corner
    /// of the containing cell (fraction ≤ 0.5 picks the low corner).
    pub fn node_closest_to_point(&self, p: &Point3d) -> Result<usize> {
        let (idx, t) = self.cell_of(p)?;
        let dx = if t.x <= 0.5 { 0 } else { 1 };
        let dy = if t.y <= 0.5 { 0 } else { 1 };
        let dz = if t.z <= 0.5 { 0 } else { 1 };
        match self.node_array[(idx[0] + dx, idx[1] + dy, idx[2] + dz)] {
            NO_ID => Err(Error::OutOfDomain(format!(
                "no active node near ({}, {}, {})",
                p.x, p.y, p.z
            ))),
            id => Ok(id as usize),
        }
    }
}

impl Default for BoxGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full_occupancy(res: i32) -> Array3d<bool> {
        Array3d::new(res, res, res, true)
    }

    fn structured(res: i32, occupancy: &Array3d<bool>) -> BoxGrid {
        let mut grid = BoxGrid::new();
        grid.init_voxels(res, occupancy).unwrap();
        grid.init_structure();
        grid
    }

    #[test]
    fn test_full_grid_counts() {
        let grid = structured(3, &full_occupancy(3));
        assert_eq!(grid.num_boxes(), 27);
        assert_eq!(grid.num_nodes(), 64);
    }

    #[test]
    fn test_box_ids_follow_scan_order() {
        let grid = structured(2, &full_occupancy(2));
        // z varies fastest, then y, then x
        assert_eq!(grid.box_array[(0, 0, 0)], 0);
        assert_eq!(grid.box_array[(0, 0, 1)], 1);
        assert_eq!(grid.box_array[(0, 1, 0)], 2);
        assert_eq!(grid.box_array[(1, 0, 0)], 4);
        assert_eq!(grid.box_array[(1, 1, 1)], 7);
    }

    #[test]
    fn test_every_box_has_eight_distinct_corners() {
        let grid = structured(3, &full_occupancy(3));
        for b in 0..grid.num_boxes() {
            let mut ids: Vec<usize> = (0..8).map(|c| grid.box_node(b, c)).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 8, "box {} has duplicate corner nodes", b);
        }
    }

    #[test]
    fn test_single_voxel_activation() {
        let mut occupancy = Array3d::new(2, 2, 2, false);
        occupancy[(0, 0, 0)] = true;
        let grid = structured(2, &occupancy);
        assert_eq!(grid.num_boxes(), 1);
        // only the 8 corners of the occupied cell are active
        assert_eq!(grid.num_nodes(), 8);
        for c in 0..8 {
            assert!(grid.box_node(0, c) < 8);
        }
    }

    #[test]
    fn test_node_adjacency_symmetric() {
        let mut occupancy = Array3d::new(3, 3, 3, false);
        occupancy[(0, 0, 0)] = true;
        occupancy[(1, 0, 0)] = true;
        occupancy[(1, 1, 0)] = true;
        let grid = structured(3, &occupancy);
        for a in 0..grid.num_nodes() {
            for k in 0..6 {
                if let Some(b) = grid.node_neighbor(a, k) {
                    let back = (0..6).filter_map(|k2| grid.node_neighbor(b, k2));
                    assert!(
                        back.into_iter().any(|n| n == a),
                        "node {} lists {} but not vice versa",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_box_adjacency() {
        let mut occupancy = Array3d::new(2, 2, 2, false);
        occupancy[(0, 0, 0)] = true;
        occupancy[(1, 0, 0)] = true;
        let grid = structured(2, &occupancy);
        assert_eq!(grid.num_boxes(), 2);
        // +x slot of box 0 is box 1, -x slot of box 1 is box 0
        assert_eq!(grid.box_neighbor(0, 3), Some(1));
        assert_eq!(grid.box_neighbor(1, 0), Some(0));
        assert_eq!(grid.box_neighbor(0, 0), None);
    }

    #[test]
    fn test_node_positions() {
        let grid = structured(2, &full_occupancy(2));
        let id = grid.node_array[(1, 1, 1)];
        assert!(id != NO_ID);
        let p = grid.node_position(id as usize);
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 0.5);
        assert_relative_eq!(p.z, 0.5);
    }

    #[test]
    fn test_box_positions_are_isobarycenters() {
        let mut grid = structured(2, &full_occupancy(2));
        grid.compute_box_positions();
        let p = grid.box_position(0);
        assert_relative_eq!(p.x, 0.25);
        assert_relative_eq!(p.y, 0.25);
        assert_relative_eq!(p.z, 0.25);
    }

    #[test]
    fn test_box_containing_point() {
        let grid = structured(2, &full_occupancy(2));
        let (id, t) = grid
            .box_containing_point(&Point3d::new(0.25, 0.25, 0.75))
            .unwrap();
        assert_eq!(id as i32, grid.box_array[(0, 0, 1)]);
        assert_relative_eq!(t.x, 0.5);
        assert_relative_eq!(t.y, 0.5);
        assert_relative_eq!(t.z, 0.5);
    }

    #[test]
    fn test_point_outside_domain() {
        let grid = structured(2, &full_occupancy(2));
        for p in [
            Point3d::new(1.5, 0.5, 0.5),
            Point3d::new(-0.1, 0.5, 0.5),
            Point3d::new(0.5, 0.5, 2.0),
        ] {
            assert!(matches!(
                grid.box_containing_point(&p),
                Err(Error::OutOfDomain(_))
            ));
            assert!(grid.node_closest_to_point(&p).is_err());
        }
    }

    #[test]
    fn test_point_in_unoccupied_cell() {
        let mut occupancy = Array3d::new(2, 2, 2, false);
        occupancy[(0, 0, 0)] = true;
        let grid = structured(2, &occupancy);
        let p = Point3d::new(0.75, 0.75, 0.75);
        assert!(matches!(
            grid.box_containing_point(&p),
            Err(Error::OutOfDomain(_))
        ));
        // cell coordinates are still answerable for unoccupied cells
        assert_eq!(grid.box_coords_containing_point(&p).unwrap(), [1, 1, 1]);
    }

    #[test]
    fn test_node_closest_rounding() {
        let grid = structured(2, &full_occupancy(2));
        let low = grid.node_closest_to_point(&Point3d::new(0.2, 0.2, 0.2)).unwrap();
        assert_eq!(low as i32, grid.node_array[(0, 0, 0)]);
        let high = grid.node_closest_to_point(&Point3d::new(0.3, 0.3, 0.3)).unwrap();
        assert_eq!(high as i32, grid.node_array[(1, 1, 1)]);
    }

    #[test]
    fn test_empty_grid_is_degenerate() {
        let grid = structured(2, &Array3d::new(2, 2, 2, false));
        assert_eq!(grid.num_boxes(), 0);
        assert_eq!(grid.num_nodes(), 0);
        assert!(grid
            .box_containing_point(&Point3d::new(0.5, 0.5, 0.5))
            .is_err());
    }

    #[test]
    fn test_zero_resolution() {
        let mut grid = BoxGrid::new();
        grid.init_voxels(0, &Array3d::new(0, 0, 0, false)).unwrap();
        grid.init_structure();
        assert_eq!(grid.num_boxes(), 0);
        assert!(grid
            .box_containing_point(&Point3d::new(0.0, 0.0, 0.0))
            .is_err());
    }

    #[test]
    fn test_mismatched_occupancy_rejected() {
        let mut grid = BoxGrid::new();
        let occupancy = Array3d::new(2, 2, 2, true);
        assert!(matches!(
            grid.init_voxels(3, &occupancy),
            Err(Error::ConstraintMismatch(_))
        ));
    }
}
