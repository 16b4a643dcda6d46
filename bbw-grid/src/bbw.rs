//! Bounded biharmonic weight solving and interpolation
//!
//! One constrained quadratic program per handle: minimize the biharmonic
//! energy `xᵀL²x` subject to `Ax = b` (each handle pinned to its closest
//! node) and `0 ≤ x ≤ 1`. The per-handle solves run sequentially against a
//! caller-supplied solver.

use crate::grid::BoxGrid;
use crate::handles::{resolve_bones, BoneMap, HandleMap};
use bbw_core::{Error, Point3d, Result, WeightVector};
use bbw_solver::QuadraticProgramSolver;
use sprs::{CsMat, TriMat};

impl BoxGrid {
    /// Constraint matrix: one row per handle with a unit entry at the
    /// handle's closest active node
    fn handle_constraints(&self, locations: &[Point3d]) -> Result<CsMat<f64>> {
        let mut triplets = TriMat::new((locations.len(), self.num_nodes()));
        for (row, loc) in locations.iter().enumerate() {
            let id_node = self.node_closest_to_point(loc)?;
            triplets.add_triplet(row, id_node, 1.0);
        }
        Ok(triplets.to_csr())
    }

    /// Solve one bounded biharmonic program per constraint location and
    /// fill the per-node weight field, one coordinate per location.
    fn solve_field(
        &mut self,
        locations: &[Point3d],
        solver: &mut dyn QuadraticProgramSolver,
    ) -> Result<()> {
        let n = self.num_nodes();
        self.weights.clear();
        if n == 0 {
            log::warn!("no occupied voxels; skipping weight solve");
            return Ok(());
        }
        self.weights.resize(n, WeightVector::new());

        let l2 = self.biharmonic();
        let constraints = self.handle_constraints(locations)?;
        let m = locations.len();

        for j in 0..m {
            let mut b = vec![0.0; m];
            b[j] = 1.0;
            log::debug!("solving weights for handle {}/{}", j + 1, m);
            let x = match solver.solve_qp(&l2, None, &constraints, &b, true) {
                Ok(x) if x.len() == n => x,
                Ok(x) => {
                    self.weights.clear();
                    return Err(Error::Solver(format!(
                        "solver returned {} values for {} nodes",
                        x.len(),
                        n
                    )));
                }
                Err(e) => {
                    // a failed solve aborts the whole handle set
                    self.weights.clear();
                    return Err(e);
                }
            };
            for (node, &w) in self.weights.iter_mut().zip(&x) {
                node.push(w);
            }
        }
        for node in &mut self.weights {
            node.normalize();
        }
        Ok(())
    }

    /// Compute bounded biharmonic weights for a set of plain handles.
    ///
    /// After the solve every active node carries a weight vector with one
    /// coordinate per handle (in handle-map order), coordinates in `[0, 1]`
    /// summing to 1.
    pub fn compute_bbw(
        &mut self,
        handles: &HandleMap,
        solver: &mut dyn QuadraticProgramSolver,
    ) -> Result<()> {
        let locations: Vec<Point3d> = handles.values().copied().collect();
        self.solve_field(&locations, solver)
    }

    /// Compute bounded biharmonic weights for bone pairs.
    ///
    /// `bone_wise` maps a parent joint to its child joint; each bone is
    /// constrained at the segment midpoint. The solved per-bone coordinates
    /// are scattered into joint-count-sized vectors at each bone's parent
    /// index; joints that are nobody's parent stay zero. The remapped
    /// vectors have their sum declared as 1 rather than renormalized.
    pub fn compute_bone_bbw(
        &mut self,
        handles: &HandleMap,
        bone_wise: &BoneMap,
        solver: &mut dyn QuadraticProgramSolver,
    ) -> Result<()> {
        let (bones, bone_locs) = resolve_bones(handles, bone_wise)?;
        self.solve_field(&bone_locs, solver)?;

        let num_joints = handles.len();
        let mut remapped = vec![WeightVector::zeros(num_joints); self.weights.len()];
        for (j, &parent_idx) in bones.iter().enumerate() {
            for (node, solved) in remapped.iter_mut().zip(&self.weights) {
                node.set_coord(parent_idx, solved.coord(j));
            }
        }
        for node in &mut remapped {
            node.declare_normalized();
        }
        self.weights = remapped;
        Ok(())
    }

    /// Trilinearly interpolate the first `nb_weights` weight coordinates at
    /// an arbitrary point in the domain.
    ///
    /// The result is normalized to sum 1. Fails with `OutOfDomain` when the
    /// point lies outside the grid or in an unoccupied cell; the rest of the
    /// field is unaffected by such failures.
    pub fn interpolated_bbw(&self, p: &Point3d, nb_weights: usize) -> Result<WeightVector> {
        let (id_box, t) = match self.box_containing_point(p) {
            Ok(found) => found,
            Err(e) => {
                log::warn!(
                    "cannot create blend weights for point ({}, {}, {})",
                    p.x,
                    p.y,
                    p.z
                );
                return Err(e);
            }
        };
        if self.weights.len() != self.num_nodes() {
            return Err(Error::InvalidData(
                "weights have not been computed for this grid".into(),
            ));
        }
        let field_len = self.weights[self.box_node(id_box, 0)].len();
        if nb_weights > field_len {
            return Err(Error::ConstraintMismatch(format!(
                "{} weights requested but the field has {}",
                nb_weights, field_len
            )));
        }

        let mut interpolated = WeightVector::new();
        for j in 0..nb_weights {
            let mut wj = 0.0;
            for c in 0..8 {
                let id_node = self.box_node(id_box, c);
                // corner bit layout: bit 2 = x, bit 1 = y, bit 0 = z
                let mut alpha = 1.0;
                alpha *= if (c / 4) % 2 == 0 { 1.0 - t.x } else { t.x };
                alpha *= if (c / 2) % 2 == 0 { 1.0 - t.y } else { t.y };
                alpha *= if c % 2 == 0 { 1.0 - t.z } else { t.z };
                wj += alpha * self.weights[id_node].coord(j);
            }
            interpolated.push(wj);
        }
        interpolated.normalize();
        Ok(interpolated)
    }
}
