//! Skeletal handles and domain normalization

use bbw_core::{Error, Point3d, Result, Vector3d};
use std::collections::BTreeMap;

/// Ordered mapping from handle name to position in the `[0,1]³` domain.
///
/// The iteration order of the map fixes each handle's global index, which
/// bone-mode solving uses to place remapped weights.
pub type HandleMap = BTreeMap<String, Point3d>;

/// Parent joint name → child joint name; each pair defines one bone
pub type BoneMap = BTreeMap<String, String>;

/// Similarity transform packing an arbitrary vertex set into the unit cube.
///
/// The grid domain is implicitly `[0,1]³`, so mesh vertices, joints, and
/// query points must all go through the same normalization before
/// voxelization and querying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPacking {
    pub scale: f64,
    pub center: Point3d,
}

impl UnitPacking {
    /// Fit the transform to a vertex set: uniform scale `0.95 / max_extent`
    /// about the bounding-box center, recentered at `(0.5, 0.5, 0.5)`.
    pub fn fit(vertices: &[Point3d]) -> Result<Self> {
        let first = vertices
            .first()
            .ok_or_else(|| Error::InvalidData("cannot fit unit packing to no vertices".into()))?;
        let mut bmin = *first;
        let mut bmax = *first;
        for v in &vertices[1..] {
            bmin = bmin.coords.inf(&v.coords).into();
            bmax = bmax.coords.sup(&v.coords).into();
        }
        let extent = bmax - bmin;
        let scale = 0.95 / extent.max();
        if !scale.is_finite() {
            return Err(Error::InvalidData(
                "vertex set has zero extent along every axis".into(),
            ));
        }
        Ok(Self {
            scale,
            center: Point3d::from((bmin.coords + bmax.coords) / 2.0),
        })
    }

    /// Map one point into the unit-cube domain
    pub fn apply(&self, p: &Point3d) -> Point3d {
        Point3d::from(self.scale * (p - self.center) + Vector3d::new(0.5, 0.5, 0.5))
    }

    /// Map a whole vertex set into the unit-cube domain
    pub fn pack(&self, vertices: &[Point3d]) -> Vec<Point3d> {
        vertices.iter().map(|v| self.apply(v)).collect()
    }
}

/// Resolve a bone map against the handle set: global parent indices and
/// midpoint constraint locations, in bone-map order.
pub(crate) fn resolve_bones(
    handles: &HandleMap,
    bone_wise: &BoneMap,
) -> Result<(Vec<usize>, Vec<Point3d>)> {
    let index_of: BTreeMap<&str, usize> = handles
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut bones = Vec::with_capacity(bone_wise.len());
    let mut bone_locs = Vec::with_capacity(bone_wise.len());
    for (parent, child) in bone_wise {
        let parent_idx = *index_of.get(parent.as_str()).ok_or_else(|| {
            Error::ConstraintMismatch(format!("bone parent '{}' is not a handle", parent))
        })?;
        let parent_loc = handles[parent];
        let child_loc = *handles.get(child).ok_or_else(|| {
            Error::ConstraintMismatch(format!("bone child '{}' is not a handle", child))
        })?;
        bones.push(parent_idx);
        bone_locs.push(Point3d::from((parent_loc.coords + child_loc.coords) / 2.0));
    }
    Ok((bones, bone_locs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_packing_fits_unit_cube() {
        let vertices = vec![
            Point3d::new(-2.0, 0.0, 1.0),
            Point3d::new(2.0, 1.0, 1.5),
            Point3d::new(0.0, -1.0, 2.0),
        ];
        let packing = UnitPacking::fit(&vertices).unwrap();
        let packed = packing.pack(&vertices);
        for p in &packed {
            assert!(p.x >= 0.0 && p.x <= 1.0);
            assert!(p.y >= 0.0 && p.y <= 1.0);
            assert!(p.z >= 0.0 && p.z <= 1.0);
        }
        // widest axis spans 0.95, centered
        let xs: Vec<f64> = packed.iter().map(|p| p.x).collect();
        let span = xs.iter().cloned().fold(f64::MIN, f64::max)
            - xs.iter().cloned().fold(f64::MAX, f64::min);
        assert_relative_eq!(span, 0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_packing_degenerate_input() {
        assert!(UnitPacking::fit(&[]).is_err());
        let same = vec![Point3d::new(1.0, 1.0, 1.0); 3];
        assert!(UnitPacking::fit(&same).is_err());
    }

    #[test]
    fn test_resolve_bones() {
        let mut handles = HandleMap::new();
        handles.insert("hip".into(), Point3d::new(0.5, 0.25, 0.5));
        handles.insert("knee".into(), Point3d::new(0.5, 0.75, 0.5));
        let mut bone_wise = BoneMap::new();
        bone_wise.insert("hip".into(), "knee".into());

        let (bones, locs) = resolve_bones(&handles, &bone_wise).unwrap();
        assert_eq!(bones, vec![0]);
        assert_relative_eq!(locs[0].y, 0.5);

        bone_wise.insert("knee".into(), "ankle".into());
        assert!(resolve_bones(&handles, &bone_wise).is_err());
    }
}
