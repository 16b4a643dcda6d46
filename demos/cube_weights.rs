//! Solve bone weights over a synthetic solid cube and sample the field.
//!
//! Mirrors the full pipeline a host would drive: occupancy grid → topology
//! build → bone-mode solve → per-vertex interpolation.

use bbw_core::{Array3d, Point3d};
use bbw_grid::{BoneMap, BoxGrid, HandleMap};
use bbw_solver::ClarabelSolver;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let res = 6;
    let occupancy = Array3d::new(res, res, res, true);

    let mut grid = BoxGrid::new();
    grid.init_voxels(res, &occupancy)?;
    grid.init_structure();
    grid.compute_box_positions();
    println!(
        "grid: {} occupied boxes, {} active nodes",
        grid.num_boxes(),
        grid.num_nodes()
    );

    // a two-bone chain up the middle of the cube
    let handles: HandleMap = [
        ("spine".to_string(), Point3d::new(0.5, 0.1, 0.5)),
        ("neck".to_string(), Point3d::new(0.5, 0.6, 0.5)),
        ("head".to_string(), Point3d::new(0.5, 0.9, 0.5)),
    ]
    .into_iter()
    .collect();
    let bone_wise: BoneMap = [
        ("spine".to_string(), "neck".to_string()),
        ("neck".to_string(), "head".to_string()),
    ]
    .into_iter()
    .collect();

    let mut solver = ClarabelSolver::new();
    grid.compute_bone_bbw(&handles, &bone_wise, &mut solver)?;
    println!("solved {} bones over {} joints", bone_wise.len(), handles.len());

    for y in [0.15, 0.35, 0.55, 0.75] {
        let p = Point3d::new(0.5, y, 0.5);
        let w = grid.interpolated_bbw(&p, handles.len())?;
        println!(
            "weights at y={:.2}: [{}]",
            y,
            w.coords()
                .iter()
                .map(|c| format!("{:.4}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}
