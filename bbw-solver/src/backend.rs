//! Interior-point backend over the Clarabel solver

use crate::qp::{check_program_shapes, QuadraticProgramSolver};
use bbw_core::{Error, Result};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT::{self, NonnegativeConeT, ZeroConeT},
};
use sprs::CsMat;

/// [`QuadraticProgramSolver`] backed by the Clarabel interior-point method.
///
/// Equality constraints go into the zero cone; the `0 ≤ x ≤ 1` box is
/// expressed as `[I; -I]` rows in the nonnegative cone. Clarabel minimizes
/// `½xᵀPx + qᵀx`, so the objective matrix is doubled on the way in.
pub struct ClarabelSolver {
    settings: DefaultSettings<f64>,
}

impl ClarabelSolver {
    pub fn new() -> Self {
        let settings = DefaultSettings {
            verbose: false,
            ..DefaultSettings::default()
        };
        Self { settings }
    }

    /// Override the default solver settings
    pub fn with_settings(settings: DefaultSettings<f64>) -> Self {
        Self { settings }
    }
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadraticProgramSolver for ClarabelSolver {
    fn solve_qp(
        &mut self,
        objective: &CsMat<f64>,
        linear_cost: Option<&[f64]>,
        constraints: &CsMat<f64>,
        rhs: &[f64],
        bounded: bool,
    ) -> Result<Vec<f64>> {
        check_program_shapes(objective, linear_cost, constraints, rhs)?;
        let n = constraints.cols();
        let m = constraints.rows();

        // Clarabel minimizes ½xᵀPx, so P = 2Q recovers xᵀQx; only the upper
        // triangle is wanted.
        let p = to_csc(objective.rows(), n, gather(objective, true, 2.0));

        let q = match linear_cost {
            Some(c) => c.to_vec(),
            None => vec![0.0; n],
        };

        let mut entries = gather(constraints, false, 1.0);
        let mut b = rhs.to_vec();
        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if m > 0 {
            cones.push(ZeroConeT(m));
        }
        if bounded {
            for i in 0..n {
                entries.push((m + i, i, 1.0)); // x ≤ 1
                entries.push((m + n + i, i, -1.0)); // -x ≤ 0
            }
            b.extend(std::iter::repeat(1.0).take(n));
            b.extend(std::iter::repeat(0.0).take(n));
            cones.push(NonnegativeConeT(2 * n));
        }
        let num_rows = if bounded { m + 2 * n } else { m };
        let a = to_csc(num_rows, n, entries);

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, self.settings.clone());
        solver.solve();

        let status = solver.solution.status;
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                log::debug!("clarabel solved {}-constraint program over {} variables", m, n);
                Ok(solver.solution.x.clone())
            }
            _ => Err(Error::Solver(format!(
                "clarabel terminated with status {:?}",
                status
            ))),
        }
    }
}

/// Collect scaled triplets, optionally keeping only the upper triangle
fn gather(mat: &CsMat<f64>, upper_only: bool, scale: f64) -> Vec<(usize, usize, f64)> {
    mat.iter()
        .filter(|&(_, (row, col))| !upper_only || row <= col)
        .map(|(&v, (row, col))| (row, col, v * scale))
        .collect()
}

/// Build a compressed-column matrix from unordered triplets
fn to_csc(rows: usize, cols: usize, mut entries: Vec<(usize, usize, f64)>) -> CscMatrix<f64> {
    entries.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
    let mut colptr = vec![0usize; cols + 1];
    let mut rowval = Vec::with_capacity(entries.len());
    let mut nzval = Vec::with_capacity(entries.len());
    for &(row, col, v) in &entries {
        colptr[col + 1] += 1;
        rowval.push(row);
        nzval.push(v);
    }
    for c in 0..cols {
        colptr[c + 1] += colptr[c];
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
