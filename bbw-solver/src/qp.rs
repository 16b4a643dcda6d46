//! Solver interface for the per-handle weight solve

use bbw_core::{Error, Result};
use sprs::CsMat;

/// A constrained quadratic program solver.
///
/// Minimizes `xᵀQx + cᵀx` subject to the linear equality constraints
/// `Ax = b` and, when `bounded` is set, the box constraints `0 ≤ x ≤ 1`.
pub trait QuadraticProgramSolver {
    /// Solve one program and return the solution vector.
    ///
    /// # Arguments
    /// * `objective` - Symmetric positive semidefinite `n×n` matrix `Q`
    /// * `linear_cost` - Optional length-`n` linear cost `c` (zero when absent)
    /// * `constraints` - `m×n` equality constraint matrix `A`
    /// * `rhs` - Length-`m` right-hand side `b`
    /// * `bounded` - Whether to impose `0 ≤ x ≤ 1` on every variable
    ///
    /// # Returns
    /// * `Result<Vec<f64>>` - Length-`n` solution, or `Error::Solver` when the
    ///   program does not reach an optimal status
    fn solve_qp(
        &mut self,
        objective: &CsMat<f64>,
        linear_cost: Option<&[f64]>,
        constraints: &CsMat<f64>,
        rhs: &[f64],
        bounded: bool,
    ) -> Result<Vec<f64>>;
}

/// Reject inconsistently sized programs before they reach a backend
pub fn check_program_shapes(
    objective: &CsMat<f64>,
    linear_cost: Option<&[f64]>,
    constraints: &CsMat<f64>,
    rhs: &[f64],
) -> Result<()> {
    let n = constraints.cols();
    let m = constraints.rows();
    if objective.rows() != n || objective.cols() != n {
        return Err(Error::ConstraintMismatch(format!(
            "objective is {}x{}, expected {}x{}",
            objective.rows(),
            objective.cols(),
            n,
            n
        )));
    }
    if rhs.len() != m {
        return Err(Error::ConstraintMismatch(format!(
            "rhs has {} entries for {} constraint rows",
            rhs.len(),
            m
        )));
    }
    if let Some(c) = linear_cost {
        if c.len() != n {
            return Err(Error::ConstraintMismatch(format!(
                "linear cost has {} entries for {} variables",
                c.len(),
                n
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn identity(n: usize) -> CsMat<f64> {
        let mut t = TriMat::new((n, n));
        for i in 0..n {
            t.add_triplet(i, i, 1.0);
        }
        t.to_csr()
    }

    #[test]
    fn test_shapes_accepted() {
        let q = identity(3);
        let mut a = TriMat::new((1, 3));
        a.add_triplet(0, 0, 1.0);
        let a = a.to_csr();
        assert!(check_program_shapes(&q, None, &a, &[1.0]).is_ok());
        assert!(check_program_shapes(&q, Some(&[0.0; 3]), &a, &[1.0]).is_ok());
    }

    #[test]
    fn test_shapes_rejected() {
        let q = identity(2);
        let mut a = TriMat::new((1, 3));
        a.add_triplet(0, 0, 1.0);
        let a = a.to_csr();
        assert!(check_program_shapes(&q, None, &a, &[1.0]).is_err());

        let q = identity(3);
        assert!(check_program_shapes(&q, None, &a, &[1.0, 2.0]).is_err());
        assert!(check_program_shapes(&q, Some(&[0.0; 2]), &a, &[1.0]).is_err());
    }
}
