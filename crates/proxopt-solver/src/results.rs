//! Solver outcome.

use crate::error::SolverResult;
use proxopt_core::{
    core::{
        error::ModelError,
        types::{DVector, Scalar},
    },
    Problem,
};
use std::fmt;

/// Status of a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvergenceFlag {
    /// No solve has completed yet.
    #[default]
    Unsolved,
    /// Primal and dual infeasibility fell below the target tolerance.
    Success,
    /// The outer iteration cap was reached first.
    MaxItersReached,
    /// A non-recoverable numerical failure occurred (singular Newton matrix
    /// beyond regularization, non-finite values).
    Failed,
}

impl fmt::Display for ConvergenceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsolved => "UNSOLVED",
            Self::Success => "SUCCESS",
            Self::MaxItersReached => "MAX_ITERS_REACHED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Final (or latest) iterate and statistics of a solve.
///
/// Allocated once from a problem and overwritten by every call to
/// [`Solver::solve`](crate::Solver::solve).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Results<T: Scalar> {
    /// Outcome of the last solve.
    pub status: ConvergenceFlag,
    /// Shorthand for `status == ConvergenceFlag::Success`.
    pub converged: bool,
    /// Latest primal iterate.
    pub x_opt: DVector<T>,
    /// Latest multipliers, one vector per constraint.
    pub lams_opt: Vec<DVector<T>>,
    /// Cost value at `x_opt`.
    pub value: T,
    /// Merit value at `x_opt`.
    pub merit: T,
    /// Largest constraint violation.
    pub prim_infeas: T,
    /// Stationarity residual of the Lagrangian.
    pub dual_infeas: T,
    /// Violation of each constraint.
    pub constraint_violations: Vec<T>,
    /// Active coordinates of each constraint.
    pub active_set: Vec<Vec<bool>>,
    /// Number of outer iterations.
    pub num_iters: usize,
    /// Total number of Newton steps.
    pub num_inner_iters: usize,
    /// Final penalty parameter.
    pub mu: T,
    /// Final proximal weight.
    pub rho: T,
}

impl<T: Scalar> Results<T> {
    /// Allocates results for `problem`.
    ///
    /// # Errors
    ///
    /// Returns a dimension error if `nx` is not the problem's variable size.
    pub fn new(nx: usize, problem: &Problem<T>) -> SolverResult<Self> {
        if nx != problem.nx() {
            return Err(ModelError::dimension_mismatch(
                format!("results for nx = {}", problem.nx()),
                format!("nx = {nx}"),
            )
            .into());
        }
        Ok(Self::from_problem(problem))
    }

    /// Allocates results sized from `problem`.
    pub fn from_problem(problem: &Problem<T>) -> Self {
        let m = problem.num_constraints();
        Self {
            status: ConvergenceFlag::Unsolved,
            converged: false,
            x_opt: DVector::zeros(problem.nx()),
            lams_opt: problem.zero_multipliers(),
            value: T::zero(),
            merit: T::zero(),
            prim_infeas: T::zero(),
            dual_infeas: T::zero(),
            constraint_violations: vec![T::zero(); m],
            active_set: (0..m)
                .map(|i| vec![false; problem.constraint_dim(i)])
                .collect(),
            num_iters: 0,
            num_inner_iters: 0,
            mu: T::zero(),
            rho: T::zero(),
        }
    }

    /// Checks that the buffers match the layout of `problem`.
    pub(crate) fn check_problem(&self, problem: &Problem<T>) -> SolverResult<()> {
        let matches = self.x_opt.len() == problem.nx()
            && self.lams_opt.len() == problem.num_constraints()
            && self
                .lams_opt
                .iter()
                .enumerate()
                .all(|(i, lam)| lam.len() == problem.constraint_dim(i));
        if matches {
            Ok(())
        } else {
            Err(ModelError::dimension_mismatch(
                "results allocated for the solved problem",
                "results of another problem",
            )
            .into())
        }
    }

    /// Clears statistics before a new solve.
    pub(crate) fn reset(&mut self) {
        self.status = ConvergenceFlag::Unsolved;
        self.converged = false;
        self.num_iters = 0;
        self.num_inner_iters = 0;
    }
}

impl<T: Scalar> fmt::Display for Results<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results {{")?;
        writeln!(f, "  status:      {}", self.status)?;
        writeln!(f, "  num_iters:   {} ({} inner)", self.num_iters, self.num_inner_iters)?;
        writeln!(f, "  value:       {:.6e}", <T as Scalar>::to_f64(self.value))?;
        writeln!(f, "  merit:       {:.6e}", <T as Scalar>::to_f64(self.merit))?;
        writeln!(f, "  prim_infeas: {:.3e}", <T as Scalar>::to_f64(self.prim_infeas))?;
        writeln!(f, "  dual_infeas: {:.3e}", <T as Scalar>::to_f64(self.dual_infeas))?;
        writeln!(f, "  mu:          {:.3e}", <T as Scalar>::to_f64(self.mu))?;
        write!(f, "  x_opt:       [")?;
        for (i, xi) in self.x_opt.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.6}", <T as Scalar>::to_f64(*xi))?;
        }
        writeln!(f, "]")?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxopt_core::prelude::*;
    use std::sync::Arc;

    fn problem() -> Problem<f64> {
        let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
        let cost: Arc<dyn CostFunction<f64>> =
            Arc::new(QuadraticDistanceCost::at_neutral(space).unwrap());
        let res: Arc<dyn ResidualFunction<f64>> =
            Arc::new(LinearResidual::from_matrix(DMatrix::identity(2, 2)).unwrap());
        Problem::new(cost, vec![Constraint::negative_orthant(res)]).unwrap()
    }

    #[test]
    fn test_allocation() {
        let problem = problem();
        let results = Results::new(2, &problem).unwrap();
        assert_eq!(results.status, ConvergenceFlag::Unsolved);
        assert!(!results.converged);
        assert_eq!(results.lams_opt.len(), 1);
        assert_eq!(results.lams_opt[0].len(), 2);
        assert_eq!(results.active_set[0].len(), 2);
        assert!(results.check_problem(&problem).is_ok());
        assert!(Results::new(3, &problem).is_err());
    }

    #[test]
    fn test_display() {
        let results = Results::from_problem(&problem());
        let text = results.to_string();
        assert!(text.contains("status:      UNSOLVED"));
        assert!(text.contains("x_opt:       [0.000000, 0.000000]"));
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(ConvergenceFlag::Success.to_string(), "SUCCESS");
        assert_eq!(ConvergenceFlag::MaxItersReached.to_string(), "MAX_ITERS_REACHED");
        assert_eq!(ConvergenceFlag::Failed.to_string(), "FAILED");
    }
}
