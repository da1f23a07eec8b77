//! Pre-allocated solver scratch space.
//!
//! A [`Workspace`] is sized once from a [`Problem`] and then mutated in place
//! by every inner and outer iteration, so the solver's hot path does not
//! allocate. Callbacks receive it read-only.

use crate::{error::SolverResult, linalg::RegularizedCholesky};
use num_traits::Float;
use proxopt_core::{
    core::{
        error::{ModelError, Result},
        types::{infty_norm, DMatrix, DVector, Scalar},
    },
    Problem,
};

/// Per-constraint buffers evaluated at one point.
#[derive(Debug, Clone)]
pub(crate) struct ConstraintBuffers<T: Scalar> {
    /// Residual values `r_i(x)`.
    pub(crate) values: Vec<DVector<T>>,
    /// Shifted values `s_i = r_i(x) + λ_i / μ`.
    pub(crate) shifted: Vec<DVector<T>>,
    /// First-order multiplier estimates `λ⁺_i = μ Π_N,i(s_i)`.
    pub(crate) lams_plus: Vec<DVector<T>>,
    /// Jacobians of the residuals.
    pub(crate) jacs: Vec<DMatrix<T>>,
    /// Jacobians with inactive rows zeroed.
    pub(crate) jacs_proj: Vec<DMatrix<T>>,
    /// Active coordinates at `s_i`.
    pub(crate) active: Vec<Vec<bool>>,
    normal: Vec<DVector<T>>,
}

impl<T: Scalar> ConstraintBuffers<T> {
    fn new(problem: &Problem<T>) -> Self {
        let ndx = problem.ndx();
        let dims: Vec<usize> = (0..problem.num_constraints())
            .map(|i| problem.constraint_dim(i))
            .collect();
        let vectors = || dims.iter().map(|&nr| DVector::zeros(nr)).collect::<Vec<_>>();
        let matrices = || {
            dims.iter()
                .map(|&nr| DMatrix::zeros(nr, ndx))
                .collect::<Vec<_>>()
        };
        Self {
            values: vectors(),
            shifted: vectors(),
            lams_plus: vectors(),
            jacs: matrices(),
            jacs_proj: matrices(),
            active: dims.iter().map(|&nr| vec![false; nr]).collect(),
            normal: vectors(),
        }
    }

    /// Evaluates residuals, shifted residuals and first-order multipliers at
    /// `x`; returns the constraint part of the merit function
    /// `Σ (μ/2)‖Π_N(s_i)‖² − ‖λ_i‖²/(2μ)`.
    pub(crate) fn evaluate(
        &mut self,
        problem: &Problem<T>,
        x: &DVector<T>,
        lams: &[DVector<T>],
        mu: T,
    ) -> Result<T> {
        let half = <T as Scalar>::from_f64(0.5);
        let mu_inv = T::one() / mu;
        let mut penalty = T::zero();
        for (i, constraint) in problem.constraints().iter().enumerate() {
            constraint.residual().evaluate_into(x, &mut self.values[i])?;
            let shifted = &mut self.shifted[i];
            shifted.copy_from(&self.values[i]);
            shifted.axpy(mu_inv, &lams[i], T::one());

            let lam_plus = &mut self.lams_plus[i];
            constraint.set().normal_cone_project_into(shifted, lam_plus);
            penalty += half * mu * lam_plus.norm_squared() - half * mu_inv * lams[i].norm_squared();
            *lam_plus *= mu;
        }
        Ok(penalty)
    }

    /// Computes the Jacobians, their projected versions and the active sets
    /// at `x`, using the shifted values of the last [`evaluate`](Self::evaluate).
    pub(crate) fn evaluate_jacobians(&mut self, problem: &Problem<T>, x: &DVector<T>) -> Result<()> {
        for (i, constraint) in problem.constraints().iter().enumerate() {
            constraint.residual().compute_jacobian(x, &mut self.jacs[i])?;
            self.jacs_proj[i].copy_from(&self.jacs[i]);
            constraint
                .set()
                .apply_normal_cone_projection_jacobian(&self.shifted[i], &mut self.jacs_proj[i]);
            constraint
                .set()
                .compute_active_set(&self.shifted[i], &mut self.active[i]);
        }
        Ok(())
    }

    /// Writes `‖Π_N,i(r_i)‖∞` for every constraint into `out` using the
    /// values of the last [`evaluate`](Self::evaluate); returns the largest.
    pub(crate) fn violations(&mut self, problem: &Problem<T>, out: &mut [T]) -> T {
        let mut largest = T::zero();
        for (i, constraint) in problem.constraints().iter().enumerate() {
            constraint
                .set()
                .normal_cone_project_into(&self.values[i], &mut self.normal[i]);
            out[i] = infty_norm(&self.normal[i]);
            largest = <T as Float>::max(largest, out[i]);
        }
        largest
    }
}

/// Mutable scratch state of the solver.
///
/// Holds the current primal iterate, the multiplier estimates, penalty and
/// proximal parameters and every buffer used by the Newton steps.
#[derive(Debug, Clone)]
pub struct Workspace<T: Scalar> {
    pub(crate) nx: usize,
    pub(crate) ndx: usize,

    /// Current primal iterate.
    pub(crate) x: DVector<T>,
    /// Proximal center (iterate at the start of the outer iteration).
    pub(crate) x_prev: DVector<T>,
    /// Line-search trial point.
    pub(crate) x_trial: DVector<T>,

    /// Current multiplier estimates.
    pub(crate) lams: Vec<DVector<T>>,
    pub(crate) cstr: ConstraintBuffers<T>,

    pub(crate) objective_gradient: DVector<T>,
    pub(crate) objective_hessian: DMatrix<T>,
    pub(crate) merit_gradient: DVector<T>,
    pub(crate) merit_hessian: DMatrix<T>,
    pub(crate) vhp_buffer: DMatrix<T>,
    pub(crate) prox_diff: DVector<T>,
    pub(crate) prox_jac: DMatrix<T>,
    pub(crate) lagrangian_gradient: DVector<T>,

    pub(crate) step: DVector<T>,
    pub(crate) step_trial: DVector<T>,
    pub(crate) rhs: DVector<T>,
    pub(crate) refinement_err: DVector<T>,
    pub(crate) factor: RegularizedCholesky<T>,

    pub(crate) value: T,
    pub(crate) merit: T,
    /// Sum of the magnitudes of the merit terms, sizing its rounding error.
    pub(crate) merit_scale: T,
    pub(crate) inner_criterion: T,
    pub(crate) alpha: T,
    pub(crate) mu: T,
    pub(crate) rho: T,
    pub(crate) inner_tol: T,
    pub(crate) prim_tol: T,
    pub(crate) prim_infeas: T,
    pub(crate) dual_infeas: T,
    pub(crate) constraint_violations: Vec<T>,
}

impl<T: Scalar> Workspace<T> {
    /// Allocates a workspace for `problem`.
    ///
    /// # Errors
    ///
    /// Returns a dimension error if `nx`/`ndx` do not match the problem.
    pub fn new(nx: usize, ndx: usize, problem: &Problem<T>) -> SolverResult<Self> {
        if nx != problem.nx() || ndx != problem.ndx() {
            return Err(ModelError::dimension_mismatch(
                format!("workspace for ({}, {})", problem.nx(), problem.ndx()),
                format!("({nx}, {ndx})"),
            )
            .into());
        }
        Ok(Self::from_problem(problem))
    }

    /// Allocates a workspace sized from `problem`.
    pub fn from_problem(problem: &Problem<T>) -> Self {
        let nx = problem.nx();
        let ndx = problem.ndx();
        let square = || DMatrix::zeros(ndx, ndx);
        Self {
            nx,
            ndx,
            x: DVector::zeros(nx),
            x_prev: DVector::zeros(nx),
            x_trial: DVector::zeros(nx),
            lams: problem.zero_multipliers(),
            cstr: ConstraintBuffers::new(problem),
            objective_gradient: DVector::zeros(ndx),
            objective_hessian: square(),
            merit_gradient: DVector::zeros(ndx),
            merit_hessian: square(),
            vhp_buffer: square(),
            prox_diff: DVector::zeros(ndx),
            prox_jac: square(),
            lagrangian_gradient: DVector::zeros(ndx),
            step: DVector::zeros(ndx),
            step_trial: DVector::zeros(ndx),
            rhs: DVector::zeros(ndx),
            refinement_err: DVector::zeros(ndx),
            factor: RegularizedCholesky::new(ndx),
            value: T::zero(),
            merit: T::zero(),
            merit_scale: T::zero(),
            inner_criterion: T::zero(),
            alpha: T::zero(),
            mu: T::zero(),
            rho: T::zero(),
            inner_tol: T::zero(),
            prim_tol: T::zero(),
            prim_infeas: T::zero(),
            dual_infeas: T::zero(),
            constraint_violations: vec![T::zero(); problem.num_constraints()],
        }
    }

    /// Checks that the buffers match the layout of `problem`.
    pub(crate) fn check_problem(&self, problem: &Problem<T>) -> SolverResult<()> {
        let matches = self.nx == problem.nx()
            && self.ndx == problem.ndx()
            && self.lams.len() == problem.num_constraints()
            && self
                .lams
                .iter()
                .enumerate()
                .all(|(i, lam)| lam.len() == problem.constraint_dim(i));
        if matches {
            Ok(())
        } else {
            Err(ModelError::dimension_mismatch(
                "workspace allocated for the solved problem",
                "workspace of another problem",
            )
            .into())
        }
    }

    /// Ambient dimension of the variable.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Tangent dimension of the variable.
    pub fn ndx(&self) -> usize {
        self.ndx
    }

    /// Current primal iterate.
    pub fn x(&self) -> &DVector<T> {
        &self.x
    }

    /// Proximal center of the current outer iteration.
    pub fn x_prev(&self) -> &DVector<T> {
        &self.x_prev
    }

    /// Current multiplier estimates.
    pub fn multipliers(&self) -> &[DVector<T>] {
        &self.lams
    }

    /// First-order multiplier estimates at the last evaluated point.
    pub fn first_order_multipliers(&self) -> &[DVector<T>] {
        &self.cstr.lams_plus
    }

    /// Constraint residual values at the last evaluated point.
    pub fn constraint_values(&self) -> &[DVector<T>] {
        &self.cstr.values
    }

    /// Shifted constraint values `r_i + λ_i / μ`.
    pub fn shifted_constraints(&self) -> &[DVector<T>] {
        &self.cstr.shifted
    }

    /// Constraint Jacobians at the last linearization point.
    pub fn constraint_jacobians(&self) -> &[DMatrix<T>] {
        &self.cstr.jacs
    }

    /// Active sets at the last linearization point.
    pub fn active_set(&self) -> &[Vec<bool>] {
        &self.cstr.active
    }

    /// Gradient of the cost at the last linearization point.
    pub fn objective_gradient(&self) -> &DVector<T> {
        &self.objective_gradient
    }

    /// Gradient of the merit function.
    pub fn merit_gradient(&self) -> &DVector<T> {
        &self.merit_gradient
    }

    /// (Gauss-Newton) Hessian of the merit function, without regularization.
    pub fn merit_hessian(&self) -> &DMatrix<T> {
        &self.merit_hessian
    }

    /// Last Newton direction.
    pub fn step(&self) -> &DVector<T> {
        &self.step
    }

    /// Last accepted step size.
    pub fn alpha(&self) -> T {
        self.alpha
    }

    /// Diagonal shift used by the last factorization.
    pub fn regularization(&self) -> T {
        self.factor.delta()
    }

    /// Cost value at the current iterate.
    pub fn value(&self) -> T {
        self.value
    }

    /// Merit value at the current iterate.
    pub fn merit(&self) -> T {
        self.merit
    }

    /// Infinity norm of the merit gradient at the last linearization point.
    pub fn inner_criterion(&self) -> T {
        self.inner_criterion
    }

    /// Current penalty parameter.
    pub fn mu(&self) -> T {
        self.mu
    }

    /// Current proximal weight.
    pub fn rho(&self) -> T {
        self.rho
    }

    /// Current inner-loop tolerance.
    pub fn inner_tolerance(&self) -> T {
        self.inner_tol
    }

    /// Current primal tolerance of the multiplier acceptance test.
    pub fn primal_tolerance(&self) -> T {
        self.prim_tol
    }

    /// Latest primal infeasibility.
    pub fn prim_infeas(&self) -> T {
        self.prim_infeas
    }

    /// Latest dual infeasibility.
    pub fn dual_infeas(&self) -> T {
        self.dual_infeas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proxopt_core::prelude::*;
    use std::sync::Arc;

    fn problem() -> Problem<f64> {
        let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(3));
        let cost: Arc<dyn CostFunction<f64>> =
            Arc::new(QuadraticDistanceCost::at_neutral(space).unwrap());
        let eq: Arc<dyn ResidualFunction<f64>> = Arc::new(
            LinearResidual::new(
                DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]),
                DVector::from_vec(vec![-1.0]),
            )
            .unwrap(),
        );
        let ineq: Arc<dyn ResidualFunction<f64>> =
            Arc::new(LinearResidual::from_matrix(DMatrix::identity(2, 3)).unwrap());
        Problem::new(
            cost,
            vec![Constraint::equality(eq), Constraint::negative_orthant(ineq)],
        )
        .unwrap()
    }

    #[test]
    fn test_allocation_sizes() {
        let problem = problem();
        let ws = Workspace::new(3, 3, &problem).unwrap();
        assert_eq!(ws.multipliers().len(), 2);
        assert_eq!(ws.multipliers()[1].len(), 2);
        assert_eq!(ws.constraint_jacobians()[0].shape(), (1, 3));
        assert_eq!(ws.merit_hessian().shape(), (3, 3));
        assert!(ws.check_problem(&problem).is_ok());
        assert!(Workspace::new(3, 2, &problem).is_err());
    }

    #[test]
    fn test_constraint_evaluation_matches_problem_merit() {
        let problem = problem();
        let mut ws = Workspace::from_problem(&problem);
        let x = DVector::from_vec(vec![1.0, -0.5, 0.25]);
        let lams = vec![DVector::from_vec(vec![0.3]), DVector::from_vec(vec![0.1, 0.0])];
        let mu = 5.0;

        let penalty = ws.cstr.evaluate(&problem, &x, &lams, mu).unwrap();
        let cost = problem.cost().evaluate(&x).unwrap();
        assert_relative_eq!(
            cost + penalty,
            problem.merit_value(&x, &lams, mu).unwrap(),
            epsilon = 1e-12
        );

        // λ⁺ = λ + μ r for the equality constraint
        let r = 1.0 - 0.5 + 0.25 - 1.0;
        assert_relative_eq!(ws.first_order_multipliers()[0][0], 0.3 + mu * r, epsilon = 1e-12);
        // inequality: s = (1 + 0.02, -0.5), only the first coordinate is active
        assert_relative_eq!(ws.first_order_multipliers()[1][0], mu * 1.02, epsilon = 1e-12);
        assert_eq!(ws.first_order_multipliers()[1][1], 0.0);

        ws.cstr.evaluate_jacobians(&problem, &x).unwrap();
        assert_eq!(ws.active_set()[1], vec![true, false]);
        assert_eq!(ws.cstr.jacs_proj[1].row(1).sum(), 0.0);

        let mut violations = vec![0.0; 2];
        let largest = ws.cstr.violations(&problem, &mut violations);
        assert_relative_eq!(violations[0], r.abs(), epsilon = 1e-12);
        assert_relative_eq!(violations[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(largest, 1.0, epsilon = 1e-12);
    }
}
