//! Proximal augmented-Lagrangian solver.
//!
//! # Algorithm
//!
//! The solver minimizes `f(x)` over a manifold subject to `r_i(x) ∈ C_i`.
//! Each outer iteration approximately minimizes the merit function
//!
//! ```text
//! M(x) = f(x) + Σ_i (μ/2)‖Π_N,i(r_i(x) + λ_i/μ)‖² − ‖λ_i‖²/(2μ) + (ρ/2)‖x_prev ⊖ x‖²
//! ```
//!
//! with a (Gauss-)Newton inner loop, then updates the multipliers to
//! `λ⁺_i = μ Π_N,i(r_i(x) + λ_i/μ)` and the penalty `μ` according to
//! [`PenaltyUpdate`].
//!
//! ## Inner loop
//!
//! 1. Linearize: merit gradient `∇f + Σ J_iᵀλ⁺_i + ρ J_pᵀd` and Hessian
//!    `∇²f + Σ μ J_iᵀ D_i J_i + ρ J_pᵀJ_p`, where `D_i` zeroes the inactive
//!    rows.
//! 2. Stop when `‖∇M‖∞ ≤ ω`.
//! 3. Solve `(H + δI) p = −∇M` with the smallest working shift `δ`.
//! 4. Armijo backtracking along `x ⊕ αp`, with a slack sized to the
//!    rounding error of the merit value.
//! 5. Stop early once `α‖p‖∞` falls below the resolution of `x`, or once a
//!    step whose predicted decrease was within the slack failed to halve
//!    `‖∇M‖∞`.
//!
//! The penalty only grows while the violation is above the target
//! tolerance.
//!
//! Numerical breakdown is reported through [`ConvergenceFlag::Failed`],
//! never as an error.

use crate::{
    callback::Callback,
    config::{BclParams, PenaltyUpdate, SolverConfig, VerboseLevel},
    error::{SolverError, SolverResult},
    line_search::ArmijoParams,
    results::{ConvergenceFlag, Results},
    workspace::Workspace,
};
use num_traits::Float;
use proxopt_core::{
    core::{
        error::ModelError,
        manifold::{DifferenceArg, Manifold},
        types::{all_finite, infty_norm, DVector, Scalar},
    },
    Problem,
};
use std::{fmt, sync::Arc};

/// Outcome of one inner minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InnerStatus {
    Converged,
    MaxIters,
    /// The merit can no longer be decreased above its rounding level.
    Stalled,
    Failed,
}

/// Augmented-Lagrangian solver for constrained problems on a manifold.
///
/// # Example
///
/// ```
/// use proxopt_core::prelude::*;
/// use proxopt_solver::prelude::*;
/// use std::sync::Arc;
///
/// let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
/// let target = DVector::from_vec(vec![1.0, 1.0]);
/// let cost = QuadraticDistanceCost::with_target(space.clone(), target).unwrap();
/// // x₀ + x₁ − 1 = 0
/// let line = LinearResidual::new(
///     DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
///     DVector::from_vec(vec![-1.0]),
/// )
/// .unwrap();
/// let problem = Arc::new(
///     Problem::new(Arc::new(cost), vec![Constraint::equality(Arc::new(line))]).unwrap(),
/// );
///
/// let mut ws = Workspace::from_problem(&problem);
/// let mut results = Results::from_problem(&problem);
/// let mut solver = Solver::new(space, problem, SolverConfig::default()).unwrap();
/// let flag = solver
///     .solve(&mut ws, &mut results, &DVector::zeros(2), None)
///     .unwrap();
///
/// assert_eq!(flag, ConvergenceFlag::Success);
/// assert!((results.x_opt[0] - 0.5).abs() < 1e-5);
/// ```
pub struct Solver<T: Scalar> {
    space: Arc<dyn Manifold<T>>,
    problem: Arc<Problem<T>>,
    config: SolverConfig<T>,
    callbacks: Vec<Box<dyn Callback<T>>>,
}

impl<T: Scalar> fmt::Debug for Solver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("space", &self.space.name())
            .field("num_constraints", &self.problem.num_constraints())
            .field("config", &self.config)
            .field("num_callbacks", &self.callbacks.len())
            .finish()
    }
}

impl<T: Scalar> Solver<T> {
    /// Creates a solver for `problem` on `space`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` does not validate, or a
    /// dimension error if the manifold and the problem disagree.
    pub fn new(
        space: Arc<dyn Manifold<T>>,
        problem: Arc<Problem<T>>,
        config: SolverConfig<T>,
    ) -> SolverResult<Self> {
        config.validate()?;
        if space.nx() != problem.nx() || space.ndx() != problem.ndx() {
            return Err(ModelError::dimension_mismatch(
                format!("problem on ({}, {})", space.nx(), space.ndx()),
                format!("({}, {})", problem.nx(), problem.ndx()),
            )
            .into());
        }
        Ok(Self {
            space,
            problem,
            config,
            callbacks: Vec::new(),
        })
    }

    /// The manifold the variable lives on.
    pub fn manifold(&self) -> &Arc<dyn Manifold<T>> {
        &self.space
    }

    /// The problem being solved.
    pub fn problem(&self) -> &Arc<Problem<T>> {
        &self.problem
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Replaces the configuration used by subsequent solves.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` and keeps the current configuration if
    /// `config` does not validate.
    pub fn set_config(&mut self, config: SolverConfig<T>) -> SolverResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Sets the target tolerance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `tol` is not positive.
    pub fn set_tolerance(&mut self, tol: T) -> SolverResult<()> {
        self.set_config(self.config.clone().with_tolerance(tol))
    }

    /// Sets the initial penalty parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `mu` is not positive or exceeds the
    /// penalty cap.
    pub fn set_penalty(&mut self, mu: T) -> SolverResult<()> {
        self.set_config(self.config.clone().with_mu_init(mu))
    }

    /// Sets the initial primal proximal weight, keeping its update factor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `rho` is negative.
    pub fn set_prox_param(&mut self, rho: T) -> SolverResult<()> {
        let factor = self.config.rho_update_factor;
        self.set_config(self.config.clone().with_proximal(rho, factor))
    }

    /// Sets the outer iteration cap.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_iters` is zero.
    pub fn set_max_iters(&mut self, max_iters: usize) -> SolverResult<()> {
        self.set_config(self.config.clone().with_max_iters(max_iters))
    }

    /// Sets the logging level.
    pub fn set_verbose(&mut self, verbose: VerboseLevel) {
        self.config.verbose = verbose;
    }

    /// Switches between the Gauss-Newton and the exact merit Hessian.
    pub fn set_use_gauss_newton(&mut self, use_gauss_newton: bool) {
        self.config.use_gauss_newton = use_gauss_newton;
    }

    /// Appends a callback; callbacks run in registration order.
    pub fn register_callback(&mut self, callback: Box<dyn Callback<T>>) {
        self.callbacks.push(callback);
    }

    /// Removes every registered callback.
    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    /// Number of registered callbacks.
    pub fn num_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Runs the augmented-Lagrangian method from `x0`.
    ///
    /// `lams0` gives one initial multiplier per constraint; zero multipliers
    /// are used when it is `None`. The outcome is written into `results` and
    /// its status is returned.
    ///
    /// # Errors
    ///
    /// Returns an error before any iteration when `x0`, `lams0`, `workspace`
    /// or `results` do not match the problem, and propagates errors raised
    /// by the model functions. Numerical failure and the iteration cap are
    /// reported through the returned [`ConvergenceFlag`].
    pub fn solve(
        &mut self,
        workspace: &mut Workspace<T>,
        results: &mut Results<T>,
        x0: &DVector<T>,
        lams0: Option<&[DVector<T>]>,
    ) -> SolverResult<ConvergenceFlag> {
        self.space.check_point(x0)?;
        workspace.check_problem(&self.problem)?;
        results.check_problem(&self.problem)?;
        match lams0 {
            Some(lams) => {
                if lams.len() != self.problem.num_constraints() {
                    return Err(SolverError::MultiplierCountMismatch {
                        expected: self.problem.num_constraints(),
                        actual: lams.len(),
                    });
                }
                self.problem.check_multipliers(lams)?;
                for (dst, src) in workspace.lams.iter_mut().zip(lams) {
                    dst.copy_from(src);
                }
            }
            None => {
                for lam in &mut workspace.lams {
                    lam.fill(T::zero());
                }
            }
        }

        self.initialize(workspace, x0);
        results.reset();

        let tol = self.config.tol;
        let mut prev_prim = <T as Float>::infinity();
        let mut status = ConvergenceFlag::Unsolved;

        for iter in 0..self.config.max_iters {
            match self.inner_loop(workspace, results)? {
                InnerStatus::Failed => {
                    status = ConvergenceFlag::Failed;
                    self.write_results(workspace, results, status);
                    if self.config.verbose >= VerboseLevel::Verbose {
                        tracing::warn!(iter, "numerical failure in the inner loop");
                    }
                    break;
                }
                InnerStatus::Converged | InnerStatus::MaxIters | InnerStatus::Stalled => {}
            }

            let prim = workspace
                .cstr
                .violations(&self.problem, &mut workspace.constraint_violations);
            let dual = Self::dual_infeasibility(workspace);
            workspace.prim_infeas = prim;
            workspace.dual_infeas = dual;

            let converged = prim <= tol && dual <= tol;
            if converged {
                Self::accept_multipliers(workspace);
            } else {
                self.update_penalty(workspace, prim, prev_prim);
            }
            prev_prim = prim;
            workspace.x_prev.copy_from(&workspace.x);
            workspace.rho *= self.config.rho_update_factor;

            results.num_iters += 1;
            status = if converged {
                ConvergenceFlag::Success
            } else if iter + 1 == self.config.max_iters {
                ConvergenceFlag::MaxItersReached
            } else {
                ConvergenceFlag::Unsolved
            };
            self.write_results(workspace, results, status);

            if self.config.verbose >= VerboseLevel::Verbose {
                tracing::info!(
                    iter = results.num_iters,
                    inner = results.num_inner_iters,
                    value = <T as Scalar>::to_f64(workspace.value),
                    merit = <T as Scalar>::to_f64(workspace.merit),
                    prim_infeas = <T as Scalar>::to_f64(prim),
                    dual_infeas = <T as Scalar>::to_f64(dual),
                    mu = <T as Scalar>::to_f64(workspace.mu),
                    "outer iteration"
                );
            }

            for callback in &mut self.callbacks {
                callback.call(workspace, results);
            }

            if converged {
                break;
            }
        }

        if self.config.verbose >= VerboseLevel::Verbose {
            tracing::info!(
                status = %status,
                iters = results.num_iters,
                inner = results.num_inner_iters,
                "solve finished"
            );
        }
        Ok(status)
    }

    fn initialize(&self, ws: &mut Workspace<T>, x0: &DVector<T>) {
        ws.x.copy_from(x0);
        ws.x_prev.copy_from(x0);
        ws.x_trial.copy_from(x0);
        ws.step.fill(T::zero());
        ws.factor.reset();
        ws.alpha = T::zero();
        ws.mu = self.config.mu_init;
        ws.rho = self.config.rho_init;
        ws.prim_infeas = T::zero();
        ws.dual_infeas = T::zero();
        match &self.config.penalty_update {
            PenaltyUpdate::ViolationRatio { .. } => {
                ws.inner_tol = self.config.inner_tol;
                ws.prim_tol = self.config.tol;
            }
            PenaltyUpdate::Bcl(params) => {
                self.reset_bcl_tolerances(ws, params);
            }
        }
    }

    /// `η = η₀ μ^(−prim_alpha)` and `ω = ω₀ μ^(−dual_alpha)`, clamped.
    fn reset_bcl_tolerances(&self, ws: &mut Workspace<T>, params: &BclParams<T>) {
        ws.prim_tol = <T as Float>::max(
            params.prim_tol0 * <T as Float>::powf(ws.mu, -params.prim_alpha),
            self.config.tol,
        );
        ws.inner_tol = <T as Float>::max(
            params.inner_tol0 * <T as Float>::powf(ws.mu, -params.dual_alpha),
            self.config.inner_tol_min,
        );
    }

    fn accept_multipliers(ws: &mut Workspace<T>) {
        for (lam, lam_plus) in ws.lams.iter_mut().zip(&ws.cstr.lams_plus) {
            lam.copy_from(lam_plus);
        }
    }

    fn increase_penalty(&self, ws: &mut Workspace<T>, factor: T) {
        ws.mu = <T as Float>::min(ws.mu * factor, self.config.mu_upper);
    }

    fn update_penalty(&self, ws: &mut Workspace<T>, prim: T, prev_prim: T) {
        match &self.config.penalty_update {
            PenaltyUpdate::ViolationRatio { factor, ratio } => {
                Self::accept_multipliers(ws);
                if prim > self.config.tol && prim > *ratio * prev_prim {
                    self.increase_penalty(ws, *factor);
                }
            }
            PenaltyUpdate::Bcl(params) => {
                if prim <= ws.prim_tol {
                    Self::accept_multipliers(ws);
                    ws.prim_tol = <T as Float>::max(
                        ws.prim_tol * <T as Float>::powf(ws.mu, -params.prim_beta),
                        self.config.tol,
                    );
                    ws.inner_tol = <T as Float>::max(
                        ws.inner_tol * <T as Float>::powf(ws.mu, -params.dual_beta),
                        self.config.inner_tol_min,
                    );
                } else {
                    self.increase_penalty(ws, params.factor);
                    self.reset_bcl_tolerances(ws, params);
                }
            }
        }
    }

    /// Minimizes the merit function at fixed multipliers and penalty. On
    /// return the constraint buffers are evaluated at `ws.x`.
    fn inner_loop(&self, ws: &mut Workspace<T>, results: &mut Results<T>) -> SolverResult<InnerStatus> {
        let half = <T as Scalar>::from_f64(0.5);
        // criterion before the last step, if that step was at rounding level
        let mut negligible_from: Option<T> = None;
        let mut stalled = false;
        for inner in 0..self.config.max_inner_iters {
            self.linearize(ws)?;
            if !(<T as Float>::is_finite(ws.merit) && all_finite(&ws.merit_gradient)) {
                return Ok(InnerStatus::Failed);
            }
            if ws.inner_criterion <= ws.inner_tol {
                return Ok(InnerStatus::Converged);
            }
            if let Some(previous) = negligible_from {
                if ws.inner_criterion >= half * previous {
                    if self.config.verbose >= VerboseLevel::VeryVerbose {
                        tracing::debug!(
                            inner,
                            grad = <T as Scalar>::to_f64(ws.inner_criterion),
                            "inner loop stalled at rounding level"
                        );
                    }
                    return Ok(InnerStatus::Stalled);
                }
            }

            if !ws.factor.factorize(&ws.merit_hessian, &self.config.regularization) {
                if self.config.verbose >= VerboseLevel::Verbose {
                    tracing::warn!(
                        inner,
                        max = <T as Scalar>::to_f64(self.config.regularization.max),
                        "Newton matrix could not be regularized"
                    );
                }
                return Ok(InnerStatus::Failed);
            }
            ws.rhs.copy_from(&ws.merit_gradient);
            ws.rhs.neg_mut();
            ws.factor.solve_refined(
                &ws.merit_hessian,
                &ws.rhs,
                &mut ws.step,
                &mut ws.refinement_err,
                self.config.max_refinement_steps,
            );
            if !all_finite(&ws.step) {
                return Ok(InnerStatus::Failed);
            }

            let mut dphi0 = ws.merit_gradient.dot(&ws.step);
            if !(dphi0 < T::zero()) {
                ws.step.copy_from(&ws.rhs);
                dphi0 = -ws.merit_gradient.norm_squared();
            }

            let phi0 = ws.merit;
            let slack = ArmijoParams::roundoff_slack(ws.merit_scale);
            negligible_from = (-dphi0 <= slack).then_some(ws.inner_criterion);
            let search = self
                .config
                .line_search
                .search(phi0, dphi0, slack, |alpha| self.trial_merit(ws, alpha))?;
            std::mem::swap(&mut ws.x, &mut ws.x_trial);
            ws.alpha = search.alpha;
            results.num_inner_iters += 1;
            stalled = search.alpha * infty_norm(&ws.step)
                <= <T as Float>::epsilon() * (T::one() + infty_norm(&ws.x));

            if self.config.verbose >= VerboseLevel::VeryVerbose {
                tracing::debug!(
                    inner,
                    merit = <T as Scalar>::to_f64(search.value),
                    grad = <T as Scalar>::to_f64(ws.inner_criterion),
                    alpha = <T as Scalar>::to_f64(search.alpha),
                    delta = <T as Scalar>::to_f64(ws.factor.delta()),
                    armijo = search.sufficient_decrease,
                    "inner iteration"
                );
            }
            if stalled {
                break;
            }
        }

        self.linearize(ws)?;
        if !(<T as Float>::is_finite(ws.merit) && all_finite(&ws.merit_gradient)) {
            return Ok(InnerStatus::Failed);
        }
        Ok(if ws.inner_criterion <= ws.inner_tol {
            InnerStatus::Converged
        } else if stalled {
            InnerStatus::Stalled
        } else {
            InnerStatus::MaxIters
        })
    }

    /// `(ρ/2)‖center ⊖ x‖²`, leaving the difference in `diff`.
    fn proximal_term(
        &self,
        center: &DVector<T>,
        x: &DVector<T>,
        rho: T,
        diff: &mut DVector<T>,
    ) -> SolverResult<T> {
        if rho == T::zero() {
            return Ok(T::zero());
        }
        self.space.difference(center, x, diff)?;
        Ok(<T as Scalar>::from_f64(0.5) * rho * diff.norm_squared())
    }

    /// Merit value at `ws.x ⊕ alpha·ws.step`; the point is left in `ws.x_trial`.
    fn trial_merit(&self, ws: &mut Workspace<T>, alpha: T) -> SolverResult<T> {
        ws.step_trial.copy_from(&ws.step);
        ws.step_trial *= alpha;
        self.space.retract(&ws.x, &ws.step_trial, &mut ws.x_trial)?;

        let problem = &*self.problem;
        let value = problem.cost().evaluate(&ws.x_trial)?;
        let penalty = ws.cstr.evaluate(problem, &ws.x_trial, &ws.lams, ws.mu)?;
        let prox = self.proximal_term(&ws.x_prev, &ws.x_trial, ws.rho, &mut ws.prox_diff)?;
        Ok(value + penalty + prox)
    }

    /// Evaluates the merit function with its gradient and Hessian at `ws.x`.
    fn linearize(&self, ws: &mut Workspace<T>) -> SolverResult<()> {
        let problem = &*self.problem;
        let cost = problem.cost();
        ws.value = cost.evaluate(&ws.x)?;
        cost.compute_gradient(&ws.x, &mut ws.objective_gradient)?;
        cost.compute_hessian(&ws.x, &mut ws.objective_hessian)?;

        let penalty = ws.cstr.evaluate(problem, &ws.x, &ws.lams, ws.mu)?;
        ws.cstr.evaluate_jacobians(problem, &ws.x)?;

        ws.merit_gradient.copy_from(&ws.objective_gradient);
        ws.merit_hessian.copy_from(&ws.objective_hessian);
        for (i, constraint) in problem.constraints().iter().enumerate() {
            ws.merit_gradient
                .gemv_tr(T::one(), &ws.cstr.jacs[i], &ws.cstr.lams_plus[i], T::one());
            ws.merit_hessian
                .gemm_tr(ws.mu, &ws.cstr.jacs[i], &ws.cstr.jacs_proj[i], T::one());
            if !self.config.use_gauss_newton || constraint.set().disable_gauss_newton() {
                constraint.residual().compute_vector_hessian_product(
                    &ws.x,
                    &ws.cstr.lams_plus[i],
                    &mut ws.vhp_buffer,
                )?;
                ws.merit_hessian += &ws.vhp_buffer;
            }
        }

        let prox = self.proximal_term(&ws.x_prev, &ws.x, ws.rho, &mut ws.prox_diff)?;
        if ws.rho > T::zero() {
            self.space
                .difference_jacobian(&ws.x_prev, &ws.x, DifferenceArg::Second, &mut ws.prox_jac)?;
            ws.merit_gradient
                .gemv_tr(ws.rho, &ws.prox_jac, &ws.prox_diff, T::one());
            ws.merit_hessian
                .gemm_tr(ws.rho, &ws.prox_jac, &ws.prox_jac, T::one());
        }

        ws.merit = ws.value + penalty + prox;
        let two_mu = ws.mu + ws.mu;
        ws.merit_scale = <T as Float>::abs(ws.value) + prox;
        for (lam, lam_plus) in ws.lams.iter().zip(&ws.cstr.lams_plus) {
            ws.merit_scale += (lam.norm_squared() + lam_plus.norm_squared()) / two_mu;
        }
        ws.inner_criterion = infty_norm(&ws.merit_gradient);
        Ok(())
    }

    /// `‖∇f + Σ J_iᵀλ⁺_i‖∞` at the last linearization point.
    fn dual_infeasibility(ws: &mut Workspace<T>) -> T {
        ws.lagrangian_gradient.copy_from(&ws.objective_gradient);
        for (jac, lam_plus) in ws.cstr.jacs.iter().zip(&ws.cstr.lams_plus) {
            ws.lagrangian_gradient
                .gemv_tr(T::one(), jac, lam_plus, T::one());
        }
        infty_norm(&ws.lagrangian_gradient)
    }

    fn write_results(&self, ws: &Workspace<T>, results: &mut Results<T>, status: ConvergenceFlag) {
        results.status = status;
        results.converged = status == ConvergenceFlag::Success;
        results.x_opt.copy_from(&ws.x);
        for (dst, src) in results.lams_opt.iter_mut().zip(&ws.cstr.lams_plus) {
            dst.copy_from(src);
        }
        results.value = ws.value;
        results.merit = ws.merit;
        results.prim_infeas = ws.prim_infeas;
        results.dual_infeas = ws.dual_infeas;
        results
            .constraint_violations
            .copy_from_slice(&ws.constraint_violations);
        for (dst, src) in results.active_set.iter_mut().zip(&ws.cstr.active) {
            dst.copy_from_slice(src);
        }
        results.mu = ws.mu;
        results.rho = ws.rho;
    }
}
