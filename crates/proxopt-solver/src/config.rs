//! Solver configuration.
//!
//! [`SolverConfig`] gathers the tolerances, iteration caps and penalty
//! parameters of the augmented-Lagrangian method together with the inner
//! Newton solver settings. Every parameter is checked by
//! [`SolverConfig::validate`] when the solver is built.

use crate::{
    error::{SolverError, SolverResult},
    line_search::ArmijoParams,
};
use proxopt_core::core::types::Scalar;

/// Verbosity of the solver's `tracing` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerboseLevel {
    /// No output.
    #[default]
    Quiet,
    /// One line per outer iteration.
    Verbose,
    /// Outer iterations plus every inner Newton step.
    VeryVerbose,
}

/// Parameters of the bound-constrained Lagrangian (BCL) strategy.
///
/// Multipliers are only accepted when the constraint violation falls below a
/// primal tolerance `η`; otherwise the penalty is increased. Tolerances
/// follow the schedules
///
/// ```text
/// after a penalty increase:  η = η₀ μ^(−prim_alpha),  ω = ω₀ μ^(−dual_alpha)
/// after accepted multipliers: η ← η μ^(−prim_beta),   ω ← ω μ^(−dual_beta)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BclParams<T: Scalar> {
    /// Exponent of the primal tolerance reset.
    pub prim_alpha: T,
    /// Exponent of the primal tolerance decrease.
    pub prim_beta: T,
    /// Exponent of the inner tolerance reset.
    pub dual_alpha: T,
    /// Exponent of the inner tolerance decrease.
    pub dual_beta: T,
    /// Penalty growth factor.
    pub factor: T,
    /// Initial primal tolerance `η₀`.
    pub prim_tol0: T,
    /// Initial inner tolerance `ω₀`.
    pub inner_tol0: T,
}

impl<T: Scalar> Default for BclParams<T> {
    fn default() -> Self {
        Self {
            prim_alpha: <T as Scalar>::from_f64(0.1),
            prim_beta: <T as Scalar>::from_f64(0.9),
            dual_alpha: T::one(),
            dual_beta: T::one(),
            factor: <T as Scalar>::from_f64(10.0),
            prim_tol0: T::one(),
            inner_tol0: T::one(),
        }
    }
}

/// Rule deciding when the penalty parameter grows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PenaltyUpdate<T: Scalar> {
    /// Multipliers are always updated; the penalty is multiplied by `factor`
    /// when the violation did not drop below `ratio` times its previous value.
    ViolationRatio {
        /// Penalty growth factor.
        factor: T,
        /// Required decrease ratio of the violation.
        ratio: T,
    },
    /// Bound-constrained Lagrangian schedule.
    Bcl(BclParams<T>),
}

impl<T: Scalar> Default for PenaltyUpdate<T> {
    fn default() -> Self {
        Self::ViolationRatio {
            factor: <T as Scalar>::from_f64(10.0),
            ratio: <T as Scalar>::from_f64(0.25),
        }
    }
}

/// Schedule of the diagonal regularization added to the Newton matrix when
/// its factorization fails.
///
/// The first attempt is unregularized. On failure the shift starts at
/// `nonzero_init` (or `dec_factor` times the last successful shift, bounded
/// below by `min`) and is multiplied by `inc_factor_big` (first escalation)
/// or `inc_factor` until the factorization succeeds or the shift exceeds
/// `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegularizationParams<T: Scalar> {
    /// First nonzero shift.
    pub nonzero_init: T,
    /// Smallest nonzero shift.
    pub min: T,
    /// Largest shift before the step is declared impossible.
    pub max: T,
    /// Growth factor once a shift has succeeded before.
    pub inc_factor: T,
    /// Growth factor when no shift has succeeded yet.
    pub inc_factor_big: T,
    /// Decrease applied to the last successful shift.
    pub dec_factor: T,
}

impl<T: Scalar> Default for RegularizationParams<T> {
    fn default() -> Self {
        Self {
            nonzero_init: <T as Scalar>::from_f64(1e-4),
            min: <T as Scalar>::from_f64(1e-9),
            max: <T as Scalar>::from_f64(1e6),
            inc_factor: <T as Scalar>::from_f64(8.0),
            inc_factor_big: <T as Scalar>::from_f64(100.0),
            dec_factor: <T as Scalar>::from_f64(1.0 / 3.0),
        }
    }
}

/// Configuration of the augmented-Lagrangian solver.
///
/// # Example
///
/// ```
/// use proxopt_solver::config::{SolverConfig, VerboseLevel};
///
/// let config = SolverConfig::<f64>::new()
///     .with_tolerance(1e-8)
///     .with_mu_init(100.0)
///     .with_max_iters(50)
///     .with_verbose(VerboseLevel::Verbose);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig<T: Scalar> {
    /// Target tolerance on primal and dual infeasibility.
    pub tol: T,
    /// Initial penalty parameter.
    pub mu_init: T,
    /// Upper bound of the penalty parameter.
    pub mu_upper: T,
    /// Initial primal proximal weight (zero disables the proximal term).
    pub rho_init: T,
    /// Factor applied to the proximal weight after each outer iteration.
    pub rho_update_factor: T,
    /// Maximum number of outer iterations.
    pub max_iters: usize,
    /// Maximum number of Newton steps per outer iteration.
    pub max_inner_iters: usize,
    /// Stopping tolerance of the inner loop.
    pub inner_tol: T,
    /// Lower bound of the inner tolerance schedule.
    pub inner_tol_min: T,
    /// Diagnostic output level.
    pub verbose: VerboseLevel,
    /// Drop second-order constraint terms from the Newton matrix.
    pub use_gauss_newton: bool,
    /// Penalty and multiplier update strategy.
    pub penalty_update: PenaltyUpdate<T>,
    /// Backtracking line search parameters.
    pub line_search: ArmijoParams<T>,
    /// Newton matrix regularization schedule.
    pub regularization: RegularizationParams<T>,
    /// Maximum number of iterative refinement steps after each linear solve.
    pub max_refinement_steps: usize,
}

impl<T: Scalar> Default for SolverConfig<T> {
    fn default() -> Self {
        Self {
            tol: T::DEFAULT_TOLERANCE,
            mu_init: <T as Scalar>::from_f64(10.0),
            mu_upper: <T as Scalar>::from_f64(1e8),
            rho_init: T::zero(),
            rho_update_factor: T::one(),
            max_iters: 100,
            max_inner_iters: 100,
            inner_tol: T::DEFAULT_INNER_TOLERANCE,
            inner_tol_min: <T as Scalar>::from_f64(1e-9),
            verbose: VerboseLevel::Quiet,
            use_gauss_newton: true,
            penalty_update: PenaltyUpdate::default(),
            line_search: ArmijoParams::default(),
            regularization: RegularizationParams::default(),
            max_refinement_steps: 5,
        }
    }
}

impl<T: Scalar> SolverConfig<T> {
    /// Create a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target tolerance.
    pub fn with_tolerance(mut self, tol: T) -> Self {
        self.tol = tol;
        self
    }

    /// Set the initial penalty parameter.
    pub fn with_mu_init(mut self, mu_init: T) -> Self {
        self.mu_init = mu_init;
        self
    }

    /// Set the penalty cap.
    pub fn with_mu_upper(mut self, mu_upper: T) -> Self {
        self.mu_upper = mu_upper;
        self
    }

    /// Set the proximal weight and its per-iteration update factor.
    pub fn with_proximal(mut self, rho_init: T, rho_update_factor: T) -> Self {
        self.rho_init = rho_init;
        self.rho_update_factor = rho_update_factor;
        self
    }

    /// Set the outer iteration cap.
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the inner iteration cap.
    pub fn with_max_inner_iters(mut self, max_inner_iters: usize) -> Self {
        self.max_inner_iters = max_inner_iters;
        self
    }

    /// Set the inner tolerance and its lower bound.
    pub fn with_inner_tolerance(mut self, inner_tol: T, inner_tol_min: T) -> Self {
        self.inner_tol = inner_tol;
        self.inner_tol_min = inner_tol_min;
        self
    }

    /// Set the verbosity.
    pub fn with_verbose(mut self, verbose: VerboseLevel) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable the Gauss-Newton approximation.
    pub fn with_gauss_newton(mut self, use_gauss_newton: bool) -> Self {
        self.use_gauss_newton = use_gauss_newton;
        self
    }

    /// Set the penalty update strategy.
    pub fn with_penalty_update(mut self, penalty_update: PenaltyUpdate<T>) -> Self {
        self.penalty_update = penalty_update;
        self
    }

    /// Set the line search parameters.
    pub fn with_line_search(mut self, line_search: ArmijoParams<T>) -> Self {
        self.line_search = line_search;
        self
    }

    /// Set the regularization schedule.
    pub fn with_regularization(mut self, regularization: RegularizationParams<T>) -> Self {
        self.regularization = regularization;
        self
    }

    /// Set the number of iterative refinement steps.
    pub fn with_max_refinement_steps(mut self, steps: usize) -> Self {
        self.max_refinement_steps = steps;
        self
    }

    /// Validates every parameter.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::InvalidConfiguration` naming the first invalid
    /// parameter.
    pub fn validate(&self) -> SolverResult<()> {
        positive("tol", self.tol)?;
        positive("mu_init", self.mu_init)?;
        if !(self.mu_upper >= self.mu_init) {
            return Err(SolverError::invalid_configuration(
                "mu_upper must be at least mu_init",
                "mu_upper",
                self.mu_upper,
            ));
        }
        if !(self.rho_init >= T::zero()) {
            return Err(SolverError::invalid_configuration(
                "rho_init must be non-negative",
                "rho_init",
                self.rho_init,
            ));
        }
        positive("rho_update_factor", self.rho_update_factor)?;
        if self.max_iters == 0 {
            return Err(SolverError::invalid_configuration(
                "at least one outer iteration is required",
                "max_iters",
                self.max_iters,
            ));
        }
        if self.max_inner_iters == 0 {
            return Err(SolverError::invalid_configuration(
                "at least one inner iteration is required",
                "max_inner_iters",
                self.max_inner_iters,
            ));
        }
        positive("inner_tol", self.inner_tol)?;
        positive("inner_tol_min", self.inner_tol_min)?;

        match &self.penalty_update {
            PenaltyUpdate::ViolationRatio { factor, ratio } => {
                greater_than_one("penalty_update.factor", *factor)?;
                unit_interval("penalty_update.ratio", *ratio)?;
            }
            PenaltyUpdate::Bcl(params) => {
                greater_than_one("bcl.factor", params.factor)?;
                positive("bcl.prim_tol0", params.prim_tol0)?;
                positive("bcl.inner_tol0", params.inner_tol0)?;
                for (name, value) in [
                    ("bcl.prim_alpha", params.prim_alpha),
                    ("bcl.prim_beta", params.prim_beta),
                    ("bcl.dual_alpha", params.dual_alpha),
                    ("bcl.dual_beta", params.dual_beta),
                ] {
                    if !(value >= T::zero()) {
                        return Err(SolverError::invalid_configuration(
                            "tolerance exponents must be non-negative",
                            name,
                            value,
                        ));
                    }
                }
            }
        }

        self.line_search.validate()?;

        let reg = &self.regularization;
        positive("regularization.min", reg.min)?;
        if !(reg.nonzero_init >= reg.min && reg.max > reg.nonzero_init) {
            return Err(SolverError::invalid_configuration(
                "regularization bounds must satisfy min <= nonzero_init < max",
                "regularization.nonzero_init",
                reg.nonzero_init,
            ));
        }
        greater_than_one("regularization.inc_factor", reg.inc_factor)?;
        greater_than_one("regularization.inc_factor_big", reg.inc_factor_big)?;
        unit_interval("regularization.dec_factor", reg.dec_factor)?;
        Ok(())
    }
}

fn positive<T: Scalar>(name: &str, value: T) -> SolverResult<()> {
    if value > T::zero() {
        Ok(())
    } else {
        Err(SolverError::invalid_configuration(
            format!("{name} must be positive"),
            name,
            value,
        ))
    }
}

fn greater_than_one<T: Scalar>(name: &str, value: T) -> SolverResult<()> {
    if value > T::one() {
        Ok(())
    } else {
        Err(SolverError::invalid_configuration(
            format!("{name} must be greater than 1"),
            name,
            value,
        ))
    }
}

pub(crate) fn unit_interval<T: Scalar>(name: &str, value: T) -> SolverResult<()> {
    if value > T::zero() && value < T::one() {
        Ok(())
    } else {
        Err(SolverError::invalid_configuration(
            format!("{name} must be in (0, 1)"),
            name,
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::<f64>::default();
        assert_eq!(config.tol, 1e-6);
        assert_eq!(config.mu_init, 10.0);
        assert_eq!(config.mu_upper, 1e8);
        assert_eq!(config.rho_init, 0.0);
        assert_eq!(config.max_iters, 100);
        assert_eq!(config.inner_tol, 1e-8);
        assert_eq!(config.verbose, VerboseLevel::Quiet);
        assert!(config.use_gauss_newton);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SolverConfig::<f64>::new()
            .with_mu_init(1.0)
            .with_proximal(1e-3, 0.5)
            .with_max_inner_iters(20)
            .with_gauss_newton(false)
            .with_penalty_update(PenaltyUpdate::Bcl(BclParams::default()));
        assert_eq!(config.mu_init, 1.0);
        assert_eq!(config.rho_init, 1e-3);
        assert_eq!(config.max_inner_iters, 20);
        assert!(!config.use_gauss_newton);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            (SolverConfig::<f64>::new().with_mu_init(0.0), "mu_init"),
            (SolverConfig::new().with_tolerance(-1.0), "tol"),
            (SolverConfig::new().with_max_iters(0), "max_iters"),
            (SolverConfig::new().with_mu_upper(1.0), "mu_upper"),
            (
                SolverConfig::new().with_penalty_update(PenaltyUpdate::ViolationRatio {
                    factor: 10.0,
                    ratio: 1.5,
                }),
                "penalty_update.ratio",
            ),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(SolverError::InvalidConfiguration { parameter, .. }) => {
                    assert_eq!(parameter, expected)
                }
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nan_rejected() {
        let config = SolverConfig::<f64>::new().with_mu_init(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_verbose_ordering() {
        assert!(VerboseLevel::Quiet < VerboseLevel::Verbose);
        assert!(VerboseLevel::Verbose < VerboseLevel::VeryVerbose);
    }
}
