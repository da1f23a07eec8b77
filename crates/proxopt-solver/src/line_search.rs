//! Backtracking line search on the merit function.
//!
//! # Mathematical Foundation
//!
//! Given the current point x, a tangent direction p and the merit function
//! M, the search looks along the retraction curve φ(α) = M(x ⊕ αp) for a
//! step satisfying the Armijo condition
//!
//! ```text
//! φ(α) ≤ φ(0) + c₁ α φ'(0),    φ'(0) = ⟨∇M(x), p⟩ < 0
//! ```
//!
//! starting from the full Newton step α = 1 and shrinking α ← β α. When α
//! falls below `alpha_min` the minimal step is taken anyway so that the
//! inner loop always makes progress.
//!
//! Far from the origin of the merit scale the predicted decrease c₁αφ'(0)
//! can be smaller than the rounding error of φ itself. The test therefore
//! carries a slack `σ ≥ 0` sized to that rounding error:
//!
//! ```text
//! φ(α) ≤ φ(0) + c₁ α φ'(0) + σ
//! ```

use crate::{config::unit_interval, error::SolverResult};
use num_traits::Float;
use proxopt_core::core::types::Scalar;

/// Parameters of the Armijo backtracking search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmijoParams<T: Scalar> {
    /// Armijo constant c₁ ∈ (0, 1) of the sufficient decrease condition.
    pub c1: T,
    /// Backtracking factor β ∈ (0, 1).
    pub beta: T,
    /// Smallest step tried.
    pub alpha_min: T,
}

impl<T: Scalar> Default for ArmijoParams<T> {
    fn default() -> Self {
        Self {
            c1: <T as Scalar>::from_f64(1e-4),
            beta: <T as Scalar>::from_f64(0.5),
            alpha_min: <T as Scalar>::from_f64(1e-7),
        }
    }
}

/// Outcome of a line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchResult<T: Scalar> {
    /// Accepted step size.
    pub alpha: T,
    /// Merit value at the accepted step.
    pub value: T,
    /// Number of merit evaluations.
    pub evaluations: usize,
    /// Whether the Armijo condition holds at the accepted step.
    pub sufficient_decrease: bool,
}

impl<T: Scalar> ArmijoParams<T> {
    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `c1` or `beta` lie outside `(0, 1)`
    /// or `alpha_min` is not in `(0, 1]`.
    pub fn validate(&self) -> SolverResult<()> {
        unit_interval("line_search.c1", self.c1)?;
        unit_interval("line_search.beta", self.beta)?;
        if !(self.alpha_min > T::zero() && self.alpha_min <= T::one()) {
            return Err(crate::error::SolverError::invalid_configuration(
                "line_search.alpha_min must be in (0, 1]",
                "line_search.alpha_min",
                self.alpha_min,
            ));
        }
        Ok(())
    }

    /// Rounding allowance for a merit function whose terms have total
    /// magnitude `scale`.
    pub fn roundoff_slack(scale: T) -> T {
        <T as Scalar>::from_f64(10.0) * <T as Float>::epsilon() * (T::one() + <T as Float>::abs(scale))
    }

    /// Runs the backtracking search.
    ///
    /// `phi` evaluates the merit at a given step size; it is called with
    /// decreasing step sizes and its last call always corresponds to the
    /// accepted step. Non-finite merit values count as insufficient decrease.
    ///
    /// # Arguments
    ///
    /// * `phi0` - Merit value at the current point
    /// * `dphi0` - Directional derivative of the merit along the direction
    /// * `slack` - Rounding allowance added to the sufficient decrease bound
    /// * `phi` - Merit along the retraction curve
    pub fn search<F>(
        &self,
        phi0: T,
        dphi0: T,
        slack: T,
        mut phi: F,
    ) -> SolverResult<LineSearchResult<T>>
    where
        F: FnMut(T) -> SolverResult<T>,
    {
        let mut alpha = T::one();
        let mut evaluations = 0;
        loop {
            let value = phi(alpha)?;
            evaluations += 1;
            let sufficient = <T as Float>::is_finite(value)
                && value <= phi0 + self.c1 * alpha * dphi0 + slack;
            if sufficient || alpha <= self.alpha_min {
                return Ok(LineSearchResult {
                    alpha,
                    value,
                    evaluations,
                    sufficient_decrease: sufficient,
                });
            }
            alpha = <T as Float>::max(self.beta * alpha, self.alpha_min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_step_accepted_on_quadratic() {
        // φ(α) = (1 − α)², minimized by the full step.
        let params = ArmijoParams::<f64>::default();
        let result = params.search(1.0, -2.0, 0.0, |a| Ok((1.0 - a) * (1.0 - a))).unwrap();
        assert_eq!(result.alpha, 1.0);
        assert_eq!(result.evaluations, 1);
        assert!(result.sufficient_decrease);
    }

    #[test]
    fn test_backtracks_on_overshoot() {
        // φ(α) = (1 − 4α)², the full step overshoots.
        let params = ArmijoParams::<f64>::default();
        let result = params
            .search(1.0, -8.0, 0.0, |a| Ok((1.0 - 4.0 * a) * (1.0 - 4.0 * a)))
            .unwrap();
        assert_relative_eq!(result.alpha, 0.25);
        assert!(result.sufficient_decrease);
        assert_eq!(result.evaluations, 3);
    }

    #[test]
    fn test_min_step_taken_when_no_decrease() {
        let params = ArmijoParams {
            c1: 1e-4,
            beta: 0.5,
            alpha_min: 0.1,
        };
        let mut last = 0.0;
        let result = params
            .search(0.0, -1.0, 0.0, |a| {
                last = a;
                Ok(1.0)
            })
            .unwrap();
        assert_eq!(result.alpha, 0.1);
        assert_eq!(last, 0.1);
        assert!(!result.sufficient_decrease);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let params = ArmijoParams::<f64>::default();
        let result = params
            .search(1.0, -1.0, 0.0, |a| Ok(if a > 0.3 { f64::NAN } else { 0.0 }))
            .unwrap();
        assert_relative_eq!(result.alpha, 0.25);
    }

    #[test]
    fn test_slack_absorbs_rounding_of_large_merit() {
        // Merit near 1e10 whose predicted decrease is below its last bit.
        let params = ArmijoParams::<f64>::default();
        let phi0 = 2.5e10;
        let dphi0 = -1e-9;
        let noisy = phi0 + 4.0 * f64::EPSILON * phi0;

        let strict = params.search(phi0, dphi0, 0.0, |_| Ok(noisy)).unwrap();
        assert!(!strict.sufficient_decrease);
        assert_eq!(strict.alpha, params.alpha_min);

        let slack = ArmijoParams::roundoff_slack(phi0);
        let relaxed = params.search(phi0, dphi0, slack, |_| Ok(noisy)).unwrap();
        assert!(relaxed.sufficient_decrease);
        assert_eq!(relaxed.alpha, 1.0);
        assert_eq!(relaxed.evaluations, 1);
    }

    #[test]
    fn test_slack_does_not_hide_real_increase() {
        let params = ArmijoParams::<f64>::default();
        let slack = ArmijoParams::roundoff_slack(1.0);
        // φ(α) = (1 − 4α)² overshoots by far more than the slack.
        let result = params
            .search(1.0, -8.0, slack, |a| Ok((1.0 - 4.0 * a) * (1.0 - 4.0 * a)))
            .unwrap();
        assert_relative_eq!(result.alpha, 0.25);
    }

    #[test]
    fn test_validate() {
        assert!(ArmijoParams::<f64>::default().validate().is_ok());
        let bad = ArmijoParams {
            c1: 1.5,
            ..ArmijoParams::<f64>::default()
        };
        assert!(bad.validate().is_err());
    }
}
