//! Finite-difference checks for analytic derivatives.
//!
//! Perturbations are taken along the retraction, so the checks apply to any
//! manifold: column `j` of a Jacobian is compared with
//!
//! ```text
//! (r(x ⊕ h e_j) − r(x ⊕ −h e_j)) / 2h
//! ```

use crate::{
    core::{
        error::Result,
        manifold::Manifold,
        types::{infty_norm, DVector, Scalar},
    },
    functions::{cost_function::CostFunction, residual::ResidualFunction},
};
use num_traits::Float;

/// Compares analytic derivatives with central finite differences.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeChecker;

impl DerivativeChecker {
    /// Checks a residual Jacobian at `x`.
    ///
    /// # Returns
    ///
    /// A tuple of (passes, max_error) where `max_error` is the largest
    /// entry-wise deviation from the finite-difference Jacobian.
    pub fn check_jacobian<T: Scalar>(
        residual: &dyn ResidualFunction<T>,
        manifold: &dyn Manifold<T>,
        x: &DVector<T>,
        tol: T,
    ) -> Result<(bool, T)> {
        let jac = residual.jacobian(x)?;
        let h = T::FD_STEP;
        let two_h = h + h;
        let mut dir = DVector::zeros(manifold.ndx());
        let mut max_error = T::zero();

        for j in 0..manifold.ndx() {
            dir[j] = h;
            let plus = residual.evaluate(&manifold.retracted(x, &dir)?)?;
            dir[j] = -h;
            let minus = residual.evaluate(&manifold.retracted(x, &dir)?)?;
            dir[j] = T::zero();

            let fd_col = (plus - minus) / two_h;
            let err = infty_norm(&(fd_col - jac.column(j)));
            max_error = <T as Float>::max(max_error, err);
        }

        Ok((max_error < tol, max_error))
    }

    /// Checks a cost gradient at `x`.
    ///
    /// # Returns
    ///
    /// A tuple of (passes, max_error).
    pub fn check_gradient<T: Scalar>(
        cost: &dyn CostFunction<T>,
        manifold: &dyn Manifold<T>,
        x: &DVector<T>,
        tol: T,
    ) -> Result<(bool, T)> {
        let grad = cost.gradient(x)?;
        let h = T::FD_STEP;
        let two_h = h + h;
        let mut dir = DVector::zeros(manifold.ndx());
        let mut max_error = T::zero();

        for j in 0..manifold.ndx() {
            dir[j] = h;
            let plus = cost.evaluate(&manifold.retracted(x, &dir)?)?;
            dir[j] = -h;
            let minus = cost.evaluate(&manifold.retracted(x, &dir)?)?;
            dir[j] = T::zero();

            let fd = (plus - minus) / two_h;
            max_error = <T as Float>::max(max_error, <T as Float>::abs(fd - grad[j]));
        }

        Ok((max_error < tol, max_error))
    }
}
