//! Cost function interface.
//!
//! # Mathematical Background
//!
//! A cost f: ℳ → ℝ is differentiated along tangent perturbations:
//!
//! - gradient: ∇f(x) ∈ ℝ^ndx with ∇f(x)ᵀv = d/dt f(x ⊕ tv) at t = 0
//! - Hessian: an `ndx × ndx` symmetric matrix, exact or a Gauss-Newton
//!   approximation that is positive semi-definite.

use crate::core::{
    error::{check_len, check_shape, Result},
    types::{DMatrix, DVector, Scalar},
};
use std::fmt::Debug;

/// Trait for scalar objectives on a manifold.
pub trait CostFunction<T: Scalar>: Debug + Send + Sync {
    /// Ambient dimension of input points.
    fn nx(&self) -> usize;

    /// Tangent dimension of the input space.
    fn ndx(&self) -> usize;

    /// Evaluates the cost at `x`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x` does not have size `nx`.
    fn evaluate(&self, x: &DVector<T>) -> Result<T>;

    /// Computes the gradient at `x` into `out` (size `ndx`).
    fn compute_gradient(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()>;

    /// Computes the Hessian (or its Gauss-Newton approximation) at `x` into
    /// `out` (`ndx × ndx`).
    fn compute_hessian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()>;

    /// Allocating gradient.
    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let mut out = DVector::zeros(self.ndx());
        self.compute_gradient(x, &mut out)?;
        Ok(out)
    }

    /// Allocating Hessian.
    fn hessian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        let mut out = DMatrix::zeros(self.ndx(), self.ndx());
        self.compute_hessian(x, &mut out)?;
        Ok(out)
    }

    /// Evaluates the cost and its gradient.
    fn cost_and_gradient(&self, x: &DVector<T>) -> Result<(T, DVector<T>)> {
        let value = self.evaluate(x)?;
        let grad = self.gradient(x)?;
        Ok((value, grad))
    }

    /// Verifies that `x` has the input dimension of the cost.
    fn check_input(&self, x: &DVector<T>) -> Result<()> {
        check_len("cost input", self.nx(), x.len())
    }

    /// Verifies the size of a gradient buffer.
    fn check_gradient(&self, out: &DVector<T>) -> Result<()> {
        check_len("cost gradient", self.ndx(), out.len())
    }

    /// Verifies the shape of a Hessian buffer.
    fn check_hessian(&self, out: &DMatrix<T>) -> Result<()> {
        check_shape("cost Hessian", (self.ndx(), self.ndx()), out.shape())
    }
}
