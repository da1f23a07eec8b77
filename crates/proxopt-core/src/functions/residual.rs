//! Residual function interface.
//!
//! A residual maps a manifold point to a vector of size `nr`. Residuals are
//! the building block of constraints (the constraint restricts the residual
//! to a cone or a convex set) and of least-squares cost terms.
//!
//! # Mathematical Background
//!
//! For a residual r: ℳ → ℝ^nr, the Jacobian at x is the `nr × ndx` matrix
//!
//! J(x) = ∂/∂v r(x ⊕ v) |_{v=0}
//!
//! and the vector-Hessian product with a weight vector w ∈ ℝ^nr is the
//! `ndx × ndx` matrix Σ_k w_k ∇²r_k(x). The latter is only needed when the
//! solver runs with exact (non Gauss-Newton) second-order information.

use crate::core::{
    error::{check_len, check_shape, Result},
    types::{DMatrix, DVector, Scalar},
};
use std::fmt::Debug;

/// Trait for differentiable vector-valued functions on a manifold.
///
/// In-place methods write into caller-provided buffers that must already have
/// the right size; the solver calls them on its hot path.
pub trait ResidualFunction<T: Scalar>: Debug + Send + Sync {
    /// Ambient dimension of input points.
    fn nx(&self) -> usize;

    /// Tangent dimension of the input space (number of Jacobian columns).
    fn ndx(&self) -> usize;

    /// Output dimension.
    fn nr(&self) -> usize;

    /// Evaluates the residual at `x`, writing the result into `out`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x` does not have size `nx` or `out`
    /// does not have size `nr`.
    fn evaluate_into(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()>;

    /// Computes the `nr × ndx` Jacobian at `x` into `out`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` on inconsistent sizes.
    fn compute_jacobian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()>;

    /// Computes the vector-Hessian product `Σ_k v_k ∇²r_k(x)` into `out`.
    ///
    /// The default assumes a residual with vanishing second derivatives.
    fn compute_vector_hessian_product(
        &self,
        x: &DVector<T>,
        v: &DVector<T>,
        out: &mut DMatrix<T>,
    ) -> Result<()> {
        self.check_input(x)?;
        check_len("vector-Hessian weights", self.nr(), v.len())?;
        check_shape("vector-Hessian product", (self.ndx(), self.ndx()), out.shape())?;
        out.fill(T::zero());
        Ok(())
    }

    /// Allocating variant of [`ResidualFunction::evaluate_into`].
    fn evaluate(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let mut out = DVector::zeros(self.nr());
        self.evaluate_into(x, &mut out)?;
        Ok(out)
    }

    /// Allocating variant of [`ResidualFunction::compute_jacobian`].
    fn jacobian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        let mut out = DMatrix::zeros(self.nr(), self.ndx());
        self.compute_jacobian(x, &mut out)?;
        Ok(out)
    }

    /// Verifies that `x` has the input dimension of the residual.
    fn check_input(&self, x: &DVector<T>) -> Result<()> {
        check_len("residual input", self.nx(), x.len())
    }

    /// Verifies the sizes of an output value buffer.
    fn check_output(&self, out: &DVector<T>) -> Result<()> {
        check_len("residual output", self.nr(), out.len())
    }

    /// Verifies the shape of a Jacobian buffer.
    fn check_jacobian(&self, out: &DMatrix<T>) -> Result<()> {
        check_shape("residual Jacobian", (self.nr(), self.ndx()), out.shape())
    }
}
