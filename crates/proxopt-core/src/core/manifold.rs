//! Core manifold trait.
//!
//! The solver never manipulates points with plain vector arithmetic. Every
//! move goes through the manifold's retraction and every comparison between
//! two points goes through its difference operator, so the same engine works
//! on flat spaces and on spaces with internal constraints (rotations, unit
//! quaternions, ...).
//!
//! # Mathematical Background
//!
//! A manifold ℳ of ambient dimension `nx` is equipped with:
//! - **Tangent spaces** T_x ℳ of dimension `ndx` (`ndx ≤ nx`)
//! - **Retraction** R_x: T_x ℳ → ℳ, written `x ⊕ v`, with R_x(0) = x
//! - **Difference** `x ⊖ y ∈ T_x ℳ`, the local inverse of the retraction:
//!   `x ⊕ (x ⊖ y) = y`
//!
//! Residuals and costs express their derivatives with respect to tangent
//! perturbations, so Jacobians always have `ndx` columns.

use crate::core::{
    error::{check_len, check_shape, Result},
    types::{DMatrix, DVector, Scalar},
};
use rand::RngCore;
use std::fmt::Debug;

/// Selects the argument of [`Manifold::difference`] a Jacobian refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceArg {
    /// Derivative with respect to the base point `x` of `x ⊖ y`.
    First,
    /// Derivative with respect to the target point `y` of `x ⊖ y`.
    Second,
}

/// Trait for the spaces optimization variables live in.
///
/// Implementations must keep the following properties:
///
/// 1. **Closure**: retracting a valid point along any tangent vector yields a
///    valid point.
/// 2. **Identity**: `retract(x, 0) = x` and `difference(x, x) = 0`.
/// 3. **Inverse**: `retract(x, difference(x, y)) = y` wherever the difference
///    is defined.
///
/// All in-place operations write into caller-provided buffers so that the
/// solver can run its inner loop without allocating.
pub trait Manifold<T: Scalar>: Debug + Send + Sync {
    /// Returns a human-readable name for the manifold.
    fn name(&self) -> &str;

    /// Ambient dimension `nx` of point representations.
    fn nx(&self) -> usize;

    /// Dimension `ndx` of tangent vectors.
    fn ndx(&self) -> usize;

    /// Neutral element (origin) of the manifold.
    fn neutral(&self) -> DVector<T>;

    /// Draws a random point on the manifold.
    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T>;

    /// Moves from `x` along the tangent vector `v`, writing `x ⊕ v` into `out`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x`, `v` or `out` have inconsistent sizes.
    fn retract(&self, x: &DVector<T>, v: &DVector<T>, out: &mut DVector<T>) -> Result<()>;

    /// Writes the tangent vector `x ⊖ y` representing `y` relative to `x`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `x`, `y` or `out` have inconsistent sizes.
    fn difference(&self, x: &DVector<T>, y: &DVector<T>, out: &mut DVector<T>) -> Result<()>;

    /// Jacobian of `x ⊖ y` with respect to one of its arguments, an
    /// `ndx × ndx` matrix.
    fn difference_jacobian(
        &self,
        x: &DVector<T>,
        y: &DVector<T>,
        arg: DifferenceArg,
        out: &mut DMatrix<T>,
    ) -> Result<()>;

    /// Checks if the manifold is flat (retraction is vector addition).
    fn is_flat(&self) -> bool {
        false
    }

    /// Allocating variant of [`Manifold::retract`].
    fn retracted(&self, x: &DVector<T>, v: &DVector<T>) -> Result<DVector<T>> {
        let mut out = DVector::zeros(self.nx());
        self.retract(x, v, &mut out)?;
        Ok(out)
    }

    /// Allocating variant of [`Manifold::difference`].
    fn differenced(&self, x: &DVector<T>, y: &DVector<T>) -> Result<DVector<T>> {
        let mut out = DVector::zeros(self.ndx());
        self.difference(x, y, &mut out)?;
        Ok(out)
    }

    /// Verifies that `x` has the ambient dimension of the manifold.
    fn check_point(&self, x: &DVector<T>) -> Result<()> {
        check_len("manifold point", self.nx(), x.len())
    }

    /// Verifies that `v` has the tangent dimension of the manifold.
    fn check_tangent(&self, v: &DVector<T>) -> Result<()> {
        check_len("tangent vector", self.ndx(), v.len())
    }

    /// Verifies that `m` is an `ndx × ndx` matrix.
    fn check_tangent_matrix(&self, m: &DMatrix<T>) -> Result<()> {
        check_shape("tangent-space matrix", (self.ndx(), self.ndx()), m.shape())
    }
}
