//! Constraint set interface.
//!
//! A constraint restricts the value `z = r(x)` of a residual to a closed
//! convex set C. The solver only needs two operators on C and the derivative
//! of the second one.
//!
//! # Mathematical Background
//!
//! - **Projection** Π_C(z) = argmin_{y ∈ C} ‖y − z‖
//! - **Normal-cone projection** Π_N(z) = z − Π_C(z)
//!
//! Both are piecewise linear for the shipped sets. The generalized Jacobian of
//! Π_N is a diagonal 0/1 matrix whose ones mark the *active* coordinates, the
//! ones along which the constraint currently pushes back.

use crate::core::types::{DMatrix, DVector, Scalar};
use std::fmt::{self, Debug};

/// Kinds of constraint sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintKind {
    /// The zero set `{0}`: `r(x) = 0`.
    Equality,
    /// The non-positive orthant: `r(x) ≤ 0`.
    NegativeOrthant,
    /// A box `lower ≤ r(x) ≤ upper`.
    Box,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equality => "equality",
            Self::NegativeOrthant => "negative orthant",
            Self::Box => "box",
        };
        f.write_str(name)
    }
}

/// Trait for the convex sets a residual can be constrained to.
///
/// `z` and `out` must have the same length in every method; sets without an
/// intrinsic dimension accept any length.
pub trait ConstraintSet<T: Scalar>: Debug + Send + Sync {
    /// The kind of set.
    fn kind(&self) -> ConstraintKind;

    /// Intrinsic dimension, if the set has one.
    fn dim(&self) -> Option<usize> {
        None
    }

    /// Writes the projection of `z` onto the set into `out`.
    fn project_into(&self, z: &DVector<T>, out: &mut DVector<T>);

    /// Writes `z − projection(z)` into `out`.
    fn normal_cone_project_into(&self, z: &DVector<T>, out: &mut DVector<T>) {
        self.project_into(z, out);
        out.zip_apply(z, |o, zi| *o = zi - *o);
    }

    /// Multiplies `jac` on the left by the generalized Jacobian of the
    /// normal-cone projection at `z`, i.e. zeroes the rows of inactive
    /// coordinates.
    fn apply_normal_cone_projection_jacobian(&self, z: &DVector<T>, jac: &mut DMatrix<T>);

    /// Marks the active coordinates at `z` in `out`.
    fn compute_active_set(&self, z: &DVector<T>, out: &mut [bool]);

    /// Whether the solver should use exact second-order terms for residuals
    /// constrained to this set even when Gauss-Newton is requested.
    fn disable_gauss_newton(&self) -> bool {
        false
    }

    /// Allocating projection.
    fn projection(&self, z: &DVector<T>) -> DVector<T> {
        let mut out = DVector::zeros(z.len());
        self.project_into(z, &mut out);
        out
    }

    /// Allocating normal-cone projection.
    fn normal_cone_projection(&self, z: &DVector<T>) -> DVector<T> {
        let mut out = DVector::zeros(z.len());
        self.normal_cone_project_into(z, &mut out);
        out
    }
}

/// Zeroes every row of `jac` whose coordinate is inactive.
pub(crate) fn zero_inactive_rows<T: Scalar>(jac: &mut DMatrix<T>, is_active: impl Fn(usize) -> bool) {
    for i in 0..jac.nrows() {
        if !is_active(i) {
            jac.row_mut(i).fill(T::zero());
        }
    }
}
