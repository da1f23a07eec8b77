//! Equality constraints `r(x) = 0`.

use crate::{
    constraints::set::{ConstraintKind, ConstraintSet},
    core::types::{DMatrix, DVector, Scalar},
};

/// The zero cone `{0}`.
///
/// Its projection is identically zero and its normal-cone projection is the
/// identity, so every coordinate is always active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqualityConstraint;

impl EqualityConstraint {
    /// Creates the zero cone.
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> ConstraintSet<T> for EqualityConstraint {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Equality
    }

    fn project_into(&self, _z: &DVector<T>, out: &mut DVector<T>) {
        out.fill(T::zero());
    }

    fn normal_cone_project_into(&self, z: &DVector<T>, out: &mut DVector<T>) {
        out.copy_from(z);
    }

    fn apply_normal_cone_projection_jacobian(&self, _z: &DVector<T>, _jac: &mut DMatrix<T>) {}

    fn compute_active_set(&self, _z: &DVector<T>, out: &mut [bool]) {
        out.fill(true);
    }
}
