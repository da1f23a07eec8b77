//! Inequality constraints `r(x) ≤ 0`.

use crate::{
    constraints::set::{zero_inactive_rows, ConstraintKind, ConstraintSet},
    core::types::{DMatrix, DVector, Scalar},
};
use num_traits::Float;

/// The non-positive orthant.
///
/// - projection: `min(z, 0)` element-wise
/// - normal-cone projection: `max(z, 0)` element-wise
///
/// A coordinate is active when it is strictly positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegativeOrthant;

impl NegativeOrthant {
    /// Creates the non-positive orthant.
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> ConstraintSet<T> for NegativeOrthant {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::NegativeOrthant
    }

    fn project_into(&self, z: &DVector<T>, out: &mut DVector<T>) {
        out.zip_apply(z, |o, zi| *o = <T as Float>::min(zi, T::zero()));
    }

    fn normal_cone_project_into(&self, z: &DVector<T>, out: &mut DVector<T>) {
        out.zip_apply(z, |o, zi| *o = <T as Float>::max(zi, T::zero()));
    }

    fn apply_normal_cone_projection_jacobian(&self, z: &DVector<T>, jac: &mut DMatrix<T>) {
        zero_inactive_rows(jac, |i| z[i] > T::zero());
    }

    fn compute_active_set(&self, z: &DVector<T>, out: &mut [bool]) {
        for (flag, zi) in out.iter_mut().zip(z.iter()) {
            *flag = *zi > T::zero();
        }
    }
}
