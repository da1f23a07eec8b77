//! Box constraints `lower ≤ r(x) ≤ upper`.

use crate::{
    constraints::set::{zero_inactive_rows, ConstraintKind, ConstraintSet},
    core::{
        error::{check_len, ModelError, Result},
        types::{DMatrix, DVector, Scalar},
    },
};
use num_traits::Float;

/// An axis-aligned box.
///
/// The projection clamps each coordinate; a coordinate is active when it lies
/// strictly outside its interval.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxConstraint<T: Scalar> {
    lower: DVector<T>,
    upper: DVector<T>,
}

impl<T: Scalar> BoxConstraint<T> {
    /// Creates the box `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the bounds differ in length and
    /// `InvalidParameter` if some `lower_i > upper_i` or a bound is NaN.
    pub fn new(lower: DVector<T>, upper: DVector<T>) -> Result<Self> {
        check_len("upper bound", lower.len(), upper.len())?;
        for (i, (l, u)) in lower.iter().zip(upper.iter()).enumerate() {
            if <T as Float>::is_nan(*l) || <T as Float>::is_nan(*u) || l > u {
                return Err(ModelError::invalid_parameter(format!(
                    "box bounds at index {i} are invalid: [{l}, {u}]"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Lower bounds.
    pub fn lower(&self) -> &DVector<T> {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &DVector<T> {
        &self.upper
    }

    fn is_active(&self, z: &DVector<T>, i: usize) -> bool {
        z[i] < self.lower[i] || z[i] > self.upper[i]
    }
}

impl<T: Scalar> ConstraintSet<T> for BoxConstraint<T> {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Box
    }

    fn dim(&self) -> Option<usize> {
        Some(self.lower.len())
    }

    fn project_into(&self, z: &DVector<T>, out: &mut DVector<T>) {
        for i in 0..z.len() {
            out[i] = <T as Float>::min(<T as Float>::max(z[i], self.lower[i]), self.upper[i]);
        }
    }

    fn apply_normal_cone_projection_jacobian(&self, z: &DVector<T>, jac: &mut DMatrix<T>) {
        zero_inactive_rows(jac, |i| self.is_active(z, i));
    }

    fn compute_active_set(&self, z: &DVector<T>, out: &mut [bool]) {
        for (i, flag) in out.iter_mut().enumerate() {
            *flag = self.is_active(z, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> BoxConstraint<f64> {
        BoxConstraint::new(
            DVector::from_vec(vec![-1.0, 0.0]),
            DVector::from_vec(vec![1.0, 2.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_box_projection() {
        let set = unit_box();
        let z = DVector::from_vec(vec![3.0, 1.0]);
        assert_eq!(set.projection(&z), DVector::from_vec(vec![1.0, 1.0]));
        assert_relative_eq!(
            set.normal_cone_projection(&z),
            DVector::from_vec(vec![2.0, 0.0])
        );
        assert_eq!(set.dim(), Some(2));
    }

    #[test]
    fn test_box_active_set() {
        let set = unit_box();
        let z = DVector::from_vec(vec![0.5, -0.5]);
        let mut active = [true; 2];
        set.compute_active_set(&z, &mut active);
        assert_eq!(active, [false, true]);

        let mut jac = DMatrix::from_element(2, 3, 1.0);
        set.apply_normal_cone_projection_jacobian(&z, &mut jac);
        assert_eq!(jac.row(0).sum(), 0.0);
        assert_eq!(jac.row(1).sum(), 3.0);
    }

    #[test]
    fn test_invalid_bounds() {
        let err = BoxConstraint::new(DVector::from_vec(vec![1.0]), DVector::from_vec(vec![0.0]))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { .. }));
        assert!(BoxConstraint::new(DVector::<f64>::zeros(2), DVector::zeros(3)).is_err());
    }
}
