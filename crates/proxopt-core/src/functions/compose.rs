//! Composition of residuals.

use crate::{
    core::{
        error::{ModelError, Result},
        types::{DMatrix, DVector, Scalar},
    },
    functions::residual::ResidualFunction,
};
use std::sync::Arc;

/// The residual `x ↦ left(right(x))`.
///
/// `left` must be defined on a flat space whose dimension is the output
/// dimension of `right`.
///
/// # Mathematical Background
///
/// With `y = right(x)`, `J_l = ∂left(y)` and `J_r = ∂right(x)`:
///
/// - Jacobian: `J = J_l · J_r`
/// - Vector-Hessian product with weights `v`:
///   `J_rᵀ · H_l(y; v) · J_r + H_r(x; J_lᵀ v)`
#[derive(Debug, Clone)]
pub struct ComposeResidual<T: Scalar> {
    left: Arc<dyn ResidualFunction<T>>,
    right: Arc<dyn ResidualFunction<T>>,
}

impl<T: Scalar> ComposeResidual<T> {
    /// Composes `left ∘ right`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when `left` cannot take the output of `right`.
    pub fn new(
        left: Arc<dyn ResidualFunction<T>>,
        right: Arc<dyn ResidualFunction<T>>,
    ) -> Result<Self> {
        if left.nx() != right.nr() || left.ndx() != right.nr() {
            return Err(ModelError::invalid_parameter(format!(
                "cannot compose residual on ({}, {}) with residual of output size {}",
                left.nx(),
                left.ndx(),
                right.nr()
            )));
        }
        Ok(Self { left, right })
    }

    /// The outer function.
    pub fn left(&self) -> &Arc<dyn ResidualFunction<T>> {
        &self.left
    }

    /// The inner function.
    pub fn right(&self) -> &Arc<dyn ResidualFunction<T>> {
        &self.right
    }
}

impl<T: Scalar> ResidualFunction<T> for ComposeResidual<T> {
    fn nx(&self) -> usize {
        self.right.nx()
    }

    fn ndx(&self) -> usize {
        self.right.ndx()
    }

    fn nr(&self) -> usize {
        self.left.nr()
    }

    fn evaluate_into(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        let inner = self.right.evaluate(x)?;
        self.left.evaluate_into(&inner, out)
    }

    fn compute_jacobian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.check_jacobian(out)?;
        let inner = self.right.evaluate(x)?;
        let jac_left = self.left.jacobian(&inner)?;
        let jac_right = self.right.jacobian(x)?;
        out.gemm(T::one(), &jac_left, &jac_right, T::zero());
        Ok(())
    }

    fn compute_vector_hessian_product(
        &self,
        x: &DVector<T>,
        v: &DVector<T>,
        out: &mut DMatrix<T>,
    ) -> Result<()> {
        let inner = self.right.evaluate(x)?;
        let jac_left = self.left.jacobian(&inner)?;
        let jac_right = self.right.jacobian(x)?;

        let mut hess_left = DMatrix::zeros(self.left.ndx(), self.left.ndx());
        self.left
            .compute_vector_hessian_product(&inner, v, &mut hess_left)?;

        let pulled_weights = jac_left.tr_mul(v);
        self.right
            .compute_vector_hessian_product(x, &pulled_weights, out)?;

        let tmp = &hess_left * &jac_right;
        out.gemm_tr(T::one(), &jac_right, &tmp, T::one());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::linear::LinearResidual;
    use approx::assert_relative_eq;

    #[test]
    fn test_composition_of_affine_maps() {
        let right: Arc<dyn ResidualFunction<f64>> = Arc::new(
            LinearResidual::new(
                DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]),
                DVector::from_vec(vec![1.0, 0.0]),
            )
            .unwrap(),
        );
        let left: Arc<dyn ResidualFunction<f64>> = Arc::new(
            LinearResidual::new(
                DMatrix::from_row_slice(1, 2, &[3.0, -1.0]),
                DVector::from_vec(vec![2.0]),
            )
            .unwrap(),
        );
        let comp = ComposeResidual::new(left, right).unwrap();

        let x = DVector::from_vec(vec![1.0, 1.0]);
        // right(x) = (4, 1), left = 12 - 1 + 2
        assert_relative_eq!(comp.evaluate(&x).unwrap()[0], 13.0);
        let jac = comp.jacobian(&x).unwrap();
        assert_relative_eq!(jac, DMatrix::from_row_slice(1, 2, &[3.0, 5.0]));
    }

    #[test]
    fn test_incompatible_composition() {
        let right: Arc<dyn ResidualFunction<f64>> =
            Arc::new(LinearResidual::from_matrix(DMatrix::identity(3, 2)).unwrap());
        let left: Arc<dyn ResidualFunction<f64>> =
            Arc::new(LinearResidual::from_matrix(DMatrix::identity(1, 2)).unwrap());
        assert!(ComposeResidual::new(left, right).is_err());
    }
}
