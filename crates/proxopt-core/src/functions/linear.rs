//! Affine residuals `r(x) = A·x + b`.

use crate::{
    core::{
        error::{check_len, ModelError, Result},
        types::{DMatrix, DVector, Scalar},
    },
    functions::residual::ResidualFunction,
};

/// Affine residual on a flat space.
///
/// The Jacobian is the constant matrix `A` and all second derivatives vanish,
/// so the default vector-Hessian product applies.
///
/// # Example
///
/// ```
/// use proxopt_core::prelude::*;
///
/// let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
/// let b = DVector::from_vec(vec![-1.0]);
/// let res = LinearResidual::new(a, b).unwrap();
///
/// let x = DVector::from_vec(vec![0.25, 0.75]);
/// assert_eq!(res.evaluate(&x).unwrap()[0], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearResidual<T: Scalar> {
    mat: DMatrix<T>,
    b: DVector<T>,
}

impl<T: Scalar> LinearResidual<T> {
    /// Creates the residual `A·x + b`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `b` does not have one entry per row of `A`.
    pub fn new(mat: DMatrix<T>, b: DVector<T>) -> Result<Self> {
        check_len("affine offset", mat.nrows(), b.len())?;
        if mat.nrows() == 0 {
            return Err(ModelError::invalid_parameter(
                "affine residual must have at least one row",
            ));
        }
        Ok(Self { mat, b })
    }

    /// Creates the linear residual `A·x` (zero offset).
    pub fn from_matrix(mat: DMatrix<T>) -> Result<Self> {
        let b = DVector::zeros(mat.nrows());
        Self::new(mat, b)
    }

    /// The matrix `A`.
    pub fn matrix(&self) -> &DMatrix<T> {
        &self.mat
    }

    /// The offset `b`.
    pub fn offset(&self) -> &DVector<T> {
        &self.b
    }
}

impl<T: Scalar> ResidualFunction<T> for LinearResidual<T> {
    fn nx(&self) -> usize {
        self.mat.ncols()
    }

    fn ndx(&self) -> usize {
        self.mat.ncols()
    }

    fn nr(&self) -> usize {
        self.mat.nrows()
    }

    fn evaluate_into(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        self.check_input(x)?;
        self.check_output(out)?;
        out.copy_from(&self.b);
        out.gemv(T::one(), &self.mat, x, T::one());
        Ok(())
    }

    fn compute_jacobian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.check_input(x)?;
        self.check_jacobian(out)?;
        out.copy_from(&self.mat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ModelError;
    use approx::assert_relative_eq;

    #[test]
    fn test_affine_evaluation() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, -1.0, 0.5]);
        let b = DVector::from_vec(vec![1.0, -1.0]);
        let res = LinearResidual::new(a, b).unwrap();

        let x = DVector::from_vec(vec![2.0, 1.0]);
        let r = res.evaluate(&x).unwrap();
        assert_relative_eq!(r, DVector::from_vec(vec![5.0, -2.5]));
        assert_eq!(res.nr(), 2);
        assert_eq!(res.nx(), 2);
    }

    #[test]
    fn test_jacobian_is_constant() {
        let a = DMatrix::from_row_slice(1, 3, &[0.3, -1.0, 2.0]);
        let res = LinearResidual::from_matrix(a.clone()).unwrap();
        for x in [
            DVector::zeros(3),
            DVector::from_vec(vec![10.0, -4.0, 3.0]),
        ] {
            assert_eq!(res.jacobian(&x).unwrap(), a);
        }
    }

    #[test]
    fn test_vector_hessian_product_is_zero() {
        let res = LinearResidual::new(
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            DVector::from_vec(vec![0.0]),
        )
        .unwrap();
        let mut out = DMatrix::from_element(2, 2, 3.0);
        res.compute_vector_hessian_product(
            &DVector::from_vec(vec![1.0, 2.0]),
            &DVector::from_vec(vec![4.0]),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, DMatrix::zeros(2, 2));
    }

    #[test]
    fn test_invalid_construction() {
        let err = LinearResidual::new(DMatrix::<f64>::zeros(2, 2), DVector::zeros(3)).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));

        let res = LinearResidual::from_matrix(DMatrix::<f64>::identity(2, 2)).unwrap();
        let mut out = DVector::zeros(3);
        assert!(res.evaluate_into(&DVector::zeros(2), &mut out).is_err());
    }
}
