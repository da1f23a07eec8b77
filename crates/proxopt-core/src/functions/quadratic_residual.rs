//! Quadratic penalty on a residual.

use crate::{
    core::{
        error::{check_len, check_shape, Result},
        types::{DMatrix, DVector, Scalar},
    },
    functions::{cost_function::CostFunction, residual::ResidualFunction},
};
use std::sync::Arc;

/// Cost `f(x) = ½ r(x)ᵀ W r(x) + slopeᵀ r(x) + c`.
///
/// With `J` the residual Jacobian and `w = W r + slope`:
/// - gradient `Jᵀ w`
/// - Hessian `Jᵀ W J + Σ_k w_k ∇²r_k`
#[derive(Debug, Clone)]
pub struct QuadraticResidualCost<T: Scalar> {
    residual: Arc<dyn ResidualFunction<T>>,
    weights: DMatrix<T>,
    slope: DVector<T>,
    constant: T,
    gauss_newton: bool,
}

impl<T: Scalar> QuadraticResidualCost<T> {
    /// Creates the cost with weights `W`, linear term `slope` and constant `c`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `weights` is not `nr × nr` or `slope`
    /// does not have size `nr`.
    pub fn new(
        residual: Arc<dyn ResidualFunction<T>>,
        weights: DMatrix<T>,
        slope: DVector<T>,
        constant: T,
    ) -> Result<Self> {
        let nr = residual.nr();
        check_shape("residual cost weights", (nr, nr), weights.shape())?;
        check_len("residual cost slope", nr, slope.len())?;
        Ok(Self {
            residual,
            weights,
            slope,
            constant,
            gauss_newton: true,
        })
    }

    /// Creates the least-squares cost `½ r(x)ᵀ W r(x)`.
    pub fn least_squares(residual: Arc<dyn ResidualFunction<T>>, weights: DMatrix<T>) -> Result<Self> {
        let slope = DVector::zeros(residual.nr());
        Self::new(residual, weights, slope, T::zero())
    }

    /// Includes the residual's second-order terms in the Hessian.
    pub fn with_exact_hessian(mut self) -> Self {
        self.gauss_newton = false;
        self
    }

    /// The underlying residual.
    pub fn residual(&self) -> &Arc<dyn ResidualFunction<T>> {
        &self.residual
    }

    fn weighted_residual(&self, r: &DVector<T>) -> DVector<T> {
        let mut w = self.slope.clone();
        w.gemv(T::one(), &self.weights, r, T::one());
        w
    }
}

impl<T: Scalar> CostFunction<T> for QuadraticResidualCost<T> {
    fn nx(&self) -> usize {
        self.residual.nx()
    }

    fn ndx(&self) -> usize {
        self.residual.ndx()
    }

    fn evaluate(&self, x: &DVector<T>) -> Result<T> {
        let r = self.residual.evaluate(x)?;
        let wr = &self.weights * &r;
        Ok(<T as Scalar>::from_f64(0.5) * r.dot(&wr) + self.slope.dot(&r) + self.constant)
    }

    fn compute_gradient(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        self.check_gradient(out)?;
        let r = self.residual.evaluate(x)?;
        let jac = self.residual.jacobian(x)?;
        let w = self.weighted_residual(&r);
        out.gemv_tr(T::one(), &jac, &w, T::zero());
        Ok(())
    }

    fn compute_hessian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.check_hessian(out)?;
        let jac = self.residual.jacobian(x)?;
        if self.gauss_newton {
            out.fill(T::zero());
        } else {
            let r = self.residual.evaluate(x)?;
            let w = self.weighted_residual(&r);
            self.residual.compute_vector_hessian_product(x, &w, out)?;
        }
        let wj = &self.weights * &jac;
        out.gemm_tr(T::one(), &jac, &wj, T::one());
        Ok(())
    }
}
