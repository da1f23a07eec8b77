//! Weighted squared distance to a target point.

use crate::{
    core::{
        error::{check_shape, Result},
        manifold::{DifferenceArg, Manifold},
        types::{DMatrix, DVector, Scalar},
    },
    functions::cost_function::CostFunction,
};
use std::sync::Arc;

/// Quadratic distance cost `f(x) = ½ dᵀ W d` with `d = target ⊖ x`.
///
/// On a flat space `d = x − x̄`, so the gradient is `W(x − x̄)` and the
/// Hessian is `W`. On curved spaces the Hessian is the Gauss-Newton term
/// `Jᵀ W J` with `J` the Jacobian of the difference.
///
/// # Example
///
/// ```
/// use proxopt_core::prelude::*;
/// use std::sync::Arc;
///
/// let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
/// let target = DVector::from_vec(vec![1.0, 2.0]);
/// let cost = QuadraticDistanceCost::with_target(space, target.clone()).unwrap();
///
/// assert_eq!(cost.evaluate(&target).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct QuadraticDistanceCost<T: Scalar> {
    space: Arc<dyn Manifold<T>>,
    target: DVector<T>,
    weights: DMatrix<T>,
}

impl<T: Scalar> QuadraticDistanceCost<T> {
    /// Creates the cost with an explicit target and weight matrix.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `target` is not a point of `space` or
    /// `weights` is not `ndx × ndx`.
    pub fn new(space: Arc<dyn Manifold<T>>, target: DVector<T>, weights: DMatrix<T>) -> Result<Self> {
        space.check_point(&target)?;
        check_shape("cost weights", (space.ndx(), space.ndx()), weights.shape())?;
        Ok(Self {
            space,
            target,
            weights,
        })
    }

    /// Creates the cost with identity weights.
    pub fn with_target(space: Arc<dyn Manifold<T>>, target: DVector<T>) -> Result<Self> {
        let ndx = space.ndx();
        Self::new(space, target, DMatrix::identity(ndx, ndx))
    }

    /// Creates the cost targeting the neutral element with identity weights.
    pub fn at_neutral(space: Arc<dyn Manifold<T>>) -> Result<Self> {
        let target = space.neutral();
        Self::with_target(space, target)
    }

    /// The target point.
    pub fn target(&self) -> &DVector<T> {
        &self.target
    }

    /// Moves the target point.
    pub fn update_target(&mut self, target: DVector<T>) -> Result<()> {
        self.space.check_point(&target)?;
        self.target = target;
        Ok(())
    }

    /// The weight matrix.
    pub fn weights(&self) -> &DMatrix<T> {
        &self.weights
    }

    fn offset(&self, x: &DVector<T>) -> Result<DVector<T>> {
        self.space.differenced(&self.target, x)
    }

    fn offset_jacobian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        let ndx = self.space.ndx();
        let mut jac = DMatrix::zeros(ndx, ndx);
        self.space
            .difference_jacobian(&self.target, x, DifferenceArg::Second, &mut jac)?;
        Ok(jac)
    }
}

impl<T: Scalar> CostFunction<T> for QuadraticDistanceCost<T> {
    fn nx(&self) -> usize {
        self.space.nx()
    }

    fn ndx(&self) -> usize {
        self.space.ndx()
    }

    fn evaluate(&self, x: &DVector<T>) -> Result<T> {
        let d = self.offset(x)?;
        let wd = &self.weights * &d;
        Ok(<T as Scalar>::from_f64(0.5) * d.dot(&wd))
    }

    fn compute_gradient(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        self.check_gradient(out)?;
        let d = self.offset(x)?;
        let wd = &self.weights * &d;
        if self.space.is_flat() {
            out.copy_from(&wd);
        } else {
            let jac = self.offset_jacobian(x)?;
            out.gemv_tr(T::one(), &jac, &wd, T::zero());
        }
        Ok(())
    }

    fn compute_hessian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.check_input(x)?;
        self.check_hessian(out)?;
        if self.space.is_flat() {
            out.copy_from(&self.weights);
        } else {
            let jac = self.offset_jacobian(x)?;
            let wj = &self.weights * &jac;
            out.gemm_tr(T::one(), &jac, &wj, T::zero());
        }
        Ok(())
    }
}
