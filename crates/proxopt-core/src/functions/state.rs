//! State residual `r(x) = target ⊖ x`.

use crate::{
    core::{
        error::Result,
        manifold::{DifferenceArg, Manifold},
        types::{DMatrix, DVector, Scalar},
    },
    functions::residual::ResidualFunction,
};
use std::sync::Arc;

/// Residual measuring the tangent-space offset of a point from a target.
///
/// On a flat space this is `x − target`. The output lives in the tangent
/// space at the target, so `nr == ndx`.
#[derive(Debug, Clone)]
pub struct StateResidual<T: Scalar> {
    space: Arc<dyn Manifold<T>>,
    target: DVector<T>,
}

impl<T: Scalar> StateResidual<T> {
    /// Creates the residual anchored at `target`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `target` is not a point of `space`.
    pub fn new(space: Arc<dyn Manifold<T>>, target: DVector<T>) -> Result<Self> {
        space.check_point(&target)?;
        Ok(Self { space, target })
    }

    /// The anchor point.
    pub fn target(&self) -> &DVector<T> {
        &self.target
    }

    /// Moves the anchor point.
    pub fn update_target(&mut self, target: DVector<T>) -> Result<()> {
        self.space.check_point(&target)?;
        self.target = target;
        Ok(())
    }
}

impl<T: Scalar> ResidualFunction<T> for StateResidual<T> {
    fn nx(&self) -> usize {
        self.space.nx()
    }

    fn ndx(&self) -> usize {
        self.space.ndx()
    }

    fn nr(&self) -> usize {
        self.space.ndx()
    }

    fn evaluate_into(&self, x: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        self.space.difference(&self.target, x, out)
    }

    fn compute_jacobian(&self, x: &DVector<T>, out: &mut DMatrix<T>) -> Result<()> {
        self.space
            .difference_jacobian(&self.target, x, DifferenceArg::Second, out)
    }
}
