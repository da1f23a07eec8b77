//! A residual paired with the set it is constrained to.

use crate::{
    constraints::{
        box_constraint::BoxConstraint,
        equality::EqualityConstraint,
        negative_orthant::NegativeOrthant,
        set::{ConstraintKind, ConstraintSet},
    },
    core::{
        error::{check_len, Result},
        types::{DVector, Scalar},
    },
    functions::residual::ResidualFunction,
};
use std::sync::Arc;

/// Constraint `r(x) ∈ C`.
///
/// The residual is shared (the same function may back a cost term and a
/// constraint); the set is owned.
#[derive(Debug, Clone)]
pub struct Constraint<T: Scalar> {
    residual: Arc<dyn ResidualFunction<T>>,
    set: Arc<dyn ConstraintSet<T>>,
}

impl<T: Scalar> Constraint<T> {
    /// Pairs a residual with an arbitrary constraint set.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the set has an intrinsic dimension
    /// different from the residual output dimension.
    pub fn new(
        residual: Arc<dyn ResidualFunction<T>>,
        set: Box<dyn ConstraintSet<T>>,
    ) -> Result<Self> {
        if let Some(dim) = set.dim() {
            check_len("constraint set", residual.nr(), dim)?;
        }
        Ok(Self {
            residual,
            set: Arc::from(set),
        })
    }

    /// Equality constraint `r(x) = 0`.
    pub fn equality(residual: Arc<dyn ResidualFunction<T>>) -> Self {
        Self {
            residual,
            set: Arc::new(EqualityConstraint),
        }
    }

    /// Inequality constraint `r(x) ≤ 0`.
    pub fn negative_orthant(residual: Arc<dyn ResidualFunction<T>>) -> Self {
        Self {
            residual,
            set: Arc::new(NegativeOrthant),
        }
    }

    /// Box constraint `lower ≤ r(x) ≤ upper`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are invalid or do not match the residual.
    pub fn boxed(
        residual: Arc<dyn ResidualFunction<T>>,
        lower: DVector<T>,
        upper: DVector<T>,
    ) -> Result<Self> {
        let set = BoxConstraint::new(lower, upper)?;
        Self::new(residual, Box::new(set))
    }

    /// The constrained residual.
    pub fn residual(&self) -> &Arc<dyn ResidualFunction<T>> {
        &self.residual
    }

    /// The constraint set.
    pub fn set(&self) -> &dyn ConstraintSet<T> {
        self.set.as_ref()
    }

    /// Kind of the constraint set.
    pub fn kind(&self) -> ConstraintKind {
        self.set.kind()
    }

    /// Output dimension of the residual (size of the multiplier).
    pub fn nr(&self) -> usize {
        self.residual.nr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::types::DMatrix, functions::linear::LinearResidual};

    fn residual(nr: usize) -> Arc<dyn ResidualFunction<f64>> {
        Arc::new(LinearResidual::from_matrix(DMatrix::identity(nr, 2)).unwrap())
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Constraint::equality(residual(2)).kind(), ConstraintKind::Equality);
        assert_eq!(
            Constraint::negative_orthant(residual(1)).kind(),
            ConstraintKind::NegativeOrthant
        );
        let boxed = Constraint::boxed(residual(2), DVector::zeros(2), DVector::repeat(2, 1.0)).unwrap();
        assert_eq!(boxed.kind(), ConstraintKind::Box);
        assert_eq!(boxed.nr(), 2);
    }

    #[test]
    fn test_box_dimension_must_match_residual() {
        let result = Constraint::boxed(residual(2), DVector::zeros(3), DVector::repeat(3, 1.0));
        assert!(result.is_err());
    }
}
