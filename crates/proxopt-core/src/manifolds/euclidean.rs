//! Flat Euclidean space ℝⁿ.
//!
//! Points and tangent vectors share the same representation (`nx == ndx`),
//! the retraction is vector addition and the difference is subtraction.

use crate::core::{
    error::Result,
    manifold::{DifferenceArg, Manifold},
    types::{DMatrix, DVector, Scalar},
};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

/// Euclidean space of a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EuclideanSpace {
    dim: usize,
}

impl EuclideanSpace {
    /// Creates the space ℝ^`dim`.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Dimension of the space.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl<T: Scalar> Manifold<T> for EuclideanSpace {
    fn name(&self) -> &str {
        "Euclidean"
    }

    fn nx(&self) -> usize {
        self.dim
    }

    fn ndx(&self) -> usize {
        self.dim
    }

    fn neutral(&self) -> DVector<T> {
        DVector::zeros(self.dim)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        DVector::from_fn(self.dim, |_, _| {
            let sample: f64 = StandardNormal.sample(&mut *rng);
            <T as Scalar>::from_f64(sample)
        })
    }

    fn retract(&self, x: &DVector<T>, v: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        Manifold::<T>::check_point(self, x)?;
        Manifold::<T>::check_tangent(self, v)?;
        Manifold::<T>::check_point(self, out)?;
        out.copy_from(x);
        *out += v;
        Ok(())
    }

    fn difference(&self, x: &DVector<T>, y: &DVector<T>, out: &mut DVector<T>) -> Result<()> {
        Manifold::<T>::check_point(self, x)?;
        Manifold::<T>::check_point(self, y)?;
        Manifold::<T>::check_tangent(self, out)?;
        out.copy_from(y);
        *out -= x;
        Ok(())
    }

    fn difference_jacobian(
        &self,
        x: &DVector<T>,
        y: &DVector<T>,
        arg: DifferenceArg,
        out: &mut DMatrix<T>,
    ) -> Result<()> {
        Manifold::<T>::check_point(self, x)?;
        Manifold::<T>::check_point(self, y)?;
        Manifold::<T>::check_tangent_matrix(self, out)?;
        out.fill_with_identity();
        if arg == DifferenceArg::First {
            out.neg_mut();
        }
        Ok(())
    }

    fn is_flat(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ModelError;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_euclidean_basic_properties() {
        let space = EuclideanSpace::new(3);
        assert_eq!(Manifold::<f64>::name(&space), "Euclidean");
        assert_eq!(Manifold::<f64>::nx(&space), 3);
        assert_eq!(Manifold::<f64>::ndx(&space), 3);
        assert!(Manifold::<f64>::is_flat(&space));
        assert_eq!(Manifold::<f64>::neutral(&space), DVector::zeros(3));
    }

    #[test]
    fn test_retract_and_difference_are_inverse() {
        let space = EuclideanSpace::new(2);
        let x = DVector::from_vec(vec![1.0, -2.0]);
        let y = DVector::from_vec(vec![0.5, 4.0]);

        let d = space.differenced(&x, &y).unwrap();
        assert_relative_eq!(d, DVector::from_vec(vec![-0.5, 6.0]));

        let back = space.retracted(&x, &d).unwrap();
        assert_relative_eq!(back, y);
    }

    #[test]
    fn test_difference_jacobians() {
        let space = EuclideanSpace::new(2);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        let y = DVector::from_vec(vec![3.0, 4.0]);
        let mut jac = DMatrix::zeros(2, 2);

        space
            .difference_jacobian(&x, &y, DifferenceArg::Second, &mut jac)
            .unwrap();
        assert_eq!(jac, DMatrix::identity(2, 2));

        space
            .difference_jacobian(&x, &y, DifferenceArg::First, &mut jac)
            .unwrap();
        assert_eq!(jac, -DMatrix::<f64>::identity(2, 2));
    }

    #[test]
    fn test_dimension_mismatch() {
        let space = EuclideanSpace::new(2);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = space.retracted(&x, &v).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_random_point_is_seeded() {
        let space = EuclideanSpace::new(4);
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a: DVector<f64> = space.random_point(&mut rng_a);
        let b: DVector<f64> = space.random_point(&mut rng_b);
        assert_eq!(a.len(), 4);
        assert_eq!(a, b);
    }
}
