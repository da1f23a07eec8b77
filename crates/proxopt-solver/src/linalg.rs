//! Regularized dense factorization of the Newton matrix.
//!
//! The inner loop solves `(H + δI) p = −g` where `H` is the (Gauss-Newton)
//! Hessian of the merit function. When `H` is not positive definite the
//! Cholesky factorization fails and the shift `δ` is increased following
//! [`RegularizationParams`]. The factor storage is reused between Newton
//! steps.

use crate::config::RegularizationParams;
use nalgebra::{Cholesky, Dyn};
use num_traits::Float;
use proxopt_core::core::types::{infty_norm, DMatrix, DVector, Scalar};

/// Cholesky factorization of `H + δI` with its shift.
#[derive(Debug, Clone)]
pub(crate) struct RegularizedCholesky<T: Scalar> {
    dim: usize,
    factor: Option<Cholesky<T, Dyn>>,
    delta: T,
    delta_last: T,
}

impl<T: Scalar> RegularizedCholesky<T> {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            factor: None,
            delta: T::zero(),
            delta_last: T::zero(),
        }
    }

    /// Forgets the factorization and the last successful shift.
    pub(crate) fn reset(&mut self) {
        self.factor = None;
        self.delta = T::zero();
        self.delta_last = T::zero();
    }

    /// Shift used by the current factorization.
    pub(crate) fn delta(&self) -> T {
        self.delta
    }

    fn try_factorize(&mut self, mat: &DMatrix<T>, delta: T) -> bool {
        let mut storage = match self.factor.take() {
            Some(chol) => chol.unpack_dirty(),
            None => DMatrix::zeros(self.dim, self.dim),
        };
        storage.copy_from(mat);
        if delta > T::zero() {
            for i in 0..self.dim {
                storage[(i, i)] += delta;
            }
        }
        self.factor = Cholesky::new(storage);
        self.factor.is_some()
    }

    /// Factorizes `mat + δI` for the smallest `δ` of the schedule that
    /// works. Returns `false` when the shift would exceed `params.max`.
    pub(crate) fn factorize(&mut self, mat: &DMatrix<T>, params: &RegularizationParams<T>) -> bool {
        self.delta = T::zero();
        if self.try_factorize(mat, T::zero()) {
            return true;
        }

        let mut delta = if self.delta_last == T::zero() {
            params.nonzero_init
        } else {
            <T as Float>::max(params.min, params.dec_factor * self.delta_last)
        };
        loop {
            if self.try_factorize(mat, delta) {
                self.delta = delta;
                self.delta_last = delta;
                return true;
            }
            delta *= if self.delta_last == T::zero() {
                params.inc_factor_big
            } else {
                params.inc_factor
            };
            if delta > params.max {
                self.factor = None;
                return false;
            }
        }
    }

    /// Solves `(mat + δI) x = rhs` in place, followed by at most
    /// `max_refinement_steps` steps of iterative refinement.
    ///
    /// Returns `false` if no factorization is available.
    pub(crate) fn solve_refined(
        &self,
        mat: &DMatrix<T>,
        rhs: &DVector<T>,
        sol: &mut DVector<T>,
        err: &mut DVector<T>,
        max_refinement_steps: usize,
    ) -> bool {
        let Some(chol) = &self.factor else {
            return false;
        };
        sol.copy_from(rhs);
        chol.solve_mut(sol);

        let threshold = T::EPSILON * (T::one() + infty_norm(rhs));
        for _ in 0..max_refinement_steps {
            // err = rhs − (mat + δI) sol
            err.copy_from(rhs);
            err.gemv(-T::one(), mat, &*sol, T::one());
            err.axpy(-self.delta, &*sol, T::one());
            if infty_norm(&*err) <= threshold {
                break;
            }
            chol.solve_mut(err);
            *sol += &*err;
        }
        true
    }
}
