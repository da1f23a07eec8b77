//! Type definitions and aliases for constrained optimization on manifolds.
//!
//! This module provides the scalar trait shared by every crate of the
//! workspace, the dynamic vector and matrix aliases, and a few small
//! numerical helpers used on the solver hot path.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the numeric traits required by the residual,
/// cost and constraint interfaces and by the solver.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default target tolerance on primal and dual infeasibility.
    const DEFAULT_TOLERANCE: Self;

    /// Default stopping tolerance of the inner (primal) loop.
    const DEFAULT_INNER_TOLERANCE: Self;

    /// Step used by central finite differences.
    const FD_STEP: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for logging/display).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Convert from usize.
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("Failed to convert from usize")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-4;
    const DEFAULT_INNER_TOLERANCE: Self = 1e-5;
    const FD_STEP: Self = 1e-3;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-6;
    const DEFAULT_INNER_TOLERANCE: Self = 1e-8;
    const FD_STEP: Self = 1e-6;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Infinity norm of a vector (zero for an empty vector).
pub fn infty_norm<T: Scalar>(v: &DVector<T>) -> T {
    v.iter()
        .fold(T::zero(), |acc, x| <T as Float>::max(acc, <T as Float>::abs(*x)))
}

/// Returns `true` when every entry of the vector is finite.
pub fn all_finite<T: Scalar>(v: &DVector<T>) -> bool {
    v.iter().all(|x| <T as Float>::is_finite(*x))
}

/// Numerical constants for different precision levels.
pub mod constants {
    use super::Scalar;

    /// Get machine epsilon for the given scalar type.
    pub fn epsilon<T: Scalar>() -> T {
        T::EPSILON
    }

    /// Get default target tolerance.
    pub fn default_tolerance<T: Scalar>() -> T {
        T::DEFAULT_TOLERANCE
    }

    /// Get default inner-loop tolerance.
    pub fn inner_tolerance<T: Scalar>() -> T {
        T::DEFAULT_INNER_TOLERANCE
    }

    /// Get the finite-difference step.
    pub fn fd_step<T: Scalar>() -> T {
        T::FD_STEP
    }
}
