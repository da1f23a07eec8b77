//! Error types for problem modelling.
//!
//! Structural problems (inconsistent dimensions, invalid parameters) are
//! detected eagerly, when a residual, cost, constraint or problem is built or
//! evaluated, and reported through [`ModelError`].

use thiserror::Error;

/// Errors that can occur while building or evaluating a problem model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Dimension mismatch between points, tangent vectors or buffers.
    ///
    /// This error occurs when a manifold, residual, cost or constraint is
    /// given data whose size disagrees with its declared dimensions.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A modelling parameter is invalid (e.g. non-square weight matrix,
    /// inverted box bounds).
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid
        reason: String,
    },

    /// Numerical instability detected while evaluating the model.
    #[error("Numerical instability detected: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },

    /// Optional capability not provided by a particular implementation.
    #[error("Feature not implemented: {feature}")]
    NotImplemented {
        /// Name of the unimplemented feature
        feature: String,
    },
}

impl ModelError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidParameter error with a custom reason.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Create a NotImplemented error for a specific feature.
    pub fn not_implemented<S: Into<String>>(feature: S) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }
}

/// Result type alias for operations that can produce [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Checks that a vector has the expected length.
pub(crate) fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::dimension_mismatch(
            format!("{what} of size {expected}"),
            format!("size {actual}"),
        ))
    }
}

/// Checks that a matrix has the expected shape.
pub(crate) fn check_shape(
    what: &str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::dimension_mismatch(
            format!("{what} of shape {}x{}", expected.0, expected.1),
            format!("{}x{}", actual.0, actual.1),
        ))
    }
}
