//! Error types for the solver.
//!
//! Only structural problems are reported as errors. Numerical breakdown and
//! iteration caps are recorded in
//! [`Results::status`](crate::results::Results::status) so that partial
//! progress stays available to the caller.

use proxopt_core::ModelError;
use thiserror::Error;

/// Errors returned by solver construction and by [`Solver::solve`](crate::Solver::solve).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// Invalid solver configuration.
    ///
    /// This error occurs when a configuration parameter is out of its
    /// admissible range (e.g. non-positive penalty, backtracking factor
    /// outside `(0, 1)`).
    #[error("Invalid solver configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The initial multiplier list does not have one entry per constraint.
    #[error("Expected {expected} initial multipliers, got {actual}")]
    MultiplierCountMismatch {
        /// Number of constraints in the problem
        expected: usize,
        /// Number of multiplier vectors given
        actual: usize,
    },

    /// Propagated modelling error.
    ///
    /// This wraps dimension errors raised by the manifold, the problem or
    /// the workspace and results buffers.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl SolverError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, V>(reason: S1, parameter: S2, value: V) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        V: std::fmt::Display,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for solver operations.
pub type SolverResult<T> = std::result::Result<T, SolverError>;
