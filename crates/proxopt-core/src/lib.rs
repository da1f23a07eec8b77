//! Problem modelling for constrained optimization on manifolds.
//!
//! This crate provides everything needed to *state* a constrained nonlinear
//! program whose variable lives on a manifold:
//!
//! ```text
//! min_{x ∈ ℳ}  f(x)   s.t.  r_i(x) ∈ C_i
//! ```
//!
//! The solver itself lives in `proxopt-solver`.
//!
//! # Key Concepts
//!
//! - **Manifolds**: spaces with a retraction `x ⊕ v` and a difference `x ⊖ y`
//! - **Residuals**: vector-valued maps with Jacobians w.r.t. tangent perturbations
//! - **Costs**: scalar objectives with gradient and (Gauss-Newton) Hessian
//! - **Constraint sets**: convex sets with a projection and a normal-cone projection
//! - **Problems**: a cost plus an ordered list of constraints
//!
//! # Modules
//!
//! - [`core`]: scalar trait, error types and the [`Manifold`](core::Manifold) trait
//! - [`manifolds`]: concrete manifolds
//! - [`functions`]: residual and cost functions
//! - [`constraints`]: constraint sets and constraints
//! - [`problem`]: the problem aggregate and its merit function
//! - [`numerical`]: finite-difference derivative checks

pub mod constraints;
pub mod core;
pub mod functions;
pub mod manifolds;
pub mod numerical;
pub mod problem;

// Re-export commonly used items at the crate root
pub use crate::core::error::{ModelError, Result};
pub use crate::problem::Problem;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use proxopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::constraints::{
        BoxConstraint, Constraint, ConstraintKind, ConstraintSet, EqualityConstraint,
        NegativeOrthant,
    };
    pub use crate::core::error::{ModelError, Result};
    pub use crate::core::manifold::{DifferenceArg, Manifold};
    pub use crate::core::types::{constants, infty_norm, DMatrix, DVector, Scalar};
    pub use crate::functions::{
        ComposeResidual, CostFunction, CostSum, LinearResidual, QuadraticDistanceCost,
        QuadraticResidualCost, ResidualFunction, StateResidual,
    };
    pub use crate::manifolds::EuclideanSpace;
    pub use crate::numerical::DerivativeChecker;
    pub use crate::problem::Problem;
}
