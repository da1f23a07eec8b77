//! # ProxOpt
//!
//! Constrained nonlinear programming on manifolds.
//!
//! ProxOpt minimizes a cost over a manifold subject to constraints of the
//! form `r_i(x) ∈ C_i`, where each `C_i` is a convex set with a cheap
//! projection (zero cone for equalities, negative orthant for inequalities,
//! boxes). Problems are solved with a proximal augmented-Lagrangian method
//! whose inner loop takes (Gauss-)Newton steps along the manifold
//! retraction.
//!
//! This crate re-exports [`proxopt_core`] (problem modelling) and
//! [`proxopt_solver`] (the solver).
//!
//! ## Quick Start
//!
//! ```rust
//! use proxopt::prelude::*;
//! use std::sync::Arc;
//!
//! // Closest point to (1, 1) with x₀ + x₁ ≤ 1
//! let space: Arc<dyn Manifold<f64>> = Arc::new(EuclideanSpace::new(2));
//! let cost = QuadraticDistanceCost::with_target(space.clone(), DVector::from_vec(vec![1.0, 1.0]))?;
//! let half_plane = LinearResidual::new(
//!     DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
//!     DVector::from_vec(vec![-1.0]),
//! )?;
//! let problem = Arc::new(Problem::new(
//!     Arc::new(cost),
//!     vec![Constraint::negative_orthant(Arc::new(half_plane))],
//! )?);
//!
//! let mut workspace = Workspace::from_problem(&problem);
//! let mut results = Results::from_problem(&problem);
//! let mut solver = Solver::new(space, problem, SolverConfig::default())?;
//! solver.solve(&mut workspace, &mut results, &DVector::zeros(2), None)?;
//!
//! assert!(results.converged);
//! assert!((results.x_opt[0] - 0.5).abs() < 1e-5);
//! # Ok::<(), SolverError>(())
//! ```

pub use proxopt_core;
pub use proxopt_solver;

pub use proxopt_core::{ModelError, Problem};
pub use proxopt_solver::{ConvergenceFlag, Results, Solver, SolverConfig, SolverError, Workspace};

/// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use proxopt::prelude::*;
/// ```
pub mod prelude {
    pub use proxopt_core::prelude::*;
    pub use proxopt_solver::prelude::*;
}
