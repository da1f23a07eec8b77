//! Proximal augmented-Lagrangian solver for constrained problems on manifolds.
//!
//! This crate solves the programs stated with `proxopt-core`:
//!
//! ```text
//! min_{x ∈ ℳ}  f(x)   s.t.  r_i(x) ∈ C_i
//! ```
//!
//! The caller allocates a [`Workspace`] and a [`Results`] once per problem
//! and passes them to [`Solver::solve`], which can be called repeatedly
//! without further allocation.
//!
//! # Modules
//!
//! - [`config`]: solver configuration and penalty strategies
//! - [`solver`]: the augmented-Lagrangian engine
//! - [`workspace`]: pre-allocated scratch buffers
//! - [`results`]: solve outcome and convergence flag
//! - [`callback`]: per-iteration observers
//! - [`line_search`]: Armijo backtracking on the merit function
//! - [`error`]: error types

pub mod callback;
pub mod config;
pub mod error;
mod linalg;
pub mod line_search;
pub mod results;
pub mod solver;
pub mod workspace;

pub use callback::{Callback, HistoryCallback, HistoryStorage, LoggingCallback, NoOpCallback};
pub use config::{BclParams, PenaltyUpdate, RegularizationParams, SolverConfig, VerboseLevel};
pub use error::{SolverError, SolverResult};
pub use line_search::{ArmijoParams, LineSearchResult};
pub use results::{ConvergenceFlag, Results};
pub use solver::Solver;
pub use workspace::Workspace;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use proxopt_solver::prelude::*;
/// ```
pub mod prelude {
    pub use crate::callback::{
        Callback, HistoryCallback, HistoryStorage, LoggingCallback, NoOpCallback,
    };
    pub use crate::config::{
        BclParams, PenaltyUpdate, RegularizationParams, SolverConfig, VerboseLevel,
    };
    pub use crate::error::{SolverError, SolverResult};
    pub use crate::line_search::{ArmijoParams, LineSearchResult};
    pub use crate::results::{ConvergenceFlag, Results};
    pub use crate::solver::Solver;
    pub use crate::workspace::Workspace;
}
