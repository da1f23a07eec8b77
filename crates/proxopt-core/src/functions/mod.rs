//! Residual and cost functions.
//!
//! Residuals ([`ResidualFunction`]) are vector-valued and feed both
//! constraints and least-squares costs. Costs ([`CostFunction`]) are the
//! scalar objectives minimized by the solver.

pub mod compose;
pub mod cost_function;
pub mod cost_sum;
pub mod linear;
pub mod quadratic_distance;
pub mod quadratic_residual;
pub mod residual;
pub mod state;

pub use compose::ComposeResidual;
pub use cost_function::CostFunction;
pub use cost_sum::CostSum;
pub use linear::LinearResidual;
pub use quadratic_distance::QuadraticDistanceCost;
pub use quadratic_residual::QuadraticResidualCost;
pub use residual::ResidualFunction;
pub use state::StateResidual;
