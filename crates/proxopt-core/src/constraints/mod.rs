//! Constraint sets and constraints.
//!
//! A [`Constraint`] pairs a residual with a [`ConstraintSet`]. The set decides
//! the semantics: [`EqualityConstraint`] for `r(x) = 0`, [`NegativeOrthant`]
//! for `r(x) ≤ 0`, [`BoxConstraint`] for two-sided bounds. New kinds plug in
//! by implementing the two projection operators and the active-set rule.

pub mod box_constraint;
pub mod constraint;
pub mod equality;
pub mod negative_orthant;
pub mod set;

pub use box_constraint::BoxConstraint;
pub use constraint::Constraint;
pub use equality::EqualityConstraint;
pub use negative_orthant::NegativeOrthant;
pub use set::{ConstraintKind, ConstraintSet};
