//! Numerical utilities.

pub mod validation;

pub use validation::DerivativeChecker;
