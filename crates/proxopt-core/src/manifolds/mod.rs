//! Concrete manifold implementations.
//!
//! Only the flat case ships with the crate. Other spaces plug into the solver
//! by implementing [`Manifold`](crate::core::manifold::Manifold).

pub mod euclidean;

pub use euclidean::EuclideanSpace;
