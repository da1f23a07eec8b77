//! Core traits and types shared by every problem component.

pub mod error;
pub mod manifold;
pub mod types;

// Re-export core types
pub use error::*;
pub use manifold::*;
pub use types::*;
