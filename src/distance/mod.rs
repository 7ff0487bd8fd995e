//! Cost matrices and the provider boundary that supplies them.
//!
//! The solver never computes distances itself. It consumes a dense matrix
//! indexed by location keys, produced by whatever metric the caller prefers.

mod matrix;
mod provider;

pub use matrix::CostMatrix;
pub use provider::CostMatrixProvider;
