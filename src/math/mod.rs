//! Numerical building blocks: least squares and a small nonlinear solver.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
