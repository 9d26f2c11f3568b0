//! Production-function model.
//!
//! The model is a set of small pure functions so the estimator, the optimizer and
//! the reports can share one definition of output and marginal products.

pub mod cobb_douglas;

pub use cobb_douglas::*;
