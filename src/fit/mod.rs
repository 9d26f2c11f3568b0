//! Production-function estimation.
//!
//! Responsibilities:
//!
//! - build the log-linear design matrix (elasticities + February..December dummies)
//! - solve it by OLS and reject rank-deficient designs
//! - convert coefficients into Cobb-Douglas parameters and report diagnostics

pub mod estimator;

pub use estimator::*;
