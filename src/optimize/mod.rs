//! Per-month staffing optimization.

pub mod staffing;

pub use staffing::*;
