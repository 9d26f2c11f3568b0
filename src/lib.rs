//! `staffing-planner` library crate.
//!
//! The binary (`staffplan`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the estimator and optimizer can be reused outside the CLI

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod optimize;
pub mod report;
