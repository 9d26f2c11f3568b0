//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the calendar `Month` enumeration (January is the seasonal baseline)
//! - raw and joined input rows (`TransactionRow`, `ReferenceRow`, `Observation`)
//! - fit outputs (`ProductionParams`) and optimizer outputs (`MonthlyRecommendation`)
//! - run configuration (`EconomicInputs`, `PlanConfig`)

pub mod types;

pub use types::*;
