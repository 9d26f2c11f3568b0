//! Input/output helpers.
//!
//! - CSV ingest of the transactions and reference tables (`ingest`)
//! - plan and sample CSV exports (`export`)
//! - fitted model JSON read/write (`model`)

pub mod export;
pub mod ingest;
pub mod model;

pub use export::*;
pub use ingest::*;
pub use model::*;
