//! Dataset construction.
//!
//! - joining and transforming raw tables into regression inputs (`prepare`)
//! - seeded synthetic datasets from a known production process (`sample`)

pub mod prepare;
pub mod sample;

pub use prepare::*;
pub use sample::{SampleData, SampleSpec, generate_dataset};
