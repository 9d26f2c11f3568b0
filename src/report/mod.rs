//! Reporting: the full-year income roll-up and formatted terminal output.

pub mod format;
pub mod income;

pub use format::*;
pub use income::*;
