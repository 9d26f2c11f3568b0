//! Error taxonomy for the planning pipeline.
//!
//! Every failure is classified by the stage that raised it. The binary maps each
//! class to a distinct process exit code:
//!
//! - `2` file / CSV / JSON I/O
//! - `3` input validation (schema, join keys, non-positive log inputs, months)
//! - `4` regression fitting
//! - `5` per-month staffing optimization

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Month;

#[derive(Debug, Error)]
pub enum StaffingError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("fitting error: {0}")]
    Fitting(String),

    #[error("optimization error ({month}): {reason}")]
    Optimization { month: Month, reason: String },

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StaffingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn fitting(message: impl Into<String>) -> Self {
        Self::Fitting(message.into())
    }

    pub fn optimization(month: Month, reason: impl Into<String>) -> Self {
        Self::Optimization {
            month,
            reason: reason.into(),
        }
    }

    /// Pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "data preparation",
            Self::Fitting(_) => "estimation",
            Self::Optimization { .. } => "staffing optimization",
            Self::Io { .. } | Self::Csv { .. } | Self::Json { .. } => "io",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } | Self::Csv { .. } | Self::Json { .. } => 2,
            Self::Validation(_) => 3,
            Self::Fitting(_) => 4,
            Self::Optimization { .. } => 5,
        }
    }
}

pub type Result<T, E = StaffingError> = std::result::Result<T, E>;
