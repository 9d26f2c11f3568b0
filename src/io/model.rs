//! Read/write fitted model JSON files.
//!
//! A model file is the portable form of an estimation: production parameters
//! plus the fit diagnostics they came with. `staffplan plan --model` reuses it
//! to skip estimation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ProductionParams;
use crate::error::StaffingError;
use crate::fit::{Estimation, FitDiagnostics};

const TOOL: &str = "staffplan";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub params: ProductionParams,
    pub diagnostics: FitDiagnostics,
}

impl ModelFile {
    pub fn new(estimation: &Estimation) -> Self {
        Self {
            tool: TOOL.to_string(),
            generated_at: Utc::now(),
            params: estimation.params,
            diagnostics: estimation.diagnostics.clone(),
        }
    }

    pub fn estimation(&self) -> Estimation {
        Estimation {
            params: self.params,
            diagnostics: self.diagnostics.clone(),
        }
    }
}

pub fn write_model_json(path: &Path, estimation: &Estimation) -> Result<(), StaffingError> {
    let file = File::create(path).map_err(|source| StaffingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ModelFile::new(estimation)).map_err(|source| {
        StaffingError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(|source| StaffingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a model file and check that its parameters are usable.
pub fn read_model_json(path: &Path) -> Result<ModelFile, StaffingError> {
    let file = File::open(path).map_err(|source| StaffingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model: ModelFile = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
        StaffingError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    model.params.validate().map_err(|err| match err {
        StaffingError::Validation(msg) => StaffingError::validation(format!("'{}': {msg}", path.display())),
        other => other,
    })?;

    Ok(model)
}
