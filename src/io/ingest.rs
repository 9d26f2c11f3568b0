//! CSV ingest for the transactions and location reference tables.
//!
//! Both loaders are strict: a missing column, an empty cell or an unparseable
//! number aborts the load with a `Validation` error carrying the 1-based file
//! line. Value checks that depend on the join (positivity for the logarithm,
//! month range, key matching) are left to `data::prepare`.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{ColumnNames, Month, ReferenceRow, TransactionRow};
use crate::error::StaffingError;

/// Header aliases accepted in addition to the canonical names.
const ALIASES: [(&str, &str); 1] = [("med_inc", "median_income")];

/// Load the transactional table: join key, `month`, `units_sold`, `experts`, `staff`.
pub fn load_transactions(path: &Path, columns: &ColumnNames) -> Result<Vec<TransactionRow>, StaffingError> {
    let key = normalize_header_name(&columns.join_key);
    let mut table = Table::open(path)?;
    table.require(&[key.as_str(), "month", "units_sold", "experts", "staff"])?;

    let mut rows = Vec::new();
    for (line, record) in table.records() {
        let record = record?;
        rows.push(TransactionRow {
            location: table.text(&record, line, &key)?.to_string(),
            month: parse_month(table.text(&record, line, "month")?, line)?,
            units_sold: table.number(&record, line, "units_sold")?,
            experts: table.number(&record, line, "experts")?,
            staff: table.number(&record, line, "staff")?,
        });
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded transactions");
    Ok(rows)
}

/// Load the location reference table: join key, `population`, `median_income`.
pub fn load_reference(path: &Path, columns: &ColumnNames) -> Result<Vec<ReferenceRow>, StaffingError> {
    let key = normalize_header_name(&columns.join_key);
    let mut table = Table::open(path)?;
    table.require(&[key.as_str(), "population", "median_income"])?;

    let mut rows = Vec::new();
    for (line, record) in table.records() {
        let record = record?;
        rows.push(ReferenceRow {
            location: table.text(&record, line, &key)?.to_string(),
            population: table.number(&record, line, "population")?,
            median_income: table.number(&record, line, "median_income")?,
        });
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded reference table");
    Ok(rows)
}

/// Canonical form of a header cell.
///
/// Excel likes to prefix the first header with a UTF-8 BOM; it is stripped along
/// with surrounding whitespace. Spaces and dashes become underscores so
/// `Units Sold`, `units-sold` and `UNITS_SOLD` all name the same column.
pub fn normalize_header_name(name: &str) -> String {
    let name = name.trim_start_matches('\u{feff}').trim().to_ascii_lowercase();
    let name: String = name
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

/// Accepts `1`..`12` as well as month names and 3-letter abbreviations.
///
/// Out-of-range integers are passed through; the preparer reports them.
fn parse_month(cell: &str, line: usize) -> Result<u8, StaffingError> {
    if let Ok(n) = cell.parse::<u8>() {
        return Ok(n);
    }
    Month::from_name(cell).map(Month::number).ok_or_else(|| {
        StaffingError::validation(format!("line {line}: invalid month '{cell}'"))
    })
}

struct Table {
    path: std::path::PathBuf,
    reader: csv::Reader<File>,
    header_map: HashMap<String, usize>,
}

impl Table {
    fn open(path: &Path) -> Result<Self, StaffingError> {
        let file = File::open(path).map_err(|source| StaffingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let headers = reader.headers().map_err(|source| StaffingError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let header_map = build_header_map(headers);

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header_map,
        })
    }

    fn require(&self, names: &[&str]) -> Result<(), StaffingError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.header_map.contains_key(*n))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(StaffingError::validation(format!(
            "'{}' is missing required column(s): {}",
            self.path.display(),
            missing.join(", ")
        )))
    }

    /// Records paired with their 1-based file line (the header is line 1).
    fn records(&mut self) -> Vec<(usize, Result<StringRecord, StaffingError>)> {
        let path = self.path.clone();
        self.reader
            .records()
            .enumerate()
            .map(|(idx, r)| {
                let line = idx + 2;
                (line, r.map_err(|source| StaffingError::Csv { path: path.clone(), source }))
            })
            .collect()
    }

    fn text<'a>(&self, record: &'a StringRecord, line: usize, name: &str) -> Result<&'a str, StaffingError> {
        self.header_map
            .get(name)
            .and_then(|idx| record.get(*idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                StaffingError::validation(format!(
                    "'{}' line {line}: missing value for `{name}`",
                    self.path.display()
                ))
            })
    }

    fn number(&self, record: &StringRecord, line: usize, name: &str) -> Result<f64, StaffingError> {
        let cell = self.text(record, line, name)?;
        cell.parse::<f64>().map_err(|_| {
            StaffingError::validation(format!(
                "'{}' line {line}: `{name}` is not a number ('{cell}')",
                self.path.display()
            ))
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}
