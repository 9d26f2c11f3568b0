//! Join transactions with the location reference table and derive regression inputs.
//!
//! Each prepared row carries:
//! - the joined observation
//! - natural logs of units sold, experts, staff, population, median income
//! - twelve binary month flags (exactly one is set)
//!
//! Every logged field must be finite and strictly positive. Rows that violate
//! this are rejected with a validation error that names the row and column,
//! rather than letting `ln` produce `-inf`/`NaN` that would poison the fit.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{Month, Observation, ReferenceRow, TransactionRow};
use crate::error::StaffingError;

/// An observation augmented with log columns and month indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub observation: Observation,
    pub ln_units_sold: f64,
    pub ln_experts: f64,
    pub ln_staff: f64,
    pub ln_population: f64,
    pub ln_median_income: f64,
    /// `month_flags[i] == 1` iff the row's month is `Month::ALL[i]`.
    pub month_flags: [u8; 12],
}

impl PreparedRow {
    pub fn month_flag(&self, month: Month) -> u8 {
        self.month_flags[month.index()]
    }
}

/// Regression-ready dataset (one row per transaction, input order preserved).
#[derive(Debug, Clone, Default)]
pub struct PreparedDataset {
    pub rows: Vec<PreparedRow>,
}

impl PreparedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn months_present(&self) -> BTreeSet<Month> {
        self.rows.iter().map(|r| r.observation.month).collect()
    }

    /// Require at least one observation in every calendar month.
    pub fn ensure_full_year(&self) -> Result<(), StaffingError> {
        let present = self.months_present();
        if present.len() == Month::ALL.len() {
            return Ok(());
        }
        let missing: Vec<&str> = Month::ALL
            .iter()
            .filter(|m| !present.contains(m))
            .map(|m| m.name())
            .collect();
        Err(StaffingError::validation(format!(
            "incomplete monthly data: {} distinct months present, missing {}",
            present.len(),
            missing.join(", ")
        )))
    }
}

/// Left-join `transactions` with `reference` on the location key and derive
/// log columns and month flags.
pub fn prepare(transactions: &[TransactionRow], reference: &[ReferenceRow]) -> Result<PreparedDataset, StaffingError> {
    if transactions.is_empty() {
        return Err(StaffingError::validation("transaction table is empty"));
    }

    let lookup = build_reference_lookup(reference)?;

    let rows = transactions
        .iter()
        .enumerate()
        .map(|(idx, tx)| prepare_row(idx + 1, tx, &lookup))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = rows.len(), locations = lookup.len(), "prepared dataset");
    Ok(PreparedDataset { rows })
}

/// Binary month indicators for `month`.
pub fn month_flags(month: Month) -> [u8; 12] {
    let mut flags = [0u8; 12];
    flags[month.index()] = 1;
    flags
}

fn build_reference_lookup(reference: &[ReferenceRow]) -> Result<HashMap<&str, &ReferenceRow>, StaffingError> {
    let mut lookup = HashMap::with_capacity(reference.len());
    for row in reference {
        let key = row.location.trim();
        if lookup.insert(key, row).is_some() {
            return Err(StaffingError::validation(format!(
                "duplicate location key in reference table: '{key}'"
            )));
        }
    }
    Ok(lookup)
}

fn prepare_row(
    row_no: usize,
    tx: &TransactionRow,
    lookup: &HashMap<&str, &ReferenceRow>,
) -> Result<PreparedRow, StaffingError> {
    let location = tx.location.trim();
    let month = Month::from_number(tx.month).ok_or_else(|| {
        StaffingError::validation(format!("row {row_no}: month {} is outside 1..=12", tx.month))
    })?;
    let reference = lookup.get(location).ok_or_else(|| {
        StaffingError::validation(format!(
            "row {row_no}: location '{location}' has no match in the reference table"
        ))
    })?;

    let observation = Observation {
        location: location.to_string(),
        month,
        units_sold: tx.units_sold,
        experts: tx.experts,
        staff: tx.staff,
        population: reference.population,
        median_income: reference.median_income,
    };

    Ok(PreparedRow {
        ln_units_sold: checked_ln(row_no, "units_sold", observation.units_sold)?,
        ln_experts: checked_ln(row_no, "experts", observation.experts)?,
        ln_staff: checked_ln(row_no, "staff", observation.staff)?,
        ln_population: checked_ln(row_no, "population", observation.population)?,
        ln_median_income: checked_ln(row_no, "median_income", observation.median_income)?,
        month_flags: month_flags(month),
        observation,
    })
}

fn checked_ln(row_no: usize, column: &str, value: f64) -> Result<f64, StaffingError> {
    if value.is_finite() && value > 0.0 {
        Ok(value.ln())
    } else {
        Err(StaffingError::validation(format!(
            "row {row_no}: `{column}` must be finite and > 0 to take its logarithm (got {value})"
        )))
    }
}
