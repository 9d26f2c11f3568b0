//! Shared planning workflow used by the `plan` and `fit` subcommands.
//!
//! load CSVs -> prepare -> full-year check -> estimate -> optimize per month -> net income
//!
//! The CLI layer only handles presentation; everything here returns values.

use std::path::Path;

use tracing::info;

use crate::data::{PreparedDataset, prepare};
use crate::domain::{ColumnNames, DataSource, MonthlyRecommendation, PlanConfig};
use crate::error::StaffingError;
use crate::fit::{Estimation, estimate};
use crate::io::{load_reference, load_transactions, read_model_json, write_model_json, write_plan_csv};
use crate::optimize::optimize_staffing;
use crate::report::{NetIncome, net_income};

/// All computed outputs of a single `staffplan plan` run.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub estimation: Estimation,
    pub rows: Vec<MonthlyRecommendation>,
    pub income: NetIncome,
}

/// Read both tables and join them into the regression dataset.
pub fn load_and_prepare(
    transactions: &Path,
    reference: &Path,
    columns: &ColumnNames,
) -> Result<PreparedDataset, StaffingError> {
    let tx = load_transactions(transactions, columns)?;
    let refs = load_reference(reference, columns)?;
    let dataset = prepare(&tx, &refs)?;
    info!(
        rows = dataset.len(),
        months = dataset.months_present().len(),
        "prepared dataset"
    );
    Ok(dataset)
}

/// Estimate production parameters from a prepared dataset.
///
/// Every calendar month must be present; otherwise a seasonal dummy column is
/// all zeros and the fit would be rank deficient anyway.
pub fn run_fit(dataset: &PreparedDataset) -> Result<Estimation, StaffingError> {
    dataset.ensure_full_year()?;
    estimate(dataset)
}

/// Execute the full planning pipeline and write any requested exports.
pub fn run_plan(config: &PlanConfig) -> Result<PlanOutput, StaffingError> {
    config.economics.validate()?;

    let estimation = match &config.source {
        DataSource::Files {
            transactions,
            reference,
            columns,
        } => {
            let dataset = load_and_prepare(transactions, reference, columns)?;
            run_fit(&dataset)?
        }
        DataSource::Model(path) => {
            let model = read_model_json(path)?;
            info!(path = %path.display(), generated_at = %model.generated_at, "loaded model");
            model.estimation()
        }
    };

    let rows = optimize_staffing(estimation.params, &config.economics, &config.solver)?;
    let income = net_income(&rows, config.fixed_cost)?;
    info!(net_income = income.net_income, "plan complete");

    if let Some(path) = &config.export_plan {
        write_plan_csv(path, &rows)?;
    }
    if let Some(path) = &config.export_model {
        write_model_json(path, &estimation)?;
    }

    Ok(PlanOutput {
        estimation,
        rows,
        income,
    })
}
