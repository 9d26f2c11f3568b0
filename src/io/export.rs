//! CSV exports: the monthly plan and synthetic sample tables.
//!
//! The files are meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::data::SampleData;
use crate::domain::MonthlyRecommendation;
use crate::error::StaffingError;

#[derive(Serialize)]
struct PlanRecord<'a> {
    month: u8,
    month_name: &'a str,
    experts: f64,
    staff: f64,
    quantity: f64,
    revenue: f64,
    gross_profit: f64,
    wage_cost: f64,
}

#[derive(Serialize)]
struct TransactionRecord<'a> {
    city: &'a str,
    month: u8,
    units_sold: f64,
    experts: f64,
    staff: f64,
}

#[derive(Serialize)]
struct ReferenceRecord<'a> {
    city: &'a str,
    population: f64,
    median_income: f64,
}

/// Write the recommendation table, one row per month.
pub fn write_plan_csv(path: &Path, rows: &[MonthlyRecommendation]) -> Result<(), StaffingError> {
    write_records(
        path,
        rows.iter().map(|r| PlanRecord {
            month: r.month.number(),
            month_name: r.month.name(),
            experts: r.experts,
            staff: r.staff,
            quantity: r.quantity,
            revenue: r.revenue,
            gross_profit: r.gross_profit,
            wage_cost: r.wage_cost,
        }),
    )
}

/// Write a synthetic dataset as a `city`-keyed transactions/reference CSV pair.
pub fn write_sample_csv(transactions: &Path, reference: &Path, sample: &SampleData) -> Result<(), StaffingError> {
    write_records(
        transactions,
        sample.transactions.iter().map(|t| TransactionRecord {
            city: &t.location,
            month: t.month,
            units_sold: t.units_sold,
            experts: t.experts,
            staff: t.staff,
        }),
    )?;
    write_records(
        reference,
        sample.reference.iter().map(|r| ReferenceRecord {
            city: &r.location,
            population: r.population,
            median_income: r.median_income,
        }),
    )
}

fn write_records<T: Serialize>(path: &Path, records: impl IntoIterator<Item = T>) -> Result<(), StaffingError> {
    let csv_err = |source| StaffingError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| StaffingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
