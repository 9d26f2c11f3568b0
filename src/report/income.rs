//! Full-year net income from the monthly recommendations.

use serde::Serialize;

use crate::domain::{Month, MonthlyRecommendation};
use crate::error::StaffingError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetIncome {
    pub gross_profit: f64,
    pub wage_cost: f64,
    pub fixed_cost: f64,
    pub net_income: f64,
}

/// `Σ gross_profit − Σ wage_cost − fixed_cost` over a complete year.
///
/// The rows must cover each calendar month exactly once; a partial year is an
/// error rather than a smaller sum.
pub fn net_income(rows: &[MonthlyRecommendation], fixed_cost: f64) -> Result<NetIncome, StaffingError> {
    if !fixed_cost.is_finite() {
        return Err(StaffingError::validation(format!("fixed cost must be finite (got {fixed_cost})")));
    }
    if rows.len() != Month::ALL.len() {
        return Err(StaffingError::validation(format!(
            "net income needs 12 monthly rows, got {}",
            rows.len()
        )));
    }

    let mut seen = [false; 12];
    for row in rows {
        let slot = &mut seen[row.month.index()];
        if *slot {
            return Err(StaffingError::validation(format!("duplicate row for {}", row.month)));
        }
        *slot = true;
    }

    let gross_profit: f64 = rows.iter().map(|r| r.gross_profit).sum();
    let wage_cost: f64 = rows.iter().map(|r| r.wage_cost).sum();

    Ok(NetIncome {
        gross_profit,
        wage_cost,
        fixed_cost,
        net_income: gross_profit - wage_cost - fixed_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: Month, gross_profit: f64, wage_cost: f64) -> MonthlyRecommendation {
        MonthlyRecommendation {
            month,
            experts: 1.0,
            staff: 1.0,
            quantity: gross_profit / 100.0,
            revenue: gross_profit * 10.0,
            gross_profit,
            wage_cost,
            marginal_product_experts: 50.0,
            marginal_product_staff: 30.0,
            objective: 0.0,
            iterations: 1,
        }
    }

    fn year() -> Vec<MonthlyRecommendation> {
        Month::ALL
            .iter()
            .map(|&m| row(m, 100_000.0 + f64::from(m.number()), 40_000.0))
            .collect()
    }

    #[test]
    fn sums_full_year() {
        let income = net_income(&year(), 500_000.0).unwrap();
        assert_eq!(income.gross_profit, 1_200_078.0);
        assert_eq!(income.wage_cost, 480_000.0);
        assert_eq!(income.net_income, 1_200_078.0 - 480_000.0 - 500_000.0);
    }

    #[test]
    fn repeated_calls_agree() {
        let rows = year();
        assert_eq!(net_income(&rows, 500_000.0).unwrap(), net_income(&rows, 500_000.0).unwrap());
    }

    #[test]
    fn partial_year_is_rejected() {
        let mut rows = year();
        rows.pop();
        assert!(matches!(net_income(&rows, 0.0), Err(StaffingError::Validation(_))));
        assert!(matches!(net_income(&[], 0.0), Err(StaffingError::Validation(_))));
    }

    #[test]
    fn duplicate_month_is_rejected() {
        let mut rows = year();
        rows[11] = row(Month::January, 1.0, 1.0);
        let err = net_income(&rows, 0.0).unwrap_err();
        assert!(matches!(err, StaffingError::Validation(ref m) if m.contains("January")));
    }

    #[test]
    fn non_finite_fixed_cost_is_rejected() {
        assert!(net_income(&year(), f64::NAN).is_err());
    }
}
