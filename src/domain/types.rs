//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - used in-memory during estimation and optimization
//! - exported to CSV/JSON
//! - reloaded later (a saved model can drive `staffplan plan --model`)

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StaffingError;
use crate::math::SolverOptions;

pub const DEFAULT_CONTRIBUTION_MARGIN: f64 = 100.0;
pub const DEFAULT_REVENUE_PER_UNIT: f64 = 1000.0;
pub const DEFAULT_FIXED_COST: f64 = 500_000.0;

/// Calendar month. January is the regression baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month number, 1-based.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Zero-based position in `Month::ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[self.index()]
    }

    pub fn from_number(n: u8) -> Option<Month> {
        if (1..=12).contains(&n) {
            Some(Self::ALL[usize::from(n - 1)])
        } else {
            None
        }
    }

    /// Parse a full month name or its three-letter abbreviation (case-insensitive).
    pub fn from_name(s: &str) -> Option<Month> {
        let s = s.trim();
        Self::ALL.iter().copied().find(|m| {
            let name = m.name();
            name.eq_ignore_ascii_case(s) || (s.len() == 3 && name[..3].eq_ignore_ascii_case(s))
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Month> for u8 {
    fn from(m: Month) -> u8 {
        m.number()
    }
}

impl TryFrom<u8> for Month {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Month::from_number(n).ok_or_else(|| format!("month number out of range: {n}"))
    }
}

/// One row of the transactional table, as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub location: String,
    pub month: u8,
    pub units_sold: f64,
    pub experts: f64,
    pub staff: f64,
}

/// One row of the location reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub location: String,
    pub population: f64,
    pub median_income: f64,
}

/// A joined historical record (transaction + reference fields).
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub month: Month,
    pub units_sold: f64,
    pub experts: f64,
    pub staff: f64,
    pub population: f64,
    pub median_income: f64,
}

/// Cobb-Douglas production parameters derived from the log-linear fit.
///
/// `Q = tfp * experts^alpha * staff^beta * population^gamma * income^delta * mult(month)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionParams {
    /// Total factor productivity, `exp(intercept)`.
    pub tfp: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    /// Seasonal log-coefficients for February..=December.
    pub seasonal: [f64; 11],
}

impl ProductionParams {
    /// Seasonal log-coefficient; zero for the January baseline.
    pub fn seasonal_coefficient(&self, month: Month) -> f64 {
        match month {
            Month::January => 0.0,
            m => self.seasonal[m.index() - 1],
        }
    }

    pub fn seasonal_multiplier(&self, month: Month) -> f64 {
        match month {
            Month::January => 1.0,
            m => self.seasonal_coefficient(m).exp(),
        }
    }

    /// All coefficients finite and the productivity level positive.
    pub fn validate(&self) -> Result<(), StaffingError> {
        let finite = [self.tfp, self.alpha, self.beta, self.gamma, self.delta]
            .iter()
            .chain(self.seasonal.iter())
            .all(|v| v.is_finite());
        if !finite || self.tfp <= 0.0 {
            return Err(StaffingError::validation(
                "production parameters must be finite with a positive productivity level",
            ));
        }
        Ok(())
    }
}

/// Economic inputs for the staffing optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EconomicInputs {
    pub expert_wage: f64,
    pub staff_wage: f64,
    pub population_estimate: f64,
    pub median_income_estimate: f64,
    pub contribution_margin: f64,
    pub revenue_per_unit: f64,
}

impl EconomicInputs {
    /// Inputs with the default margin and revenue rate.
    pub fn new(expert_wage: f64, staff_wage: f64, population_estimate: f64, median_income_estimate: f64) -> Self {
        Self {
            expert_wage,
            staff_wage,
            population_estimate,
            median_income_estimate,
            contribution_margin: DEFAULT_CONTRIBUTION_MARGIN,
            revenue_per_unit: DEFAULT_REVENUE_PER_UNIT,
        }
    }

    pub fn validate(&self) -> Result<(), StaffingError> {
        let fields = [
            ("expert wage", self.expert_wage),
            ("staff wage", self.staff_wage),
            ("population estimate", self.population_estimate),
            ("median income estimate", self.median_income_estimate),
            ("contribution margin", self.contribution_margin),
            ("revenue per unit", self.revenue_per_unit),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(StaffingError::validation(format!(
                    "{name} must be finite and > 0 (got {value})"
                )));
            }
        }
        Ok(())
    }
}

/// Recommended staffing and the resulting economics for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecommendation {
    pub month: Month,
    pub experts: f64,
    pub staff: f64,
    pub quantity: f64,
    pub revenue: f64,
    pub gross_profit: f64,
    pub wage_cost: f64,
    /// Marginal revenue product of experts at the solution.
    pub marginal_product_experts: f64,
    pub marginal_product_staff: f64,
    /// Squared-deviation objective at the solution.
    pub objective: f64,
    pub iterations: usize,
}

/// Header names used to locate input columns.
///
/// Names are compared after normalization (see `io::ingest::normalize_header_name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub join_key: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            join_key: "city".to_string(),
        }
    }
}

/// Where the production parameters come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Estimate from a transactions/reference CSV pair.
    Files {
        transactions: PathBuf,
        reference: PathBuf,
        columns: ColumnNames,
    },
    /// Reuse a previously exported model JSON.
    Model(PathBuf),
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub source: DataSource,
    pub economics: EconomicInputs,
    pub fixed_cost: f64,
    pub solver: SolverOptions,
    pub export_plan: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProductionParams {
        ProductionParams {
            tfp: 2.0,
            alpha: 0.4,
            beta: 0.3,
            gamma: 0.1,
            delta: 0.05,
            seasonal: [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1],
        }
    }

    #[test]
    fn month_numbers_and_names_round_trip() {
        for (i, m) in Month::ALL.iter().enumerate() {
            assert_eq!(m.number() as usize, i + 1);
            assert_eq!(Month::from_number(m.number()), Some(*m));
            assert_eq!(Month::from_name(m.name()), Some(*m));
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!(Month::from_name("sep"), Some(Month::September));
        assert_eq!(Month::from_name("DECEMBER"), Some(Month::December));
        assert_eq!(Month::from_name("Smarch"), None);
    }

    #[test]
    fn january_multiplier_is_exactly_one() {
        let p = params();
        assert_eq!(p.seasonal_coefficient(Month::January), 0.0);
        assert_eq!(p.seasonal_multiplier(Month::January), 1.0);
        assert!((p.seasonal_multiplier(Month::February) - 0.1_f64.exp()).abs() < 1e-15);
        assert!((p.seasonal_multiplier(Month::December) - 1.1_f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn month_serializes_as_number() {
        let json = serde_json::to_string(&Month::July).unwrap();
        assert_eq!(json, "7");
        let back: Month = serde_json::from_str("11").unwrap();
        assert_eq!(back, Month::November);
        assert!(serde_json::from_str::<Month>("13").is_err());
    }

    #[test]
    fn production_params_validation() {
        assert!(params().validate().is_ok());
        let nan_season = ProductionParams {
            seasonal: [f64::NAN; 11],
            ..params()
        };
        assert!(matches!(nan_season.validate(), Err(StaffingError::Validation(_))));
        let zero_tfp = ProductionParams { tfp: 0.0, ..params() };
        assert!(zero_tfp.validate().is_err());
    }

    #[test]
    fn economic_inputs_reject_non_positive_values() {
        let ok = EconomicInputs::new(50.0, 30.0, 100_000.0, 60_000.0);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.contribution_margin, 100.0);
        assert_eq!(ok.revenue_per_unit, 1000.0);

        let bad = EconomicInputs {
            staff_wage: 0.0,
            ..ok
        };
        assert!(matches!(bad.validate(), Err(StaffingError::Validation(_))));

        let nan = EconomicInputs {
            population_estimate: f64::NAN,
            ..ok
        };
        assert!(nan.validate().is_err());
    }
}
