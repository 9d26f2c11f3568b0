//! Synthetic sales data from a known Cobb-Douglas process.
//!
//! Used for demos (`staffplan simulate`) and to check that estimation recovers
//! the generating parameters.
//!
//! Per location, population and median income are drawn once. Per (location,
//! month, repetition), expert and staff headcounts are drawn uniformly and
//! units sold follow
//!
//! ```text
//! units = A · E^α · S^β · pop^γ · inc^δ · mult(m) · exp(ε),   ε ~ N(0, σ)
//! ```

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Month, ProductionParams, ReferenceRow, TransactionRow};
use crate::error::StaffingError;
use crate::models::{adjusted_tfp, output};

const POPULATION_RANGE: (f64, f64) = (20_000.0, 400_000.0);
const INCOME_RANGE: (f64, f64) = (35_000.0, 95_000.0);
const EXPERTS_RANGE: (f64, f64) = (1.0, 25.0);
const STAFF_RANGE: (f64, f64) = (2.0, 60.0);

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub locations: usize,
    pub rows_per_month: usize,
    /// True parameters of the generating process.
    pub params: ProductionParams,
    /// Standard deviation of the multiplicative log-noise.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl SampleSpec {
    /// A plausible retail process with mild seasonality.
    pub fn demo(seed: u64) -> Self {
        Self {
            locations: 12,
            rows_per_month: 2,
            params: ProductionParams {
                tfp: 0.05,
                alpha: 0.45,
                beta: 0.25,
                gamma: 0.3,
                delta: 0.2,
                seasonal: [
                    -0.05, 0.02, 0.08, 0.12, 0.18, 0.22, 0.20, 0.10, 0.04, 0.15, 0.35,
                ],
            },
            noise_sigma: 0.05,
            seed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub transactions: Vec<TransactionRow>,
    pub reference: Vec<ReferenceRow>,
}

pub fn generate_dataset(spec: &SampleSpec) -> Result<SampleData, StaffingError> {
    if spec.locations == 0 || spec.rows_per_month == 0 {
        return Err(StaffingError::validation(
            "sample needs at least one location and one row per month",
        ));
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(StaffingError::validation("noise sigma must be finite and >= 0"));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise_sigma)
        .map_err(|e| StaffingError::validation(format!("noise distribution error: {e}")))?;

    let reference: Vec<ReferenceRow> = (0..spec.locations)
        .map(|i| ReferenceRow {
            location: format!("Location-{:02}", i + 1),
            population: rng.gen_range(POPULATION_RANGE.0..POPULATION_RANGE.1).round(),
            median_income: rng.gen_range(INCOME_RANGE.0..INCOME_RANGE.1).round(),
        })
        .collect();

    let mut transactions = Vec::with_capacity(spec.locations * 12 * spec.rows_per_month);
    for loc in &reference {
        for month in Month::ALL {
            let tfp = adjusted_tfp(&spec.params, loc.population, loc.median_income, month);
            for _ in 0..spec.rows_per_month {
                let experts = rng.gen_range(EXPERTS_RANGE.0..EXPERTS_RANGE.1).round();
                let staff = rng.gen_range(STAFF_RANGE.0..STAFF_RANGE.1).round();
                let noise = if spec.noise_sigma > 0.0 {
                    normal.sample(&mut rng)
                } else {
                    0.0
                };
                let units_sold = output(tfp, spec.params.alpha, spec.params.beta, experts, staff) * noise.exp();
                transactions.push(TransactionRow {
                    location: loc.location.clone(),
                    month: month.number(),
                    units_sold,
                    experts,
                    staff,
                });
            }
        }
    }

    Ok(SampleData {
        transactions,
        reference,
    })
}
