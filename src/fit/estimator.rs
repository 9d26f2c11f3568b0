//! Log-linear OLS fit of the production function.
//!
//! ```text
//! ln Q = c + α ln E + β ln S + γ ln pop + δ ln inc + Σ_{m=Feb..Dec} s_m·1[month = m] + ε
//! ```
//!
//! January is the omitted month and is absorbed into the intercept, so
//! `A = exp(c)` is January's productivity level and `exp(s_m)` is month `m`'s
//! multiplier relative to January.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::data::PreparedDataset;
use crate::domain::{Month, ProductionParams};
use crate::error::StaffingError;
use crate::math::solve_least_squares;

/// Column names of the design matrix, in order.
pub const REGRESSORS: [&str; 16] = [
    "const",
    "ln_experts",
    "ln_staff",
    "ln_population",
    "ln_median_income",
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

/// Index of the first seasonal dummy in `REGRESSORS`.
const SEASONAL_OFFSET: usize = 5;

/// One fitted coefficient with its sampling uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub std_error: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub t_value: f64,
}

/// Goodness-of-fit summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub n_obs: usize,
    pub n_params: usize,
    pub df_resid: usize,
    pub sse: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub r_squared: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub adj_r_squared: f64,
    /// Residual standard error.
    #[serde(deserialize_with = "nan_if_null")]
    pub sigma: f64,
    pub coefficients: Vec<Coefficient>,
}

/// Fitted production parameters plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimation {
    pub params: ProductionParams,
    pub diagnostics: FitDiagnostics,
}

/// JSON has no NaN; undefined statistics are written as `null`.
fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Fit the log-linear model to a prepared dataset.
pub fn estimate(dataset: &PreparedDataset) -> Result<Estimation, StaffingError> {
    let n = dataset.len();
    let p = REGRESSORS.len();
    if n < p {
        return Err(StaffingError::fitting(format!(
            "{n} observations cannot identify {p} coefficients"
        )));
    }

    let (x, y) = build_design(dataset);
    let solution = solve_least_squares(&x, &y).map_err(|e| StaffingError::fitting(e.to_string()))?;
    let b = &solution.coefficients;

    let params = ProductionParams {
        tfp: b[0].exp(),
        alpha: b[1],
        beta: b[2],
        gamma: b[3],
        delta: b[4],
        seasonal: std::array::from_fn(|i| b[SEASONAL_OFFSET + i]),
    };
    if !params.tfp.is_finite() || params.tfp <= 0.0 {
        return Err(StaffingError::fitting(format!(
            "intercept {} gives a non-finite productivity level",
            b[0]
        )));
    }

    let diagnostics = diagnostics(&y, &solution.residuals, b, &solution.inverse_gram_diagonal);
    info!(
        n_obs = n,
        r_squared = diagnostics.r_squared,
        alpha = params.alpha,
        beta = params.beta,
        gamma = params.gamma,
        delta = params.delta,
        tfp = params.tfp,
        "estimated production function"
    );

    Ok(Estimation { params, diagnostics })
}

/// Build `(X, y)` with columns ordered as `REGRESSORS`.
pub fn build_design(dataset: &PreparedDataset) -> (DMatrix<f64>, DVector<f64>) {
    let n = dataset.len();
    let mut x = DMatrix::<f64>::zeros(n, REGRESSORS.len());
    let mut y = DVector::<f64>::zeros(n);

    for (i, row) in dataset.rows.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = row.ln_experts;
        x[(i, 2)] = row.ln_staff;
        x[(i, 3)] = row.ln_population;
        x[(i, 4)] = row.ln_median_income;
        for (j, month) in Month::ALL[1..].iter().enumerate() {
            x[(i, SEASONAL_OFFSET + j)] = f64::from(row.month_flag(*month));
        }
        y[i] = row.ln_units_sold;
    }

    (x, y)
}

fn diagnostics(
    y: &DVector<f64>,
    residuals: &DVector<f64>,
    b: &DVector<f64>,
    inverse_gram_diagonal: &DVector<f64>,
) -> FitDiagnostics {
    let n = y.len();
    let p = b.len();
    let df_resid = n - p;

    let sse = residuals.norm_squared();
    let mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let (r_squared, adj_r_squared) = if sst > 0.0 {
        let r2 = 1.0 - sse / sst;
        let adj = if df_resid > 0 {
            1.0 - (1.0 - r2) * (n as f64 - 1.0) / df_resid as f64
        } else {
            f64::NAN
        };
        (r2, adj)
    } else {
        (f64::NAN, f64::NAN)
    };

    let sigma2 = if df_resid > 0 {
        sse / df_resid as f64
    } else {
        f64::NAN
    };
    if df_resid == 0 {
        debug!("saturated design: standard errors are undefined");
    }

    let coefficients = REGRESSORS
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let std_error = (sigma2 * inverse_gram_diagonal[j]).sqrt();
            Coefficient {
                name: (*name).to_string(),
                estimate: b[j],
                std_error,
                t_value: b[j] / std_error,
            }
        })
        .collect();

    FitDiagnostics {
        n_obs: n,
        n_params: p,
        df_resid,
        sse,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        coefficients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleSpec, generate_dataset, prepare};

    fn dataset(spec: &SampleSpec) -> PreparedDataset {
        let sample = generate_dataset(spec).unwrap();
        prepare(&sample.transactions, &sample.reference).unwrap()
    }

    #[test]
    fn recovers_noiseless_parameters() {
        let spec = SampleSpec {
            noise_sigma: 0.0,
            ..SampleSpec::demo(11)
        };
        let est = estimate(&dataset(&spec)).unwrap();
        let (got, want) = (est.params, spec.params);

        assert!((got.alpha - want.alpha).abs() < 1e-6);
        assert!((got.beta - want.beta).abs() < 1e-6);
        assert!((got.gamma - want.gamma).abs() < 1e-6);
        assert!((got.delta - want.delta).abs() < 1e-6);
        assert!((got.tfp / want.tfp - 1.0).abs() < 1e-5);
        for (g, w) in got.seasonal.iter().zip(want.seasonal.iter()) {
            assert!((g - w).abs() < 1e-6);
        }
        assert!(est.diagnostics.r_squared > 0.999_999);
    }

    #[test]
    fn noisy_fit_reports_diagnostics() {
        let spec = SampleSpec::demo(5);
        let est = estimate(&dataset(&spec)).unwrap();
        let d = &est.diagnostics;

        assert_eq!(d.n_obs, spec.locations * 12 * spec.rows_per_month);
        assert_eq!(d.n_params, 16);
        assert_eq!(d.df_resid, d.n_obs - 16);
        assert_eq!(d.coefficients.len(), 16);
        assert_eq!(d.coefficients[1].name, "ln_experts");
        assert!(d.sigma > 0.0 && d.sigma < 0.2);
        assert!(d.r_squared > 0.5 && d.r_squared <= 1.0);
        assert!(d.coefficients.iter().all(|c| c.std_error.is_finite() && c.std_error > 0.0));
        assert!((est.params.alpha - spec.params.alpha).abs() < 0.1);
    }

    #[test]
    fn missing_month_makes_design_singular() {
        let spec = SampleSpec {
            noise_sigma: 0.0,
            ..SampleSpec::demo(2)
        };
        let mut sample = generate_dataset(&spec).unwrap();
        sample.transactions.retain(|t| t.month != 6);
        let data = prepare(&sample.transactions, &sample.reference).unwrap();

        let err = estimate(&data).unwrap_err();
        assert!(matches!(err, StaffingError::Fitting(ref m) if m.contains("rank deficient")));
    }

    #[test]
    fn too_few_rows_is_a_fitting_error() {
        let spec = SampleSpec::demo(2);
        let mut data = dataset(&spec);
        data.rows.truncate(10);
        assert!(matches!(estimate(&data), Err(StaffingError::Fitting(_))));
    }

    #[test]
    fn single_location_cannot_identify_market_elasticities() {
        let spec = SampleSpec {
            locations: 1,
            rows_per_month: 4,
            ..SampleSpec::demo(9)
        };
        // Population and income are constant, so they are collinear with the intercept.
        assert!(matches!(estimate(&dataset(&spec)), Err(StaffingError::Fitting(_))));
    }

    #[test]
    fn design_columns_follow_regressor_order() {
        let data = dataset(&SampleSpec::demo(4));
        let (x, y) = build_design(&data);
        assert_eq!(x.ncols(), REGRESSORS.len());
        let row = &data.rows[0];
        assert_eq!(x[(0, 0)], 1.0);
        assert_eq!(x[(0, 1)], row.ln_experts);
        assert_eq!(y[0], row.ln_units_sold);
        // Dummy columns sum to 0 for January rows and 1 otherwise.
        for (i, r) in data.rows.iter().enumerate() {
            let dummies: f64 = (SEASONAL_OFFSET..REGRESSORS.len()).map(|j| x[(i, j)]).sum();
            let expected = if r.observation.month == Month::January { 0.0 } else { 1.0 };
            assert_eq!(dummies, expected);
        }
    }
}
