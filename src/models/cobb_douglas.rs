//! Cobb-Douglas evaluation.
//!
//! ```text
//! Q(E, S)  = Ã · E^α · S^β
//! Ã(m)     = A · pop^γ · inc^δ · mult(m)
//! MP_E     = margin · Ã · α · E^(α-1) · S^β
//! MP_S     = margin · Ã · β · E^α · S^(β-1)
//! ```
//!
//! `Ã` ("adjusted TFP") folds everything except the two labor inputs into one
//! constant for a given month and market.

use crate::domain::{Month, ProductionParams};

/// Productivity for `month` in a market with the given population and income.
pub fn adjusted_tfp(params: &ProductionParams, population: f64, median_income: f64, month: Month) -> f64 {
    params.tfp
        * population.powf(params.gamma)
        * median_income.powf(params.delta)
        * params.seasonal_multiplier(month)
}

/// Output quantity at the given staffing.
pub fn output(adjusted_tfp: f64, alpha: f64, beta: f64, experts: f64, staff: f64) -> f64 {
    adjusted_tfp * experts.powf(alpha) * staff.powf(beta)
}

/// Marginal revenue products `(MP_E, MP_S)` scaled by the contribution margin.
pub fn marginal_products(
    contribution_margin: f64,
    adjusted_tfp: f64,
    alpha: f64,
    beta: f64,
    experts: f64,
    staff: f64,
) -> (f64, f64) {
    let scale = contribution_margin * adjusted_tfp;
    let mp_experts = scale * alpha * experts.powf(alpha - 1.0) * staff.powf(beta);
    let mp_staff = scale * beta * experts.powf(alpha) * staff.powf(beta - 1.0);
    (mp_experts, mp_staff)
}

/// Staffing at which both marginal products equal the wages, if it exists.
///
/// The first-order conditions give `S = E · (β W_E) / (α W_S)` and then a single
/// power equation in `E`. There is no interior solution under constant returns
/// (`α + β = 1`) or when an elasticity is non-positive.
///
/// Reference solution for checking the numerical optimizer.
#[cfg(test)]
pub(crate) fn first_order_staffing(
    contribution_margin: f64,
    adjusted_tfp: f64,
    alpha: f64,
    beta: f64,
    expert_wage: f64,
    staff_wage: f64,
) -> Option<(f64, f64)> {
    if alpha <= 0.0 || beta <= 0.0 || (alpha + beta - 1.0).abs() < 1e-12 {
        return None;
    }
    let ratio = (beta * expert_wage) / (alpha * staff_wage);
    let scale = contribution_margin * adjusted_tfp;
    let experts = (expert_wage / (scale * alpha * ratio.powf(beta))).powf(1.0 / (alpha + beta - 1.0));
    let staff = experts * ratio;
    if experts.is_finite() && staff.is_finite() && experts > 0.0 && staff > 0.0 {
        Some((experts, staff))
    } else {
        None
    }
}
