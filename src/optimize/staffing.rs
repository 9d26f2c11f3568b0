//! Staffing levels whose marginal revenue products match wages.
//!
//! For each month we minimize
//!
//! ```text
//! (MP_E(E, S) - W_E)² + (MP_S(E, S) - W_S)²,   E, S ≥ 0
//! ```
//!
//! starting from `(E, S) = (1, 1)`. The search runs in log coordinates
//! `u = (ln E, ln S)`: the lower bounds become implicit, both marginal products
//! become exponentials of an affine function of `u` (so the Jacobian is exact
//! and cheap), and the start point is `u = 0`.
//!
//! Months are independent and are solved in parallel; results are returned in
//! calendar order.

use nalgebra::{Matrix2, Vector2};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{EconomicInputs, Month, MonthlyRecommendation, ProductionParams};
use crate::error::StaffingError;
use crate::math::{ResidualSystem, SolverOptions, levenberg_marquardt};
use crate::models::{adjusted_tfp, marginal_products, output};

/// Everything one month's objective depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffingObjective {
    pub month: Month,
    pub alpha: f64,
    pub beta: f64,
    pub adjusted_tfp: f64,
    pub contribution_margin: f64,
    pub expert_wage: f64,
    pub staff_wage: f64,
}

impl StaffingObjective {
    pub fn new(params: &ProductionParams, inputs: &EconomicInputs, month: Month) -> Self {
        Self {
            month,
            alpha: params.alpha,
            beta: params.beta,
            adjusted_tfp: adjusted_tfp(
                params,
                inputs.population_estimate,
                inputs.median_income_estimate,
                month,
            ),
            contribution_margin: inputs.contribution_margin,
            expert_wage: inputs.expert_wage,
            staff_wage: inputs.staff_wage,
        }
    }

    /// `(MP_E, MP_S)` at the given headcounts.
    pub fn marginal_products(&self, experts: f64, staff: f64) -> (f64, f64) {
        marginal_products(
            self.contribution_margin,
            self.adjusted_tfp,
            self.alpha,
            self.beta,
            experts,
            staff,
        )
    }

    /// Squared deviation of the marginal products from the wages.
    pub fn value(&self, experts: f64, staff: f64) -> f64 {
        let (mp_e, mp_s) = self.marginal_products(experts, staff);
        (mp_e - self.expert_wage).powi(2) + (mp_s - self.staff_wage).powi(2)
    }

    /// Marginal products at `u = (ln E, ln S)`.
    fn marginal_products_log(&self, u: &Vector2<f64>) -> (f64, f64) {
        let scale = self.contribution_margin * self.adjusted_tfp;
        let mp_e = scale * self.alpha * ((self.alpha - 1.0) * u[0] + self.beta * u[1]).exp();
        let mp_s = scale * self.beta * (self.alpha * u[0] + (self.beta - 1.0) * u[1]).exp();
        (mp_e, mp_s)
    }
}

impl ResidualSystem for StaffingObjective {
    fn residuals(&self, u: &Vector2<f64>) -> Vector2<f64> {
        let (mp_e, mp_s) = self.marginal_products_log(u);
        Vector2::new(mp_e - self.expert_wage, mp_s - self.staff_wage)
    }

    fn jacobian(&self, u: &Vector2<f64>) -> Matrix2<f64> {
        let (mp_e, mp_s) = self.marginal_products_log(u);
        Matrix2::new(
            (self.alpha - 1.0) * mp_e,
            self.beta * mp_e,
            self.alpha * mp_s,
            (self.beta - 1.0) * mp_s,
        )
    }
}

/// Solve every month and return twelve rows ordered January..December.
pub fn optimize_staffing(
    params: ProductionParams,
    inputs: &EconomicInputs,
    solver: &SolverOptions,
) -> Result<Vec<MonthlyRecommendation>, StaffingError> {
    inputs.validate()?;
    params.validate()?;

    // Collect every month first so a failure always reports the earliest month.
    let results: Vec<Result<MonthlyRecommendation, StaffingError>> = Month::ALL
        .par_iter()
        .map(|&month| optimize_month(&params, inputs, month, solver))
        .collect();
    let rows = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    info!(months = rows.len(), "optimized monthly staffing");
    Ok(rows)
}

/// Solve a single month.
pub fn optimize_month(
    params: &ProductionParams,
    inputs: &EconomicInputs,
    month: Month,
    solver: &SolverOptions,
) -> Result<MonthlyRecommendation, StaffingError> {
    // A non-positive elasticity makes that marginal product non-positive or
    // strictly decreasing toward zero: no finite headcount can match a wage.
    if !(params.alpha > 0.0 && params.beta > 0.0) {
        return Err(StaffingError::optimization(
            month,
            format!(
                "labor elasticities must be positive (alpha={}, beta={}); marginal products cannot reach the wages",
                params.alpha, params.beta
            ),
        ));
    }

    let objective = StaffingObjective::new(params, inputs, month);
    if !(objective.adjusted_tfp.is_finite() && objective.adjusted_tfp > 0.0) {
        return Err(StaffingError::optimization(
            month,
            format!("adjusted productivity is {}", objective.adjusted_tfp),
        ));
    }

    // Residuals are in wage units; scale the absolute bound accordingly.
    let opts = SolverOptions {
        residual_tolerance: solver.residual_tolerance * inputs.expert_wage.max(inputs.staff_wage).max(1.0),
        ..*solver
    };

    let solution = levenberg_marquardt(&objective, Vector2::zeros(), &opts)
        .map_err(|failure| StaffingError::optimization(month, failure.to_string()))?;

    let experts = solution.u[0].exp();
    let staff = solution.u[1].exp();
    if !(experts.is_finite() && staff.is_finite()) {
        return Err(StaffingError::optimization(
            month,
            "solution diverged to an unbounded headcount",
        ));
    }

    let quantity = output(objective.adjusted_tfp, objective.alpha, objective.beta, experts, staff);
    let (mp_e, mp_s) = objective.marginal_products(experts, staff);
    debug!(
        month = %month,
        experts,
        staff,
        quantity,
        iterations = solution.iterations,
        termination = ?solution.termination,
        "month solved"
    );

    Ok(MonthlyRecommendation {
        month,
        experts,
        staff,
        quantity,
        revenue: inputs.revenue_per_unit * quantity,
        gross_profit: inputs.contribution_margin * quantity,
        wage_cost: experts * inputs.expert_wage + staff * inputs.staff_wage,
        marginal_product_experts: mp_e,
        marginal_product_staff: mp_s,
        objective: objective.value(experts, staff),
        iterations: solution.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::first_order_staffing;
    use proptest::prelude::*;

    fn params() -> ProductionParams {
        ProductionParams {
            tfp: 0.05,
            alpha: 0.45,
            beta: 0.25,
            gamma: 0.3,
            delta: 0.2,
            seasonal: [
                -0.05, 0.02, 0.08, 0.12, 0.18, 0.22, 0.20, 0.10, 0.04, 0.15, 0.35,
            ],
        }
    }

    fn scenario() -> EconomicInputs {
        EconomicInputs::new(50.0, 30.0, 100_000.0, 60_000.0)
    }

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs())
    }

    #[test]
    fn returns_twelve_rows_in_month_order() {
        let rows = optimize_staffing(params(), &scenario(), &SolverOptions::default()).unwrap();
        let months: Vec<Month> = rows.iter().map(|r| r.month).collect();
        assert_eq!(months, Month::ALL.to_vec());
    }

    #[test]
    fn january_scenario_is_non_negative_and_consistent() {
        let inputs = scenario();
        let p = params();
        let row = optimize_month(&p, &inputs, Month::January, &SolverOptions::default()).unwrap();

        assert!(row.experts >= 0.0 && row.staff >= 0.0);
        assert!(row.quantity >= 0.0 && row.revenue >= 0.0);
        assert!(row.gross_profit >= 0.0 && row.wage_cost >= 0.0);

        assert!(rel_close(row.revenue, 1000.0 * row.quantity, 1e-12));
        assert!(rel_close(row.gross_profit, 100.0 * row.quantity, 1e-12));
        assert!(rel_close(row.wage_cost, row.experts * 50.0 + row.staff * 30.0, 1e-12));
    }

    #[test]
    fn marginal_products_match_wages_at_solution() {
        let rows = optimize_staffing(params(), &scenario(), &SolverOptions::default()).unwrap();
        for row in &rows {
            assert!(rel_close(row.marginal_product_experts, 50.0, 1e-6), "{row:?}");
            assert!(rel_close(row.marginal_product_staff, 30.0, 1e-6), "{row:?}");
            assert!(row.objective < 1e-8);
        }
    }

    #[test]
    fn solution_matches_first_order_conditions() {
        let inputs = scenario();
        let p = params();
        for month in Month::ALL {
            let row = optimize_month(&p, &inputs, month, &SolverOptions::default()).unwrap();
            let tfp = adjusted_tfp(&p, inputs.population_estimate, inputs.median_income_estimate, month);
            let (e, s) = first_order_staffing(100.0, tfp, p.alpha, p.beta, 50.0, 30.0).unwrap();
            assert!(rel_close(row.experts, e, 1e-6), "{month}: {} vs {e}", row.experts);
            assert!(rel_close(row.staff, s, 1e-6), "{month}: {} vs {s}", row.staff);
        }
    }

    #[test]
    fn quantity_round_trips_through_production_function() {
        let inputs = scenario();
        let p = params();
        let rows = optimize_staffing(p, &inputs, &SolverOptions::default()).unwrap();
        for row in &rows {
            let rebuilt = p.tfp
                * inputs.population_estimate.powf(p.gamma)
                * inputs.median_income_estimate.powf(p.delta)
                * p.seasonal_multiplier(row.month)
                * row.experts.powf(p.alpha)
                * row.staff.powf(p.beta);
            assert!(rel_close(rebuilt, row.quantity, 1e-6));
        }
    }

    #[test]
    fn stronger_season_needs_more_staff() {
        let rows = optimize_staffing(params(), &scenario(), &SolverOptions::default()).unwrap();
        // December has the largest multiplier, February the smallest.
        let dec = &rows[Month::December.index()];
        let feb = &rows[Month::February.index()];
        assert!(dec.experts > feb.experts);
        assert!(dec.staff > feb.staff);
        assert!(dec.quantity > feb.quantity);
    }

    #[test]
    fn iteration_cap_yields_optimization_error() {
        let solver = SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        };
        let err = optimize_month(&params(), &scenario(), Month::March, &solver).unwrap_err();
        match err {
            StaffingError::Optimization { month, reason } => {
                assert_eq!(month, Month::March);
                assert!(reason.contains("did not converge"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_elasticity_is_an_optimization_error() {
        let p = ProductionParams { beta: -0.1, ..params() };
        let err = optimize_month(&p, &scenario(), Month::January, &SolverOptions::default()).unwrap_err();
        match err {
            StaffingError::Optimization { month, reason } => {
                assert_eq!(month, Month::January);
                assert!(reason.contains("elasticities"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let zero_alpha = ProductionParams { alpha: 0.0, ..params() };
        assert!(matches!(
            optimize_staffing(zero_alpha, &scenario(), &SolverOptions::default()),
            Err(StaffingError::Optimization { month: Month::January, .. })
        ));
    }

    #[test]
    fn failure_reports_the_earliest_month() {
        let solver = SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        };
        for _ in 0..5 {
            let err = optimize_staffing(params(), &scenario(), &solver).unwrap_err();
            assert!(matches!(err, StaffingError::Optimization { month: Month::January, .. }));
        }
    }

    #[test]
    fn invalid_inputs_are_validation_errors() {
        let inputs = EconomicInputs {
            expert_wage: -5.0,
            ..scenario()
        };
        let err = optimize_staffing(params(), &inputs, &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, StaffingError::Validation(_)));
    }

    #[test]
    fn objective_is_zero_at_first_order_solution() {
        let p = params();
        let inputs = scenario();
        let obj = StaffingObjective::new(&p, &inputs, Month::May);
        let (e, s) = first_order_staffing(100.0, obj.adjusted_tfp, p.alpha, p.beta, 50.0, 30.0).unwrap();
        assert!(obj.value(e, s) < 1e-12);
        assert!(obj.value(1.0, 1.0) > 0.0);
    }

    proptest! {
        #[test]
        fn population_raises_adjusted_productivity(
            pop in 1_000.0f64..1_000_000.0,
            bump in 1.001f64..3.0,
            experts in 0.5f64..50.0,
            staff in 0.5f64..50.0,
        ) {
            let p = params();
            let lo = EconomicInputs { population_estimate: pop, ..scenario() };
            let hi = EconomicInputs { population_estimate: pop * bump, ..scenario() };
            let a_lo = StaffingObjective::new(&p, &lo, Month::June).adjusted_tfp;
            let a_hi = StaffingObjective::new(&p, &hi, Month::June).adjusted_tfp;
            prop_assert!(a_hi > a_lo);
            prop_assert!(output(a_hi, p.alpha, p.beta, experts, staff) > output(a_lo, p.alpha, p.beta, experts, staff));
        }
    }
}
