//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/optimization code stays clean and testable
//! - output changes are localized

use crate::domain::MonthlyRecommendation;
use crate::fit::Estimation;
use crate::report::NetIncome;

/// Regression summary: fit quality, coefficient table and derived parameters.
pub fn format_fit_summary(estimation: &Estimation) -> String {
    let d = &estimation.diagnostics;
    let p = &estimation.params;
    let mut out = String::new();

    out.push_str("=== staffplan - production function fit ===\n");
    out.push_str(&format!(
        "Observations: n={} | params={} | df_resid={}\n",
        d.n_obs, d.n_params, d.df_resid
    ));
    out.push_str(&format!(
        "R²={:.4} | adj. R²={:.4} | sigma={:.4} | SSE={:.4}\n",
        d.r_squared, d.adj_r_squared, d.sigma, d.sse
    ));

    out.push('\n');
    out.push_str(format!("{:<18} {:>12} {:>12} {:>10}\n", "term", "coef", "std err", "t").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<18} {:-<12} {:-<12} {:-<10}\n", "", "", "", "").trim_end());
    out.push('\n');
    for c in &d.coefficients {
        out.push_str(
            format!(
                "{:<18} {:>12.6} {:>12.6} {:>10.3}\n",
                c.name, c.estimate, c.std_error, c.t_value
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str("\nProduction parameters:\n");
    out.push_str(&format!("- A (TFP): {:.6}\n", p.tfp));
    out.push_str(&format!(
        "- alpha={:.6} beta={:.6} gamma={:.6} delta={:.6}\n",
        p.alpha, p.beta, p.gamma, p.delta
    ));
    out.push_str(&format!("- returns to labor (alpha+beta): {:.4}\n", p.alpha + p.beta));
    out
}

/// Monthly recommendation table.
pub fn format_plan(rows: &[MonthlyRecommendation]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>10} {:>10} {:>12} {:>14} {:>14} {:>12}\n",
            "month", "experts", "staff", "quantity", "revenue", "gross profit", "wages"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<10} {:-<10} {:-<12} {:-<14} {:-<14} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<10} {:>10.2} {:>10.2} {:>12.2} {:>14.2} {:>14.2} {:>12.2}\n",
                r.month.name(),
                r.experts,
                r.staff,
                r.quantity,
                r.revenue,
                r.gross_profit,
                r.wage_cost,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

pub fn format_net_income(income: &NetIncome) -> String {
    format!(
        "Gross profit: {:.2}\nWages:        {:.2}\nFixed cost:   {:.2}\nNet income:   {:.2}\n",
        income.gross_profit, income.wage_cost, income.fixed_cost, income.net_income
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Month;

    #[test]
    fn plan_table_has_header_rule_and_one_line_per_month() {
        let rows: Vec<MonthlyRecommendation> = Month::ALL
            .iter()
            .map(|&month| MonthlyRecommendation {
                month,
                experts: 3.5,
                staff: 7.25,
                quantity: 10.0,
                revenue: 10_000.0,
                gross_profit: 1_000.0,
                wage_cost: 392.5,
                marginal_product_experts: 50.0,
                marginal_product_staff: 30.0,
                objective: 0.0,
                iterations: 4,
            })
            .collect();

        let table = format_plan(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 14);
        assert!(lines[0].starts_with("month"));
        assert!(lines[2].starts_with("January"));
        assert!(lines[13].starts_with("December"));
        assert!(lines[2].contains("392.50"));
        assert!(lines.iter().all(|l| l == &l.trim_end()));
    }

    #[test]
    fn net_income_lists_components() {
        let text = format_net_income(&NetIncome {
            gross_profit: 10.0,
            wage_cost: 4.0,
            fixed_cost: 1.0,
            net_income: 5.0,
        });
        assert!(text.contains("Net income:   5.00"));
    }
}
