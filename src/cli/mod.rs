//! Command-line parsing for the staffing planner.
//!
//! Argument parsing and command dispatch stay separate from the estimation and
//! optimization code: `app` turns these structs into a `domain::PlanConfig`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "staffplan",
    version,
    about = "Cobb-Douglas staffing planner: fit sales history, recommend monthly headcount"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the production function and recommend staffing for each month.
    Plan(PlanArgs),
    /// Estimate the production function and print the regression summary.
    Fit(FitArgs),
    /// Write a synthetic transactions/reference CSV pair.
    Simulate(SimulateArgs),
}

/// Historical input tables.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Transactions CSV (join key, month, units_sold, experts, staff).
    #[arg(long, value_name = "CSV")]
    pub transactions: Option<PathBuf>,

    /// Location reference CSV (join key, population, median_income).
    #[arg(long, value_name = "CSV")]
    pub reference: Option<PathBuf>,

    /// Column joining the two tables.
    #[arg(long, default_value = "city")]
    pub join_key: String,
}

#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Reuse a model JSON from `--export-model` instead of estimating.
    #[arg(long, value_name = "JSON", conflicts_with_all = ["transactions", "reference"])]
    pub model: Option<PathBuf>,

    /// Monthly wage of one expert.
    #[arg(long, env = "STAFFPLAN_EXPERT_WAGE")]
    pub expert_wage: f64,

    /// Monthly wage of one staff member.
    #[arg(long, env = "STAFFPLAN_STAFF_WAGE")]
    pub staff_wage: f64,

    /// Population of the planned location.
    #[arg(long, env = "STAFFPLAN_POPULATION")]
    pub population: f64,

    /// Median income of the planned location.
    #[arg(long, env = "STAFFPLAN_MEDIAN_INCOME")]
    pub median_income: f64,

    /// Contribution margin per unit sold.
    #[arg(long, env = "STAFFPLAN_MARGIN", default_value_t = crate::domain::DEFAULT_CONTRIBUTION_MARGIN)]
    pub margin: f64,

    /// Revenue per unit sold.
    #[arg(long, env = "STAFFPLAN_REVENUE", default_value_t = crate::domain::DEFAULT_REVENUE_PER_UNIT)]
    pub revenue: f64,

    /// Fixed overhead for the year.
    #[arg(long, env = "STAFFPLAN_FIXED_COST", default_value_t = crate::domain::DEFAULT_FIXED_COST)]
    pub fixed_cost: f64,

    /// Iteration cap for each month's solver.
    #[arg(long, default_value_t = 500)]
    pub max_iterations: usize,

    /// Export the monthly plan to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output path for the transactions table.
    #[arg(long, value_name = "CSV", default_value = "transactions.csv")]
    pub transactions: PathBuf,

    /// Output path for the reference table.
    #[arg(long, value_name = "CSV", default_value = "reference.csv")]
    pub reference: PathBuf,

    /// Number of locations.
    #[arg(long, default_value_t = 12)]
    pub locations: usize,

    /// Rows per location and month.
    #[arg(long, default_value_t = 2)]
    pub rows_per_month: usize,

    /// Standard deviation of the log-noise on units sold.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_with_files_and_defaults() {
        let cli = Cli::try_parse_from([
            "staffplan",
            "-vv",
            "plan",
            "--transactions",
            "tx.csv",
            "--reference",
            "ref.csv",
            "--expert-wage",
            "50",
            "--staff-wage",
            "30",
            "--population",
            "100000",
            "--median-income",
            "60000",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.data.join_key, "city");
        assert_eq!(args.margin, 100.0);
        assert_eq!(args.revenue, 1000.0);
        assert_eq!(args.fixed_cost, 500_000.0);
        assert_eq!(args.max_iterations, 500);
        assert!(args.model.is_none());
    }

    #[test]
    fn model_conflicts_with_data_files() {
        let res = Cli::try_parse_from([
            "staffplan",
            "plan",
            "--model",
            "m.json",
            "--transactions",
            "tx.csv",
            "--expert-wage",
            "50",
            "--staff-wage",
            "30",
            "--population",
            "1",
            "--median-income",
            "1",
        ]);
        assert!(res.is_err());
    }
}
