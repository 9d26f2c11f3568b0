//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the fit / plan pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FitArgs, PlanArgs, SimulateArgs};
use crate::data::{SampleSpec, generate_dataset};
use crate::domain::{ColumnNames, DataSource, EconomicInputs, PlanConfig};
use crate::error::StaffingError;
use crate::io::{write_model_json, write_sample_csv};
use crate::math::SolverOptions;

pub mod pipeline;

/// Entry point for the `staffplan` binary.
pub fn run() -> Result<(), StaffingError> {
    // Economic flags can come from STAFFPLAN_* variables; a local `.env` is optional.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Plan(args) => handle_plan(&args),
        Command::Fit(args) => handle_fit(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

/// Log to stderr so stdout stays a clean report. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_plan(args: &PlanArgs) -> Result<(), StaffingError> {
    let config = plan_config_from_args(args)?;
    let out = pipeline::run_plan(&config)?;

    if matches!(config.source, DataSource::Files { .. }) {
        println!("{}", crate::report::format_fit_summary(&out.estimation));
    }
    let p = &out.estimation.params;
    if p.alpha + p.beta >= 1.0 {
        warn!(
            alpha = p.alpha,
            beta = p.beta,
            "non-decreasing returns to labor: the recommendation is not a profit maximum"
        );
    }
    println!("{}", crate::report::format_plan(&out.rows));
    println!("{}", crate::report::format_net_income(&out.income));
    Ok(())
}

fn handle_fit(args: &FitArgs) -> Result<(), StaffingError> {
    let (transactions, reference) = required_data_paths(&args.data)?;
    let columns = ColumnNames {
        join_key: args.data.join_key.clone(),
    };
    let dataset = pipeline::load_and_prepare(&transactions, &reference, &columns)?;
    let estimation = pipeline::run_fit(&dataset)?;

    println!("{}", crate::report::format_fit_summary(&estimation));
    if let Some(path) = &args.export_model {
        write_model_json(path, &estimation)?;
        info!(path = %path.display(), "wrote model");
    }
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), StaffingError> {
    let spec = SampleSpec {
        locations: args.locations,
        rows_per_month: args.rows_per_month,
        noise_sigma: args.noise,
        ..SampleSpec::demo(args.seed)
    };
    let sample = generate_dataset(&spec)?;
    write_sample_csv(&args.transactions, &args.reference, &sample)?;

    println!(
        "Wrote {} transactions to {} and {} locations to {}",
        sample.transactions.len(),
        args.transactions.display(),
        sample.reference.len(),
        args.reference.display()
    );
    Ok(())
}

/// Convert parsed flags into the pipeline's plain configuration.
pub fn plan_config_from_args(args: &PlanArgs) -> Result<PlanConfig, StaffingError> {
    let source = match &args.model {
        Some(path) => DataSource::Model(path.clone()),
        None => {
            let (transactions, reference) = required_data_paths(&args.data)?;
            DataSource::Files {
                transactions,
                reference,
                columns: ColumnNames {
                    join_key: args.data.join_key.clone(),
                },
            }
        }
    };

    Ok(PlanConfig {
        source,
        economics: EconomicInputs {
            contribution_margin: args.margin,
            revenue_per_unit: args.revenue,
            ..EconomicInputs::new(args.expert_wage, args.staff_wage, args.population, args.median_income)
        },
        fixed_cost: args.fixed_cost,
        solver: SolverOptions {
            max_iterations: args.max_iterations,
            ..SolverOptions::default()
        },
        export_plan: args.export.clone(),
        export_model: args.export_model.clone(),
    })
}

fn required_data_paths(
    data: &crate::cli::DataArgs,
) -> Result<(std::path::PathBuf, std::path::PathBuf), StaffingError> {
    match (&data.transactions, &data.reference) {
        (Some(t), Some(r)) => Ok((t.clone(), r.clone())),
        _ => Err(StaffingError::validation(
            "both --transactions and --reference are required (or --model for `plan`)",
        )),
    }
}
