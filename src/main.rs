use std::process::ExitCode;

fn main() -> ExitCode {
    match staffing_planner::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("staffplan: {} failed: {err}", err.stage());
            ExitCode::from(err.exit_code())
        }
    }
}
