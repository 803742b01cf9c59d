//! fs-drift-rs CLI entry point.

use clap::Parser;
use fs_drift_rs::config::cli::Cli;
use fs_drift_rs::config::validator;
use fs_drift_rs::coordinator::{HostLauncher, LocalLauncher};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("fs-drift-rs: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` when every worker reported `OK` (§6 exit code 0),
/// `Ok(false)` when the run completed but some worker did not (exit 1).
fn run(cli: Cli) -> anyhow::Result<bool> {
    let params = cli.into_parameters()?;
    validator::validate(&params)?;
    let params = Arc::new(params);

    let output_json = params.output_json.clone();
    let result = LocalLauncher.run(params)?;

    let json = serde_json::to_string_pretty(&result)?;
    if let Some(path) = output_json {
        std::fs::write(&path, &json)?;
    } else {
        println!("{json}");
    }

    Ok(result.all_ok())
}
