//! Command line entry point for the `sir-sweep` binary.
//!
//! ```text
//! sir-sweep [--config <path>] [--output-dir <dir>] [--log-level <level>] [--fail-fast]
//! ```
//!
//! Without `--config` the built-in comparison of `beta = 0.3, gamma = 0.1` against
//! `beta = 0.5, gamma = 0.2` is run. The summary is printed to standard output as CSV; with
//! `--output-dir` both reports are also written there.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::config::SweepConfig;
use crate::error::SirError;
use crate::log::{error, info, set_log_level, LevelFilter};
use crate::report::{write_reports, write_summary_to};
use crate::scenario::{FailurePolicy, SweepReport};

/// Every scenario succeeded.
pub const EXIT_SUCCESS: u8 = 0;
/// The configuration could not be loaded or was invalid, or reports could not be written.
pub const EXIT_CONFIGURATION_ERROR: u8 = 1;
/// At least one scenario failed.
pub const EXIT_SCENARIO_FAILED: u8 = 2;

/// Command line arguments for `sir-sweep`
#[derive(Parser, Debug)]
#[command(
    name = "sir-sweep",
    version,
    about = "Integrates the SIR model for a set of parameter scenarios"
)]
pub struct Args {
    /// Optional path to a JSON sweep configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for CSV report output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(short, long, default_value = "off", value_parser = parse_level_filter)]
    pub log_level: LevelFilter,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            config: None,
            output_dir: None,
            log_level: LevelFilter::Off,
            fail_fast: false,
        }
    }
}

fn parse_level_filter(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level '{level}'"))
}

/// Runs a sweep as described by `args` and writes any requested reports. The log level is left to
/// the caller.
///
/// A report is returned even when some scenarios failed under the continue policy; use
/// [`exit_code`] to turn the outcome into a process status.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded, if the sweep cannot start, if a
/// scenario fails under `--fail-fast`, or if the reports cannot be written.
pub fn run_with_args(args: &Args) -> Result<SweepReport, SirError> {
    let mut config = match &args.config {
        Some(path) => SweepConfig::from_path(path)?,
        None => {
            info!("No configuration given, running the built-in comparison");
            SweepConfig::default()
        }
    };
    if args.fail_fast {
        config.failure_policy = FailurePolicy::FailFast;
    }

    let report = config.runner()?.run()?;

    if let Some(output_dir) = &args.output_dir {
        write_reports(&report, output_dir)?;
    }
    Ok(report)
}

/// Maps the outcome of [`run_with_args`] to the process exit status.
#[must_use]
pub fn exit_code(outcome: &Result<SweepReport, SirError>) -> u8 {
    match outcome {
        Ok(report) if report.all_succeeded() => EXIT_SUCCESS,
        Ok(_) | Err(SirError::ScenarioFailed { .. } | SirError::NumericalDivergence { .. }) => {
            EXIT_SCENARIO_FAILED
        }
        Err(_) => EXIT_CONFIGURATION_ERROR,
    }
}

/// Parses the process arguments, runs the sweep and prints the summary.
#[must_use]
pub fn run() -> ExitCode {
    let args = Args::parse();
    set_log_level(args.log_level);
    let outcome = run_with_args(&args);
    match &outcome {
        Ok(report) => {
            if let Err(e) = write_summary_to(report, io::stdout()) {
                eprintln!("sir-sweep: could not print summary: {e}");
                return ExitCode::from(EXIT_CONFIGURATION_ERROR);
            }
            for (label, e) in report.failures() {
                eprintln!("sir-sweep: scenario '{label}' failed: {e}");
            }
        }
        Err(e) => {
            error!("{e}");
            eprintln!("sir-sweep: {e}");
        }
    }
    ExitCode::from(exit_code(&outcome))
}
