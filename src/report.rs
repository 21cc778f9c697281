//! CSV output for sweep results.
//!
//! Two reports are produced from a [`SweepReport`]:
//! * `trajectories.csv`: one row per scenario and grid point, with columns
//!   `scenario,t,susceptible,infected,recovered`
//! * `summary.csv`: one row per scenario with its rates, status and headline numbers. Failed
//!   scenarios carry the error message in `status` and leave the remaining columns empty.

use crate::error::SirError;
use crate::scenario::SweepReport;
use csv::Writer;
use log::info;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TRAJECTORIES_FILE: &str = "trajectories.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful.
fn generate_validate_filepath(path: &Path) -> Result<File, SirError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SirError::configuration(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

/// Writes every successful trajectory to `path` in long format.
///
/// # Errors
/// Returns an error if `path` is not a `.csv` file or cannot be written.
pub fn write_trajectories(report: &SweepReport, path: &Path) -> Result<(), SirError> {
    let mut writer = Writer::from_writer(generate_validate_filepath(path)?);
    for result in report.results() {
        for row in result.trajectory.rows(&result.label) {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes one summary row per scenario to `path`.
///
/// # Errors
/// Returns an error if `path` is not a `.csv` file or cannot be written.
pub fn write_summary(report: &SweepReport, path: &Path) -> Result<(), SirError> {
    write_summary_to(report, generate_validate_filepath(path)?)
}

/// Writes the summary rows as CSV to any writer, e.g. standard output.
///
/// # Errors
/// Returns an error if a row cannot be written.
pub fn write_summary_to<W: Write>(report: &SweepReport, output: W) -> Result<(), SirError> {
    let mut writer = Writer::from_writer(output);
    for summary in report.summaries() {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes both reports into `directory`, creating it if needed, and returns their paths.
///
/// # Errors
/// Returns an error if either report cannot be written.
pub fn write_reports(report: &SweepReport, directory: &Path) -> Result<Vec<PathBuf>, SirError> {
    let trajectories = directory.join(TRAJECTORIES_FILE);
    let summary = directory.join(SUMMARY_FILE);
    write_trajectories(report, &trajectories)?;
    write_summary(report, &summary)?;
    info!("Wrote reports to {}", directory.display());
    Ok(vec![trajectories, summary])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::IntegratorOptions;
    use crate::model::{CompartmentState, Parameters};
    use crate::scenario::ScenarioRunner;
    use crate::time_grid::TimeGrid;
    use serde_derive::Deserialize;
    use tempfile::tempdir;

    #[derive(Deserialize)]
    struct TrajectoryRecord {
        scenario: String,
        t: f64,
        susceptible: f64,
        infected: f64,
        recovered: f64,
    }

    #[derive(Deserialize)]
    struct SummaryRecord {
        scenario: String,
        beta: f64,
        status: String,
        peak_time: Option<f64>,
    }

    fn sweep() -> SweepReport {
        let initial = CompartmentState::from_population(100.0, 1.0, 0.0).unwrap();
        let grid = TimeGrid::linspace(0.0, 10.0, 11).unwrap();
        ScenarioRunner::new(initial, grid)
            .with_integrator_options(IntegratorOptions {
                max_steps: 500,
                ..IntegratorOptions::default()
            })
            .with_scenario("mild", Parameters::new(0.002, 0.1).unwrap())
            .with_scenario("recovery only", Parameters::new(0.0, 0.5).unwrap())
            .with_scenario("explosive", Parameters::new(1e6, 0.1).unwrap())
            .run()
            .unwrap()
    }

    #[test]
    fn writes_trajectories_in_long_format() {
        let report = sweep();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("out").join("trajectories.csv");
        write_trajectories(&report, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<TrajectoryRecord> =
            reader.deserialize().map(|record| record.unwrap()).collect();
        // Two successful scenarios of 11 points each; the failed one is left out.
        assert_eq!(records.len(), 22);
        assert_eq!(records[0].scenario, "mild");
        assert_eq!(records[0].t, 0.0);
        assert_eq!(records[0].susceptible, 99.0);
        assert_eq!(records[11].scenario, "recovery only");
        let last = &records[21];
        assert_eq!(last.t, 10.0);
        assert!((last.infected - (-5.0_f64).exp()).abs() < 1e-7);
        assert!((last.recovered + last.infected + last.susceptible - 100.0).abs() < 1e-9);
    }

    #[test]
    fn writes_a_summary_row_per_scenario() {
        let report = sweep();
        let temp_dir = tempdir().unwrap();
        let paths = write_reports(&report, temp_dir.path()).unwrap();
        assert!(paths.iter().all(|path| path.exists()));

        let mut reader = csv::Reader::from_path(temp_dir.path().join(SUMMARY_FILE)).unwrap();
        let records: Vec<SummaryRecord> =
            reader.deserialize().map(|record| record.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, "ok");
        assert_eq!(records[1].beta, 0.0);
        assert_eq!(records[1].peak_time, Some(0.0));
        assert_eq!(records[2].scenario, "explosive");
        assert!(records[2].status.starts_with("numerical divergence"));
        assert_eq!(records[2].peak_time, None);
    }

    #[test]
    fn summary_can_go_to_any_writer() {
        let mut buffer = Vec::new();
        write_summary_to(&sweep(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("scenario,beta,gamma,status"));
        assert!(lines.next().unwrap().starts_with("mild,"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let result = write_summary(&sweep(), &temp_dir.path().join("summary.tsv"));
        assert!(matches!(result, Err(SirError::ConfigurationError(_))));
    }
}
