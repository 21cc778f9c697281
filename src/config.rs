//! Sweep configuration files.
//!
//! A sweep is described by a JSON document such as
//!
//! ```json
//! {
//!     "population": 1000.0,
//!     "initial_infected": 1.0,
//!     "time": { "start": 0.0, "stop": 160.0, "samples": 160 },
//!     "transmission": "mass_action",
//!     "scenarios": [
//!         { "label": "baseline", "beta": 0.3, "gamma": 0.1 },
//!         { "label": "faster", "beta": 0.5, "gamma": 0.2 }
//!     ]
//! }
//! ```
//!
//! `initial_recovered` defaults to zero. The time grid is given either as `start`/`stop`/`samples`
//! (evenly spaced, both ends included) or as an explicit list of `points`, optionally with
//! `samples` as a length check. `transmission`, `validation`, `failure_policy` and `integrator`
//! are optional and default to mass action, permissive validation, continue-on-failure and the
//! default [`IntegratorOptions`]. Unknown fields are rejected.

use crate::error::SirError;
use crate::integrator::IntegratorOptions;
use crate::model::{CompartmentState, Parameters, Transmission, Validation};
use crate::scenario::{FailurePolicy, ScenarioRunner};
use crate::time_grid::TimeGrid;
use log::info;
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub population: f64,
    pub initial_infected: f64,
    #[serde(default)]
    pub initial_recovered: f64,
    pub time: TimeConfig,
    #[serde(default)]
    pub transmission: Transmission,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub integrator: IntegratorOptions,
    pub scenarios: Vec<ScenarioConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub label: String,
    pub beta: f64,
    pub gamma: f64,
}

impl TimeConfig {
    /// # Errors
    /// Returns `SirError::ConfigurationError` if the grid is malformed, if neither or both forms
    /// are given, or if an explicit list of points does not have `samples` entries.
    pub fn to_grid(&self) -> Result<TimeGrid, SirError> {
        match (&self.points, self.start, self.stop, self.samples) {
            (Some(points), None, None, samples) => {
                let grid = TimeGrid::new(points.clone())?;
                if let Some(samples) = samples {
                    grid.expect_len(samples)?;
                }
                Ok(grid)
            }
            (None, Some(start), Some(stop), Some(samples)) => {
                TimeGrid::linspace(start, stop, samples)
            }
            _ => Err(SirError::configuration(
                "time must give either `points` or all of `start`, `stop` and `samples`",
            )),
        }
    }
}

impl Default for SweepConfig {
    /// One infected individual in a population of 1000, followed for 160 days, comparing
    /// `beta = 0.3, gamma = 0.1` with the faster `beta = 0.5, gamma = 0.2`.
    fn default() -> Self {
        SweepConfig {
            population: 1000.0,
            initial_infected: 1.0,
            initial_recovered: 0.0,
            time: TimeConfig {
                start: Some(0.0),
                stop: Some(160.0),
                samples: Some(160),
                points: None,
            },
            transmission: Transmission::default(),
            validation: Validation::default(),
            failure_policy: FailurePolicy::default(),
            integrator: IntegratorOptions::default(),
            scenarios: vec![
                ScenarioConfig {
                    label: "beta=0.3, gamma=0.1".to_string(),
                    beta: 0.3,
                    gamma: 0.1,
                },
                ScenarioConfig {
                    label: "beta=0.5, gamma=0.2".to_string(),
                    beta: 0.5,
                    gamma: 0.2,
                },
            ],
        }
    }
}

impl SweepConfig {
    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns `SirError::IoError` if the file cannot be read and `SirError::JsonError` if it is
    /// not a valid configuration.
    pub fn from_path(path: &Path) -> Result<Self, SirError> {
        info!("Loading sweep configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// # Errors
    /// Returns `SirError::JsonError` if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, SirError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns `SirError::InvalidParameter` if a compartment size is not finite.
    pub fn initial_state(&self) -> Result<CompartmentState, SirError> {
        CompartmentState::from_population(
            self.population,
            self.initial_infected,
            self.initial_recovered,
        )
    }

    /// Builds a runner with every scenario in the configuration.
    ///
    /// # Errors
    /// Returns `SirError::ConfigurationError` for a malformed time grid, invalid integrator options
    /// or an empty scenario list, and `SirError::InvalidParameter` for non-finite values.
    pub fn runner(&self) -> Result<ScenarioRunner, SirError> {
        if self.scenarios.is_empty() {
            return Err(SirError::configuration(
                "configuration must list at least one scenario",
            ));
        }
        self.integrator.validate()?;
        let mut runner = ScenarioRunner::new(self.initial_state()?, self.time.to_grid()?)
            .with_transmission(self.transmission)
            .with_validation(self.validation)
            .with_failure_policy(self.failure_policy)
            .with_integrator_options(self.integrator);
        for scenario in &self.scenarios {
            let parameters =
                Parameters::new(scenario.beta, scenario.gamma).map_err(|e| match e {
                    SirError::InvalidParameter(message) => SirError::invalid_parameter(format!(
                        "scenario '{}': {message}",
                        scenario.label
                    )),
                    other => other,
                })?;
            runner.add_scenario(scenario.label.clone(), parameters);
        }
        Ok(runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"{
        "population": 500.0,
        "initial_infected": 5.0,
        "initial_recovered": 10.0,
        "time": { "start": 0.0, "stop": 50.0, "samples": 51 },
        "transmission": "frequency_dependent",
        "validation": "strict",
        "failure_policy": "fail_fast",
        "integrator": { "rtol": 1e-6, "max_steps": 2000 },
        "scenarios": [
            { "label": "slow", "beta": 0.2, "gamma": 0.1 },
            { "label": "fast", "beta": 0.6, "gamma": 0.1 }
        ]
    }"#;

    #[test]
    fn parses_a_full_configuration() {
        let config = SweepConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.transmission, Transmission::FrequencyDependent);
        assert_eq!(config.validation, Validation::Strict);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.integrator.rtol, 1e-6);
        // Unspecified integrator options keep their defaults.
        assert_eq!(config.integrator.atol, IntegratorOptions::default().atol);
        assert_eq!(config.integrator.max_steps, 2000);

        let initial = config.initial_state().unwrap();
        assert_eq!(initial, CompartmentState::new(485.0, 5.0, 10.0).unwrap());

        let runner = config.runner().unwrap();
        let labels: Vec<_> = runner.scenarios().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["slow", "fast"]);
        assert_eq!(runner.grid().len(), 51);
    }

    #[test]
    fn defaults_apply_to_optional_fields() {
        let config = SweepConfig::from_json(
            r#"{
                "population": 100.0,
                "initial_infected": 1.0,
                "time": { "points": [0.0, 1.0, 2.5] },
                "scenarios": [{ "label": "a", "beta": 0.01, "gamma": 0.1 }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.initial_recovered, 0.0);
        assert_eq!(config.transmission, Transmission::MassAction);
        assert_eq!(config.validation, Validation::Permissive);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.integrator, IntegratorOptions::default());
        assert_eq!(config.time.to_grid().unwrap().points(), &[0.0, 1.0, 2.5]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = SweepConfig::from_json(
            r#"{
                "population": 100.0,
                "initial_infected": 1.0,
                "time": { "points": [0.0, 1.0] },
                "scenarios": [],
                "seed": 42
            }"#,
        );
        assert!(matches!(result, Err(SirError::JsonError(_))));
    }

    #[test]
    fn time_grid_forms() {
        let mismatched = TimeConfig {
            points: Some(vec![0.0, 1.0, 2.0]),
            samples: Some(4),
            ..TimeConfig::default()
        };
        assert!(matches!(
            mismatched.to_grid(),
            Err(SirError::ConfigurationError(_))
        ));

        let both = TimeConfig {
            start: Some(0.0),
            stop: Some(1.0),
            samples: Some(2),
            points: Some(vec![0.0, 1.0]),
        };
        assert!(matches!(
            both.to_grid(),
            Err(SirError::ConfigurationError(_))
        ));

        let incomplete = TimeConfig {
            start: Some(0.0),
            samples: Some(2),
            ..TimeConfig::default()
        };
        assert!(incomplete.to_grid().is_err());

        let unordered = TimeConfig {
            points: Some(vec![0.0, 2.0, 1.0]),
            ..TimeConfig::default()
        };
        assert!(unordered.to_grid().is_err());
    }

    #[test]
    fn empty_scenario_list_is_rejected() {
        let mut config = SweepConfig::default();
        config.scenarios.clear();
        assert!(matches!(
            config.runner(),
            Err(SirError::ConfigurationError(_))
        ));
    }

    #[test]
    fn non_finite_rate_is_an_invalid_parameter() {
        let mut config = SweepConfig::default();
        config.scenarios[1].gamma = f64::NAN;
        match config.runner() {
            Err(SirError::InvalidParameter(message)) => {
                assert!(message.contains("beta=0.5, gamma=0.2"), "{message}");
            }
            other => panic!("expected an invalid parameter, got {other:?}"),
        }
    }

    #[test]
    fn default_configuration_is_the_reference_comparison() {
        let config = SweepConfig::default();
        let runner = config.runner().unwrap();
        assert_eq!(runner.initial().total(), 1000.0);
        assert_eq!(runner.grid().len(), 160);
        assert_eq!(runner.grid().end(), 160.0);
        let parameters: Vec<_> = runner
            .scenarios()
            .map(|(_, p)| (p.beta(), p.gamma()))
            .collect();
        assert_eq!(parameters, vec![(0.3, 0.1), (0.5, 0.2)]);
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = SweepConfig::from_path(file.path()).unwrap();
        assert_eq!(config.scenarios.len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SweepConfig::from_path(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(SirError::IoError(_))));
    }
}
