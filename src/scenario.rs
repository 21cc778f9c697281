//! Running the SIR model for several parameter sets and collecting the results for comparison.
//!
//! A [`ScenarioRunner`] holds everything the scenarios share: the initial compartment sizes, the
//! time grid, the transmission form and the integrator settings. Each scenario only contributes
//! its label and [`Parameters`]. Scenarios are run one after another, each with its own model and
//! integrator state, so the result of one scenario never depends on which scenarios ran before it.
//!
//! ```
//! use sir_ode::{CompartmentState, Parameters, ScenarioRunner, TimeGrid};
//!
//! let initial = CompartmentState::from_population(1000.0, 1.0, 0.0).unwrap();
//! let grid = TimeGrid::linspace(0.0, 160.0, 160).unwrap();
//! let report = ScenarioRunner::new(initial, grid)
//!     .with_scenario("baseline", Parameters::new(0.3, 0.1).unwrap())
//!     .with_scenario("faster", Parameters::new(0.5, 0.2).unwrap())
//!     .run()
//!     .unwrap();
//! assert_eq!(report.results().count(), 2);
//! ```

use crate::error::SirError;
use crate::integrator::{integrate, IntegrationStats, IntegratorOptions};
use crate::model::{CompartmentState, Parameters, SirModel, Transmission, Validation};
use crate::time_grid::TimeGrid;
use crate::trajectory::Trajectory;
use indexmap::IndexMap;
use log::{error, info, warn};
use serde_derive::{Deserialize, Serialize};

/// What to do when a scenario fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure against the scenario's label and keep going
    #[default]
    Continue,
    /// Stop at the first failure and return `SirError::ScenarioFailed`
    FailFast,
}

/// The outcome of a successful scenario.
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub label: String,
    pub parameters: Parameters,
    pub trajectory: Trajectory,
    pub stats: IntegrationStats,
}

/// Headline numbers for a scenario, as written to the summary report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub beta: f64,
    pub gamma: f64,
    pub status: String,
    pub peak_time: Option<f64>,
    pub peak_infected: Option<f64>,
    pub final_susceptible: Option<f64>,
    pub final_infected: Option<f64>,
    pub final_recovered: Option<f64>,
    pub attack_rate: Option<f64>,
    pub population_drift: Option<f64>,
    pub steps: Option<usize>,
}

impl ScenarioResult {
    #[must_use]
    pub fn summary(&self) -> ScenarioSummary {
        let peak = self.trajectory.peak_infected();
        let last = self.trajectory.last();
        ScenarioSummary {
            scenario: self.label.clone(),
            beta: self.parameters.beta(),
            gamma: self.parameters.gamma(),
            status: "ok".to_string(),
            peak_time: Some(peak.time),
            peak_infected: Some(peak.infected),
            final_susceptible: Some(last.susceptible),
            final_infected: Some(last.infected),
            final_recovered: Some(last.recovered),
            attack_rate: Some(self.trajectory.attack_rate()),
            population_drift: Some(self.trajectory.max_population_drift()),
            steps: Some(self.stats.accepted_steps),
        }
    }
}

/// The results of a sweep, keyed by scenario label in the order the scenarios were added.
#[derive(Debug)]
pub struct SweepReport {
    grid: TimeGrid,
    parameters: IndexMap<String, Parameters>,
    outcomes: IndexMap<String, Result<ScenarioResult, SirError>>,
}

impl SweepReport {
    /// The time grid shared by every trajectory in the report.
    #[must_use]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.outcomes.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Result<ScenarioResult, SirError>> {
        self.outcomes.get(label)
    }

    /// The result for `label`, if that scenario ran and succeeded.
    #[must_use]
    pub fn result(&self, label: &str) -> Option<&ScenarioResult> {
        self.outcomes.get(label).and_then(|outcome| outcome.as_ref().ok())
    }

    #[must_use]
    pub fn parameters(&self, label: &str) -> Option<&Parameters> {
        self.parameters.get(label)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &Result<ScenarioResult, SirError>)> {
        self.outcomes
            .iter()
            .map(|(label, outcome)| (label.as_str(), outcome))
    }

    /// Successful scenarios, in order.
    pub fn results(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.outcomes.values().filter_map(|outcome| outcome.as_ref().ok())
    }

    /// Failed scenarios with their errors, in order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SirError)> {
        self.outcomes
            .iter()
            .filter_map(|(label, outcome)| outcome.as_ref().err().map(|e| (label.as_str(), e)))
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(Result::is_ok)
    }

    /// One summary per scenario, failed scenarios included.
    #[must_use]
    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.outcomes
            .iter()
            .map(|(label, outcome)| match outcome {
                Ok(result) => result.summary(),
                Err(error) => {
                    let parameters = self.parameters[label.as_str()];
                    ScenarioSummary {
                        scenario: label.clone(),
                        beta: parameters.beta(),
                        gamma: parameters.gamma(),
                        status: error.to_string(),
                        peak_time: None,
                        peak_infected: None,
                        final_susceptible: None,
                        final_infected: None,
                        final_recovered: None,
                        attack_rate: None,
                        population_drift: None,
                        steps: None,
                    }
                }
            })
            .collect()
    }
}

/// Runs the SIR model once per scenario against a shared initial state and time grid.
#[derive(Clone, Debug)]
pub struct ScenarioRunner {
    initial: CompartmentState,
    grid: TimeGrid,
    scenarios: IndexMap<String, Parameters>,
    transmission: Transmission,
    validation: Validation,
    failure_policy: FailurePolicy,
    options: IntegratorOptions,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(initial: CompartmentState, grid: TimeGrid) -> Self {
        ScenarioRunner {
            initial,
            grid,
            scenarios: IndexMap::new(),
            transmission: Transmission::default(),
            validation: Validation::default(),
            failure_policy: FailurePolicy::default(),
            options: IntegratorOptions::default(),
        }
    }

    #[must_use]
    pub fn with_transmission(mut self, transmission: Transmission) -> Self {
        self.transmission = transmission;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    #[must_use]
    pub fn with_integrator_options(mut self, options: IntegratorOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, label: impl Into<String>, parameters: Parameters) -> Self {
        self.add_scenario(label, parameters);
        self
    }

    /// Adds a scenario to the end of the run order.
    ///
    /// Labels are expected to be unique. Adding a label a second time replaces the earlier
    /// scenario's parameters (last write wins) but keeps its original position in the run order.
    pub fn add_scenario(&mut self, label: impl Into<String>, parameters: Parameters) {
        let label = label.into();
        if let Some(previous) = self.scenarios.insert(label.clone(), parameters) {
            warn!(
                "Scenario '{label}' was added twice; replacing {previous:?} with {parameters:?}"
            );
        }
    }

    #[must_use]
    pub fn initial(&self) -> &CompartmentState {
        &self.initial
    }

    #[must_use]
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn scenarios(&self) -> impl Iterator<Item = (&str, &Parameters)> {
        self.scenarios
            .iter()
            .map(|(label, parameters)| (label.as_str(), parameters))
    }

    /// Runs every scenario in the order they were added.
    ///
    /// # Errors
    /// Returns `SirError::ConfigurationError` if there are no scenarios or the integrator options
    /// are invalid, and `SirError::InvalidParameter` if strict validation rejects the shared initial
    /// state; no scenario runs in these cases. With `FailurePolicy::FailFast`, the first failing
    /// scenario stops the sweep with `SirError::ScenarioFailed`. With `FailurePolicy::Continue`,
    /// failures are recorded in the report instead.
    pub fn run(&self) -> Result<SweepReport, SirError> {
        if self.scenarios.is_empty() {
            return Err(SirError::configuration("no scenarios to run"));
        }
        self.options.validate()?;
        self.validation.check_state(&self.initial)?;

        let mut outcomes = IndexMap::with_capacity(self.scenarios.len());
        for (label, parameters) in &self.scenarios {
            info!(
                "Running scenario '{label}' (beta = {}, gamma = {})",
                parameters.beta(),
                parameters.gamma()
            );
            match self.run_scenario(label, parameters) {
                Ok(result) => {
                    let peak = result.trajectory.peak_infected();
                    info!(
                        "Scenario '{label}': infections peak at {:.3} on t = {:.3}",
                        peak.infected, peak.time
                    );
                    outcomes.insert(label.clone(), Ok(result));
                }
                Err(e) => {
                    error!("Scenario '{label}' failed: {e}");
                    if self.failure_policy == FailurePolicy::FailFast {
                        return Err(SirError::ScenarioFailed {
                            label: label.clone(),
                            source: Box::new(e),
                        });
                    }
                    outcomes.insert(label.clone(), Err(e));
                }
            }
        }

        Ok(SweepReport {
            grid: self.grid.clone(),
            parameters: self.scenarios.clone(),
            outcomes,
        })
    }

    /// Runs a single scenario against the shared initial state and time grid.
    ///
    /// # Errors
    /// Returns `SirError::InvalidParameter` if the parameters fail validation or the model cannot
    /// be built, and `SirError::NumericalDivergence` if integration fails.
    pub fn run_scenario(
        &self,
        label: &str,
        parameters: &Parameters,
    ) -> Result<ScenarioResult, SirError> {
        self.validation.check_parameters(parameters)?;
        let model = SirModel::new(*parameters, self.transmission, self.initial.total())?;
        let integration = integrate(&model, self.initial.to_array(), &self.grid, &self.options)?;
        let states = integration
            .states
            .into_iter()
            .map(CompartmentState::from_array)
            .collect();
        Ok(ScenarioResult {
            label: label.to_string(),
            parameters: *parameters,
            trajectory: Trajectory::new(&self.grid, states)?,
            stats: integration.stats,
        })
    }
}
