use crate::error::SirError;
use crate::model::CompartmentState;
use crate::numeric::relative_difference;
use crate::time_grid::TimeGrid;
use serde_derive::Serialize;

/// The compartment sizes at every point of a time grid. Index `k` of the trajectory is the state at
/// `times()[k]`; entry 0 is the initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<CompartmentState>,
}

/// The largest infected count seen along a trajectory.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Peak {
    pub index: usize,
    pub time: f64,
    pub infected: f64,
}

/// One row of a trajectory, as written to reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrajectoryRow<'a> {
    pub scenario: &'a str,
    pub t: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl Trajectory {
    /// # Errors
    /// Returns `SirError::ConfigurationError` if there is not exactly one state per grid point.
    pub fn new(grid: &TimeGrid, states: Vec<CompartmentState>) -> Result<Self, SirError> {
        if states.len() != grid.len() {
            return Err(SirError::configuration(format!(
                "trajectory has {} states for a grid of {} points",
                states.len(),
                grid.len()
            )));
        }
        Ok(Trajectory {
            times: grid.points().to_vec(),
            states,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; a trajectory holds at least the initial state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn states(&self) -> &[CompartmentState] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &CompartmentState)> + '_ {
        self.times.iter().copied().zip(&self.states)
    }

    #[must_use]
    pub fn initial(&self) -> &CompartmentState {
        &self.states[0]
    }

    #[must_use]
    pub fn last(&self) -> &CompartmentState {
        &self.states[self.states.len() - 1]
    }

    #[must_use]
    pub fn susceptible(&self) -> Vec<f64> {
        self.states.iter().map(|state| state.susceptible).collect()
    }

    #[must_use]
    pub fn infected(&self) -> Vec<f64> {
        self.states.iter().map(|state| state.infected).collect()
    }

    #[must_use]
    pub fn recovered(&self) -> Vec<f64> {
        self.states.iter().map(|state| state.recovered).collect()
    }

    /// The grid point with the most infected individuals. Ties go to the earliest point.
    #[must_use]
    pub fn peak_infected(&self) -> Peak {
        let mut peak = Peak {
            index: 0,
            time: self.times[0],
            infected: self.states[0].infected,
        };
        for (index, (time, state)) in self.iter().enumerate().skip(1) {
            if state.infected > peak.infected {
                peak = Peak {
                    index,
                    time,
                    infected: state.infected,
                };
            }
        }
        peak
    }

    /// The largest relative deviation of `S + I + R` from its initial value.
    #[must_use]
    pub fn max_population_drift(&self) -> f64 {
        let initial = self.initial().total();
        self.states
            .iter()
            .map(|state| relative_difference(state.total(), initial))
            .fold(0.0, f64::max)
    }

    /// The share of the population that left the susceptible compartment over the run, or zero
    /// for an empty population.
    #[must_use]
    pub fn attack_rate(&self) -> f64 {
        let population = self.initial().total();
        if population == 0.0 {
            return 0.0;
        }
        (self.initial().susceptible - self.last().susceptible) / population
    }

    /// The trajectory as report rows tagged with `scenario`.
    pub fn rows<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = TrajectoryRow<'a>> + 'a {
        self.iter().map(move |(t, state)| TrajectoryRow {
            scenario,
            t,
            susceptible: state.susceptible,
            infected: state.infected,
            recovered: state.recovered,
        })
    }
}
