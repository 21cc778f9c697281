//! The SIR model equations.
//!
//! The population is split into three compartments, Susceptible, Infected and Recovered, whose
//! sizes evolve according to
//!
//! ```text
//! dS/dt = -β·S·I
//! dI/dt =  β·S·I - γ·I
//! dR/dt =  γ·I
//! ```
//!
//! The incidence term `β·S·I` is mass action; [`Transmission::FrequencyDependent`] divides it by
//! the (conserved) total population instead. Nothing here clamps or validates ranges: the rates are
//! a pure map and are evaluated at whatever intermediate states the integrator produces.
//! Range checks live in [`Validation`].

use crate::error::SirError;
use serde_derive::{Deserialize, Serialize};

/// The right hand side `dy/dt = f(t, y)` of a system of `D` first-order ODEs.
pub trait OdeSystem<const D: usize> {
    fn rhs(&self, t: f64, y: &[f64; D]) -> [f64; D];
}

/// Sizes of the Susceptible, Infected and Recovered compartments, either as counts or as fractions
/// of the population.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CompartmentState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl CompartmentState {
    /// Creates a state from the three compartment sizes.
    ///
    /// # Errors
    /// Returns `SirError::InvalidParameter` if any value is `NaN` or infinite.
    pub fn new(susceptible: f64, infected: f64, recovered: f64) -> Result<Self, SirError> {
        for (name, value) in [
            ("susceptible", susceptible),
            ("infected", infected),
            ("recovered", recovered),
        ] {
            if !value.is_finite() {
                return Err(SirError::invalid_parameter(format!(
                    "{name} compartment must be finite, got {value}"
                )));
            }
        }
        Ok(CompartmentState {
            susceptible,
            infected,
            recovered,
        })
    }

    /// Seeds a closed population of size `population` with `infected` and `recovered`
    /// individuals; everybody else is susceptible.
    ///
    /// # Errors
    /// Returns `SirError::InvalidParameter` if any value is `NaN` or infinite.
    pub fn from_population(population: f64, infected: f64, recovered: f64) -> Result<Self, SirError> {
        if !population.is_finite() {
            return Err(SirError::invalid_parameter(format!(
                "population must be finite, got {population}"
            )));
        }
        Self::new(population - infected - recovered, infected, recovered)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.susceptible, self.infected, self.recovered]
    }

    #[must_use]
    pub fn from_array([susceptible, infected, recovered]: [f64; 3]) -> Self {
        CompartmentState {
            susceptible,
            infected,
            recovered,
        }
    }
}

/// The transmission rate `beta` and recovery rate `gamma` of a scenario.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Parameters {
    beta: f64,
    gamma: f64,
}

impl Parameters {
    /// # Errors
    /// Returns `SirError::InvalidParameter` if either rate is `NaN` or infinite. Negative rates are
    /// accepted here; see [`Validation::Strict`].
    pub fn new(beta: f64, gamma: f64) -> Result<Self, SirError> {
        if !beta.is_finite() {
            return Err(SirError::invalid_parameter(format!(
                "transmission rate beta must be finite, got {beta}"
            )));
        }
        if !gamma.is_finite() {
            return Err(SirError::invalid_parameter(format!(
                "recovery rate gamma must be finite, got {gamma}"
            )));
        }
        Ok(Parameters { beta, gamma })
    }

    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

/// How the incidence term scales with population size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    /// Incidence `β·S·I`
    #[default]
    MassAction,
    /// Incidence `β·S·I/N` where `N` is the total population
    FrequencyDependent,
}

/// How strictly inputs are checked before integrating.
///
/// Non-finite values are always rejected when `Parameters` and `CompartmentState` are built.
/// Beyond that, negative rates or compartments still describe a well-defined (if meaningless)
/// system, so they are only rejected in `Strict` mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    #[default]
    Permissive,
    Strict,
}

impl Validation {
    /// # Errors
    /// Returns `SirError::InvalidParameter` if `Strict` and a rate is negative.
    pub fn check_parameters(self, parameters: &Parameters) -> Result<(), SirError> {
        if self == Validation::Permissive {
            return Ok(());
        }
        if parameters.beta < 0.0 {
            return Err(SirError::invalid_parameter(format!(
                "transmission rate beta must be non-negative, got {}",
                parameters.beta
            )));
        }
        if parameters.gamma < 0.0 {
            return Err(SirError::invalid_parameter(format!(
                "recovery rate gamma must be non-negative, got {}",
                parameters.gamma
            )));
        }
        Ok(())
    }

    /// # Errors
    /// Returns `SirError::InvalidParameter` if `Strict` and a compartment is negative or the
    /// population is empty.
    pub fn check_state(self, state: &CompartmentState) -> Result<(), SirError> {
        if self == Validation::Permissive {
            return Ok(());
        }
        if state.to_array().iter().any(|value| *value < 0.0) {
            return Err(SirError::invalid_parameter(format!(
                "compartments must be non-negative, got {state:?}"
            )));
        }
        if state.total() <= 0.0 {
            return Err(SirError::invalid_parameter(
                "total population must be positive",
            ));
        }
        Ok(())
    }
}

/// Rates of change of the mass-action SIR system at `state`.
#[must_use]
pub fn sir_rates(state: &CompartmentState, parameters: &Parameters) -> CompartmentState {
    let incidence = parameters.beta * state.susceptible * state.infected;
    let recovery = parameters.gamma * state.infected;
    CompartmentState::from_array([-incidence, incidence - recovery, recovery])
}

/// A SIR system ready to be handed to the integrator.
#[derive(Clone, Debug)]
pub struct SirModel {
    parameters: Parameters,
    transmission: Transmission,
    population: f64,
}

impl SirModel {
    /// Builds the system for `parameters`. `population` is the conserved total `S + I + R`; it is
    /// only used by frequency-dependent transmission.
    ///
    /// # Errors
    /// Returns `SirError::InvalidParameter` if transmission is frequency dependent and the
    /// population is not a positive finite number.
    pub fn new(
        parameters: Parameters,
        transmission: Transmission,
        population: f64,
    ) -> Result<Self, SirError> {
        if transmission == Transmission::FrequencyDependent
            && !(population.is_finite() && population > 0.0)
        {
            return Err(SirError::invalid_parameter(format!(
                "frequency-dependent transmission requires a positive population, got {population}"
            )));
        }
        Ok(SirModel {
            parameters,
            transmission,
            population,
        })
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn rates(&self, state: &CompartmentState) -> CompartmentState {
        match self.transmission {
            Transmission::MassAction => sir_rates(state, &self.parameters),
            Transmission::FrequencyDependent => {
                let incidence = self.parameters.beta * state.susceptible * state.infected
                    / self.population;
                let recovery = self.parameters.gamma * state.infected;
                CompartmentState::from_array([-incidence, incidence - recovery, recovery])
            }
        }
    }
}

impl OdeSystem<3> for SirModel {
    fn rhs(&self, _t: f64, y: &[f64; 3]) -> [f64; 3] {
        self.rates(&CompartmentState::from_array(*y)).to_array()
    }
}
