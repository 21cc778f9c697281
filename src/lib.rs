//! A deterministic SIR (Susceptible, Infected, Recovered) compartmental epidemic model.
//!
//! The crate is built from three layers:
//! * [`model`]: the rate equations `dS/dt = -beta*S*I`, `dI/dt = beta*S*I - gamma*I` and
//!   `dR/dt = gamma*I`, as a pure function of state and parameters.
//! * [`integrator`]: an adaptive Dormand-Prince 5(4) solver that reports the state at every
//!   point of a [`TimeGrid`].
//! * [`scenario`]: a [`ScenarioRunner`] that integrates the model once per labelled parameter set
//!   from a shared initial state and grid, so scenarios can be compared side by side.
//!
//! Around the core sit a JSON sweep [`config`], CSV [`report`]s, a [`log`] facade and the
//! `sir-sweep` command line [`runner`]. The core does no I/O and holds no global state.
//!
//! ```
//! use sir_ode::{CompartmentState, Parameters, ScenarioRunner, TimeGrid};
//!
//! let initial = CompartmentState::from_population(1000.0, 1.0, 0.0).unwrap();
//! let grid = TimeGrid::linspace(0.0, 160.0, 160).unwrap();
//! let report = ScenarioRunner::new(initial, grid)
//!     .with_scenario("baseline", Parameters::new(0.3, 0.1).unwrap())
//!     .run()
//!     .unwrap();
//! let trajectory = &report.result("baseline").unwrap().trajectory;
//! assert!(trajectory.max_population_drift() < 1e-6);
//! ```
pub mod config;
pub mod error;
pub mod integrator;
pub mod log;
mod macros;
pub mod model;
pub mod numeric;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod time_grid;
pub mod trajectory;

pub use config::SweepConfig;
pub use error::SirError;
pub use integrator::{integrate, IntegrationStats, IntegratorOptions};
pub use model::{
    sir_rates, CompartmentState, OdeSystem, Parameters, SirModel, Transmission, Validation,
};
pub use scenario::{FailurePolicy, ScenarioResult, ScenarioRunner, SweepReport};
pub use time_grid::TimeGrid;
pub use trajectory::{Peak, Trajectory};
