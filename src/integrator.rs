//! Adaptive Runge-Kutta integration of an [`OdeSystem`] over a [`TimeGrid`].
//!
//! The solver is the Dormand–Prince 5(4) embedded pair with local extrapolation and the FSAL
//! ("first same as last") property, so an accepted step costs six derivative evaluations. The
//! internal step size is chosen to keep the estimated local error below
//! `atol + rtol * |y|` componentwise; steps are shortened where necessary so that the solver lands
//! exactly on every requested grid point, which means no interpolation is involved in the reported
//! values.
//!
//! An integration either produces a value for every grid point or fails with
//! [`SirError::NumericalDivergence`]. Non-finite derivatives, a step size that collapses below
//! `min_step` and exhausting `max_steps` are all reported that way; partially filled results are
//! never returned.

use crate::error::SirError;
use crate::model::OdeSystem;
use crate::time_grid::TimeGrid;
use log::{debug, trace};
use serde_derive::{Deserialize, Serialize};

// Dormand–Prince nodes
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

// Dormand–Prince coupling coefficients
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights, used to advance the solution
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the 5th and 4th order weights, the error estimate
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Step size controller
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

// Stretch a step by up to this fraction rather than leave a sliver before a grid point.
const LANDING_SLACK: f64 = 0.01;

/// Tolerances and limits for [`integrate`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegratorOptions {
    /// Relative error tolerance
    pub rtol: f64,
    /// Absolute error tolerance
    pub atol: f64,
    /// Size of the first step; chosen from the initial derivative when `None`
    pub initial_step: Option<f64>,
    /// Steps smaller than this are treated as a failure to converge
    pub min_step: f64,
    /// Upper bound on the internal step size
    pub max_step: Option<f64>,
    /// Upper bound on the number of attempted steps, accepted or rejected
    pub max_steps: usize,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        IntegratorOptions {
            rtol: 1e-8,
            atol: 1e-9,
            initial_step: None,
            min_step: 1e-12,
            max_step: None,
            max_steps: 100_000,
        }
    }
}

impl IntegratorOptions {
    /// # Errors
    /// Returns `SirError::ConfigurationError` if a tolerance or step bound is not a positive
    /// finite number, or `max_steps` is zero.
    pub fn validate(&self) -> Result<(), SirError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SirError::configuration(format!(
                    "integrator option {name} must be positive and finite, got {value}"
                )))
            }
        };
        positive("rtol", self.rtol)?;
        positive("atol", self.atol)?;
        positive("min_step", self.min_step)?;
        if let Some(initial_step) = self.initial_step {
            positive("initial_step", initial_step)?;
        }
        if let Some(max_step) = self.max_step {
            positive("max_step", max_step)?;
            if max_step < self.min_step {
                return Err(SirError::configuration(format!(
                    "integrator option max_step ({max_step}) is smaller than min_step ({})",
                    self.min_step
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(SirError::configuration(
                "integrator option max_steps must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Work done by a single call to [`integrate`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
}

impl IntegrationStats {
    #[must_use]
    pub fn attempted_steps(&self) -> usize {
        self.accepted_steps + self.rejected_steps
    }
}

/// The solution of an initial value problem, one state per grid point.
#[derive(Clone, Debug)]
pub struct Integration<const D: usize> {
    pub states: Vec<[f64; D]>,
    pub stats: IntegrationStats,
}

/// Integrates `system` from `y0` at `grid.start()` and returns its state at every point of `grid`.
/// The first returned state is `y0` itself.
///
/// # Errors
/// Returns `SirError::ConfigurationError` for invalid `options`, `SirError::InvalidParameter` if
/// `y0` is not finite, and `SirError::NumericalDivergence` if the solution cannot be advanced to
/// the end of the grid.
pub fn integrate<S, const D: usize>(
    system: &S,
    y0: [f64; D],
    grid: &TimeGrid,
    options: &IntegratorOptions,
) -> Result<Integration<D>, SirError>
where
    S: OdeSystem<D> + ?Sized,
{
    options.validate()?;
    if y0.iter().any(|value| !value.is_finite()) {
        return Err(SirError::invalid_parameter(format!(
            "initial state must be finite, got {y0:?}"
        )));
    }

    let mut states = Vec::with_capacity(grid.len());
    states.push(y0);

    let mut solver = DormandPrince::new(system, options, grid, y0)?;
    for &target in &grid[1..] {
        solver.advance_to(target)?;
        states.push(solver.y);
    }

    let stats = solver.stats;
    debug!(
        "Integrated to t = {} in {} steps ({} rejected, {} derivative evaluations)",
        grid.end(),
        stats.accepted_steps,
        stats.rejected_steps,
        stats.rhs_evaluations
    );
    Ok(Integration { states, stats })
}

/// Working state of one integration. Owned by a single call to `integrate`.
struct DormandPrince<'a, S: ?Sized, const D: usize> {
    system: &'a S,
    options: &'a IntegratorOptions,
    t: f64,
    y: [f64; D],
    /// Derivative at `(t, y)`, carried over from the last stage of the previous step
    dydt: [f64; D],
    /// Proposed size of the next step
    h: f64,
    stats: IntegrationStats,
}

impl<'a, S, const D: usize> DormandPrince<'a, S, D>
where
    S: OdeSystem<D> + ?Sized,
{
    fn new(
        system: &'a S,
        options: &'a IntegratorOptions,
        grid: &TimeGrid,
        y0: [f64; D],
    ) -> Result<Self, SirError> {
        let t0 = grid.start();
        let dydt = system.rhs(t0, &y0);
        if dydt.iter().any(|value| !value.is_finite()) {
            return Err(SirError::divergence(
                t0,
                format!("derivative is not finite at the initial state: {dydt:?}"),
            ));
        }

        let mut solver = DormandPrince {
            system,
            options,
            t: t0,
            y: y0,
            dydt,
            h: 0.0,
            stats: IntegrationStats {
                rhs_evaluations: 1,
                ..IntegrationStats::default()
            },
        };
        let h = options
            .initial_step
            .unwrap_or_else(|| solver.estimate_initial_step());
        solver.h = solver.limit_step(h);
        Ok(solver)
    }

    /// A first step small enough that an explicit Euler step changes `y` by about 1% in the
    /// error norm.
    fn estimate_initial_step(&self) -> f64 {
        let scale: [f64; D] =
            std::array::from_fn(|i| self.options.atol + self.options.rtol * self.y[i].abs());
        let d0 = rms_norm(&self.y, &scale);
        let d1 = rms_norm(&self.dydt, &scale);
        if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        }
    }

    fn limit_step(&self, h: f64) -> f64 {
        match self.options.max_step {
            Some(max_step) => h.min(max_step),
            None => h,
        }
    }

    fn advance_to(&mut self, target: f64) -> Result<(), SirError> {
        while self.t < target {
            if self.stats.attempted_steps() >= self.options.max_steps {
                return Err(SirError::divergence(
                    self.t,
                    format!(
                        "exceeded the maximum of {} steps before reaching t = {target}",
                        self.options.max_steps
                    ),
                ));
            }

            let remaining = target - self.t;
            let mut h = self.limit_step(self.h);
            let landing = h * (1.0 + LANDING_SLACK) >= remaining;
            if landing {
                h = remaining;
            }

            let (y_new, dydt_new, error) = self.attempt(h);
            let factor = step_factor(error);
            if error <= 1.0 {
                self.stats.accepted_steps += 1;
                self.t = if landing { target } else { self.t + h };
                self.y = y_new;
                self.dydt = dydt_new;
                // A step cut short to land on the grid says little about the step size the
                // solution needs, so don't let it shrink the proposal.
                let proposal = h * factor;
                self.h = if landing { proposal.max(self.h) } else { proposal };
                if self.h < self.options.min_step {
                    return Err(SirError::divergence(
                        self.t,
                        format!(
                            "step size {:e} fell below the minimum of {:e}: the solution cannot be resolved at this tolerance",
                            self.h, self.options.min_step
                        ),
                    ));
                }
            } else {
                self.stats.rejected_steps += 1;
                self.h = h * factor.min(1.0);
                trace!(
                    "Rejected step of size {h:e} at t = {} (error norm {error:e})",
                    self.t
                );
                if self.h < self.options.min_step {
                    let reason = if error.is_finite() {
                        "error tolerance could not be met"
                    } else {
                        "derivative or state became non-finite"
                    };
                    return Err(SirError::divergence(
                        self.t,
                        format!(
                            "step size {:e} fell below the minimum of {:e}: {reason}",
                            self.h, self.options.min_step
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Takes a trial step of size `h` from `(t, y)`. Returns the new state, the derivative there
    /// and the scaled error norm, which is infinite if anything along the way is not finite.
    fn attempt(&mut self, h: f64) -> ([f64; D], [f64; D], f64) {
        let (t, y, k1) = (self.t, self.y, self.dydt);
        let (y, k1) = (&y, &k1);

        let k2 = self.eval(t + C2 * h, &combine(y, h, &[(A21, k1)]));
        let k3 = self.eval(t + C3 * h, &combine(y, h, &[(A31, k1), (A32, &k2)]));
        let k4 = self.eval(
            t + C4 * h,
            &combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
        );
        let k5 = self.eval(
            t + C5 * h,
            &combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
        );
        let k6 = self.eval(
            t + h,
            &combine(
                y,
                h,
                &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
            ),
        );
        let y_new = combine(
            y,
            h,
            &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );
        let k7 = self.eval(t + h, &y_new);

        if y_new.iter().chain(k7.iter()).any(|value| !value.is_finite()) {
            return (y_new, k7, f64::INFINITY);
        }

        let error: [f64; D] = std::array::from_fn(|i| {
            h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i])
        });
        let scale: [f64; D] = std::array::from_fn(|i| {
            self.options.atol + self.options.rtol * y[i].abs().max(y_new[i].abs())
        });
        (y_new, k7, rms_norm(&error, &scale))
    }

    fn eval(&mut self, t: f64, y: &[f64; D]) -> [f64; D] {
        self.stats.rhs_evaluations += 1;
        self.system.rhs(t, y)
    }
}

/// `y + h * Σ coefficient·k`
fn combine<const D: usize>(y: &[f64; D], h: f64, terms: &[(f64, &[f64; D])]) -> [f64; D] {
    std::array::from_fn(|i| {
        let increment: f64 = terms.iter().map(|(coefficient, k)| coefficient * k[i]).sum();
        y[i] + h * increment
    })
}

/// Root mean square of `values[i] / scale[i]`.
fn rms_norm<const D: usize>(values: &[f64; D], scale: &[f64; D]) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let sum: f64 = values
        .iter()
        .zip(scale)
        .map(|(value, scale)| (value / scale).powi(2))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / D as f64;
    mean.sqrt()
}

/// How much to scale the step size after a step with the given error norm.
fn step_factor(error: f64) -> f64 {
    if error == 0.0 {
        MAX_FACTOR
    } else if error.is_finite() {
        (SAFETY * error.powf(ERROR_EXPONENT)).clamp(MIN_FACTOR, MAX_FACTOR)
    } else {
        MIN_FACTOR
    }
}
