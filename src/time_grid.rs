use crate::error::SirError;
use serde_derive::Serialize;
use std::ops::Deref;

/// The ordered times at which trajectories are sampled. A grid is never empty, every point is
/// finite and the points are strictly increasing; the first point is the initial time.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// # Errors
    /// Returns `SirError::ConfigurationError` if `points` is empty, contains a non-finite value
    /// or is not strictly increasing.
    pub fn new(points: Vec<f64>) -> Result<Self, SirError> {
        if points.is_empty() {
            return Err(SirError::configuration("time grid must not be empty"));
        }
        if let Some(index) = points.iter().position(|t| !t.is_finite()) {
            return Err(SirError::configuration(format!(
                "time grid point {index} is not finite: {}",
                points[index]
            )));
        }
        if let Some(index) = points.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(SirError::configuration(format!(
                "time grid must be strictly increasing, but t[{}] = {} follows t[{}] = {}",
                index + 1,
                points[index + 1],
                index,
                points[index]
            )));
        }
        Ok(TimeGrid { points })
    }

    /// `samples` evenly spaced points from `start` to `stop`, both included. A single sample is
    /// just `[start]`.
    ///
    /// # Errors
    /// Returns `SirError::ConfigurationError` if `samples` is zero, or if the resulting grid is not
    /// strictly increasing (e.g. `stop <= start` with more than one sample).
    pub fn linspace(start: f64, stop: f64, samples: usize) -> Result<Self, SirError> {
        if samples == 0 {
            return Err(SirError::configuration(
                "time grid needs at least one sample",
            ));
        }
        if samples == 1 {
            return Self::new(vec![start]);
        }
        #[allow(clippy::cast_precision_loss)]
        let step = (stop - start) / (samples - 1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let mut points: Vec<f64> = (0..samples).map(|k| start + k as f64 * step).collect();
        // Pin the endpoint so it does not pick up rounding error.
        points[samples - 1] = stop;
        Self::new(points)
    }

    /// Checks that the grid has the number of points the caller expected.
    ///
    /// # Errors
    /// Returns `SirError::ConfigurationError` on a mismatch.
    pub fn expect_len(&self, expected: usize) -> Result<(), SirError> {
        if self.points.len() == expected {
            Ok(())
        } else {
            Err(SirError::configuration(format!(
                "time grid has {} points but {} were expected",
                self.points.len(),
                expected
            )))
        }
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        self.points[0]
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }
}

impl Deref for TimeGrid {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.points
    }
}
