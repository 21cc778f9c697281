use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SirError` and maps other errors to convert to a `SirError`.
///
/// Every failure produced while running a sweep is attributable to a specific scenario:
/// errors raised for one scenario are either recorded against its label or wrapped in
/// [`SirError::ScenarioFailed`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SirError {
    /// A rate or population value that cannot be used, e.g. `NaN` or infinite.
    InvalidParameter(String),
    /// The integrator could not advance the solution to the end of the time grid.
    NumericalDivergence {
        /// The last time the integrator reached successfully
        time: f64,
        reason: String,
    },
    /// Malformed inputs detected before any integration starts.
    ConfigurationError(String),
    /// A scenario failed and the sweep was configured to stop.
    ScenarioFailed { label: String, source: Box<SirError> },
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
}

impl SirError {
    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        SirError::InvalidParameter(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        SirError::ConfigurationError(message.into())
    }

    pub(crate) fn divergence(time: f64, reason: impl Into<String>) -> Self {
        SirError::NumericalDivergence {
            time,
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for SirError {
    fn from(error: io::Error) -> Self {
        SirError::IoError(error)
    }
}

impl From<serde_json::Error> for SirError {
    fn from(error: serde_json::Error) -> Self {
        SirError::JsonError(error)
    }
}

impl From<csv::Error> for SirError {
    fn from(error: csv::Error) -> Self {
        SirError::CSVError(error)
    }
}

impl std::error::Error for SirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SirError::ScenarioFailed { source, .. } => Some(source.as_ref()),
            SirError::IoError(error) => Some(error),
            SirError::JsonError(error) => Some(error),
            SirError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SirError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SirError::InvalidParameter(message) => write!(f, "invalid parameter: {message}"),
            SirError::NumericalDivergence { time, reason } => {
                write!(f, "numerical divergence at t = {time}: {reason}")
            }
            SirError::ConfigurationError(message) => write!(f, "configuration error: {message}"),
            SirError::ScenarioFailed { label, source } => {
                write!(f, "scenario '{label}' failed: {source}")
            }
            SirError::IoError(error) => write!(f, "I/O error: {error}"),
            SirError::JsonError(error) => write!(f, "JSON error: {error}"),
            SirError::CSVError(error) => write!(f, "CSV error: {error}"),
        }
    }
}
