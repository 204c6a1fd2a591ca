use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::event::EventKind;
use crate::sim::integrator::IntegrationError;
use crate::sim::recorder::TrajectoryRecord;

/// Which branch of a balanced-field sweep a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// Takeoff continued with one engine out
    Continue,
    /// Takeoff rejected, brakes applied
    Abort,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Continue => f.write_str("continued"),
            Branch::Abort => f.write_str("aborted"),
        }
    }
}

/// Errors raised by performance computations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PerformanceError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// `t_max` reached before the terminal event. The partial record is kept
    /// for diagnosis.
    #[error("no terminal event before t_max = {t_max} s ({} samples recorded)", .partial.len())]
    IntegrationTimeout {
        t_max: f64,
        partial: Box<TrajectoryRecord>,
    },

    #[error("{target} cannot be reached: acceleration is not positive at t = {t:.3} s, V = {speed:.3} m/s")]
    UnreachablePhase {
        target: EventKind,
        t: f64,
        speed: f64,
    },

    #[error(
        "pitch-rate search did not converge in {iterations} iterations \
         (best ratio {best_ratio:.4} at {best_rate:.5} rad/s)"
    )]
    ConvergenceFailure {
        iterations: usize,
        best_rate: f64,
        best_ratio: f64,
    },

    #[error(
        "flare-rate search did not converge in {iterations} iterations \
         (best sink rate {best_sink_rate:.3} m/s at {best_rate:.5} rad/s)"
    )]
    FlareConvergenceFailure {
        iterations: usize,
        best_rate: f64,
        best_sink_rate: f64,
    },

    #[error(
        "continued and aborted distances do not cross between {v_min:.2} and {v_max:.2} m/s \
         ({dominant} distance is longer throughout)"
    )]
    NoIntersectionFound {
        v_min: f64,
        v_max: f64,
        dominant: Branch,
    },

    #[error("{branch} run at failure speed {failure_speed:.3} m/s failed")]
    SweepRun {
        failure_speed: f64,
        branch: Branch,
        #[source]
        source: Box<PerformanceError>,
    },

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

pub type Result<T> = std::result::Result<T, PerformanceError>;

impl PerformanceError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        PerformanceError::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn sweep_failure_keeps_cause() {
        let inner = PerformanceError::UnreachablePhase { target: EventKind::Rotation, t: 0.0, speed: 0.0 };
        let err = PerformanceError::SweepRun {
            failure_speed: 42.0,
            branch: Branch::Continue,
            source: Box::new(inner),
        };
        assert!(err.to_string().contains("continued run at failure speed 42.000"));
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("rotation cannot be reached"), "{}", cause);
    }

    #[test]
    fn integration_errors_pass_through() {
        let err: PerformanceError = IntegrationError::NonFiniteState { t: 1.5 }.into();
        assert_eq!(err.to_string(), "non-finite state at t = 1.500000 s");
    }
}
