use thiserror::Error;

use crate::field::FieldPresence;
use crate::trajectory::Trajectory;

/// Errors raised by the derivative engine, the stepper, and the tracking loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("field derivative order {order} is outside the supported range 0..=4")]
    InvalidDerivativeOrder { order: usize },

    #[error("field derivative of order {order} needs {order} velocity derivatives, got {available}")]
    MissingVelocityDerivatives { order: usize, available: usize },

    #[error("unsupported field configuration: {presence:?}")]
    UnsupportedFieldConfiguration { presence: FieldPresence },

    #[error("rigidity {rigidity} cannot be used to normalize the field")]
    InvalidRigidity { rigidity: f64 },

    #[error("step count must be non-negative, got {requested}")]
    InvalidStepCount { requested: i64 },

    #[error("step size must be finite, got {step_size}")]
    InvalidStepSize { step_size: f64 },

    #[error("integration cancelled")]
    Cancelled,
}

/// A tracking run that aborted.
///
/// `step` is the index of the state that was being produced when the error
/// occurred; 0 means the run was rejected before the first step. `partial`
/// holds every state recorded before the failure.
#[derive(Debug, Clone, Error)]
#[error("integration failed at step {step}: {kind}")]
pub struct IntegrationFailure {
    pub step: usize,
    #[source]
    pub kind: TrackError,
    pub partial: Trajectory,
}

impl IntegrationFailure {
    pub(crate) fn new(step: usize, kind: TrackError, partial: Trajectory) -> Self {
        Self {
            step,
            kind,
            partial,
        }
    }
}

/// Converts a signed step count into a loop bound.
///
/// Settings files never reach this: a negative `max_steps` in TOML fails
/// deserialization into `usize` and surfaces as `ConfigError::Parse`.
pub fn step_count(requested: i64) -> Result<usize, TrackError> {
    usize::try_from(requested).map_err(|_| TrackError::InvalidStepCount { requested })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_rejects_negative_values() {
        assert_eq!(step_count(12), Ok(12));
        assert_eq!(step_count(0), Ok(0));
        assert_eq!(
            step_count(-3),
            Err(TrackError::InvalidStepCount { requested: -3 })
        );
    }

    #[test]
    fn failure_message_names_step_and_cause() {
        let failure = IntegrationFailure::new(
            4,
            TrackError::InvalidRigidity { rigidity: 0.0 },
            Trajectory::default(),
        );
        let message = failure.to_string();
        assert!(message.contains("step 4"), "got \"{message}\"");
        assert!(message.contains("rigidity 0"), "got \"{message}\"");
    }
}
