use thiserror::Error;

/// Failures the race engines report to their caller.
///
/// Calling `update` before `start`, after completion, or with unrecognized
/// keys is not an error; those ticks are ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RaceError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RaceError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RaceError::InvalidInput(_))
    }
}
