//! Orchestrator error types
//!
//! Step errors never leave the orchestrator; they decide the step outcome and are logged.

use backend::BackendError;
use contracts::StepOutcome;
use thiserror::Error;

/// Why an image step produced no image
#[derive(Debug, Error)]
pub enum StepError {
    /// Backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Backend answered, but the first candidate has no inline image part
    #[error("response contained no inline image")]
    NoImage,
}

impl StepError {
    /// Outcome recorded for this failure
    pub fn outcome(&self) -> StepOutcome {
        match self {
            Self::Backend(_) => StepOutcome::Failed,
            Self::NoImage => StepOutcome::Empty,
        }
    }
}
