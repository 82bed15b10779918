use std::time::Duration;

use thiserror::Error;

/// Failures of a hazard data collaborator.  The engine logs these and
/// substitutes an empty layer; they never fail a routing request.
#[derive(Debug, Error)]
pub enum HazardError {
    #[error("hazard source {provider} timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("hazard source {provider} failed: {message}")]
    Unavailable { provider: String, message: String },

    #[error("hazard table parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HazardResult<T> = Result<T, HazardError>;

/// Failures of a learned scoring model.  Callers fall back to the fixed
/// formulas in [`crate::scoring`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("scoring model not loaded")]
    Unavailable,

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("model returned {got} predictions for {expected} inputs")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("model returned non-finite score {0}")]
    NonFinite(f64),
}

pub type ModelResult<T> = Result<T, ModelError>;
