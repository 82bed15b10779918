//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to surface a parse failure from this crate.

use thiserror::Error;

/// Errors produced while parsing core value types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown vehicle mode {0:?}")]
    UnknownVehicleMode(String),

    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("hour of day {0} outside [0, 24]")]
    InvalidHour(f64),
}

/// Shorthand result type for `sr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
