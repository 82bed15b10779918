use thiserror::Error;

use sr_core::{GeoPoint, NetworkKind};

/// Request-fatal routing failures.
///
/// Hazard-source and scoring-model failures never appear here: the engine
/// logs them and degrades to empty layers or fallback formulas.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no {kind} road graph is loaded")]
    GraphUnavailable { kind: NetworkKind },

    #[error("could not snap {endpoint} coordinate {point} onto the road graph")]
    EndpointSnapFailure { endpoint: &'static str, point: GeoPoint },

    #[error("no path found from {from} to {to}")]
    NoPathFound { from: GeoPoint, to: GeoPoint },

    #[error("engine configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
