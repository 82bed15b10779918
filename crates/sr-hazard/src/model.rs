//! Learned scoring-model seams.
//!
//! Trained models live outside this crate.  The engine only sees these two
//! traits, injected as `Arc<dyn ...>` handles, and falls back to the fixed
//! formulas in [`crate::scoring`] whenever a call returns [`ModelError`].
//!
//! Plain closures implement both traits, which keeps test doubles short:
//!
//! ```
//! use sr_hazard::{ModelError, TrafficModel};
//!
//! let always_jammed = |_: [f64; 3]| -> Result<f64, ModelError> { Ok(1.0) };
//! assert_eq!(always_jammed.predict([8.0, 0.0, 0.0]), Ok(1.0));
//! ```

use crate::error::ModelResult;

/// Maps `[disaster, weather, crowd]` effective scores to a non-negative
/// penalty multiplier.
///
/// # Thread safety
///
/// Models are stateless and shared across requests, hence `Send + Sync`.
pub trait PenaltyModel: Send + Sync {
    /// Predict one penalty per feature row, in input order.
    fn predict(&self, features: &[[f64; 3]]) -> ModelResult<Vec<f64>>;
}

/// Maps `[hour, is_weekend (0/1), weather]` to a congestion score.
pub trait TrafficModel: Send + Sync {
    fn predict(&self, features: [f64; 3]) -> ModelResult<f64>;
}

impl<F> PenaltyModel for F
where
    F: Fn(&[[f64; 3]]) -> ModelResult<Vec<f64>> + Send + Sync,
{
    fn predict(&self, features: &[[f64; 3]]) -> ModelResult<Vec<f64>> {
        self(features)
    }
}

impl<F> TrafficModel for F
where
    F: Fn([f64; 3]) -> ModelResult<f64> + Send + Sync,
{
    fn predict(&self, features: [f64; 3]) -> ModelResult<f64> {
        self(features)
    }
}
