//! `sr-engine` — risk-aware multi-route search.
//!
//! # Request pipeline
//!
//! ```text
//! find_routes(start, end, mode, preferences):
//!   ① Prepare  — snap endpoints, derive the trip box, prune the base graph
//!                (full-graph fallback when pruning drops an endpoint).
//!   ② Scan     — disaster, weather, and crowd layers clipped to the box;
//!                live sources run on worker threads with a timeout.
//!   ③ Weight   — per-edge raw scores → preference-weighted scores →
//!                penalty (model or fallback) → weight = seconds × (1 + penalty)
//!                (raw scoring is parallel with the `parallel` feature).
//!   ④ Search   — up to `alternatives` Dijkstra runs, inflating the weights
//!                along each path found; duplicate paths are dropped.
//!   ⑤ Audit    — distance, ETA, risk, hazard hits, and a safety label per
//!                route.
//! ```
//!
//! Only `GraphUnavailable`, `EndpointSnapFailure`, and `NoPathFound` end a
//! request.  Failed hazard sources become empty layers and failed models
//! fall back to fixed formulas, each with a `warn!` event.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Scores edges on Rayon's thread pool.                        |
//! | `serde`    | Serializes config, preferences, layers, and route results.  |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sr_core::{GeoPoint, NetworkKind, VehicleMode};
//! use sr_engine::{EngineBuilder, Preferences};
//! use sr_spatial::DijkstraRouter;
//!
//! let engine = EngineBuilder::new(DijkstraRouter)
//!     .graph(NetworkKind::Drive, Arc::new(network))
//!     .build()?;
//! let plan = engine.find_routes(start, end, VehicleMode::Car, &Preferences::default())?;
//! println!("{}: {:.1} km, {}", plan.primary.name, plan.primary.distance_km, plan.primary.label);
//! ```

pub mod audit;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod prepare;
pub mod scanner;
pub mod search;
pub mod weights;

#[cfg(test)]
mod tests;

pub use audit::{Level, RouteAuditor, RouteResult, SafetyLabel};
pub use builder::EngineBuilder;
pub use config::{EngineConfig, Preferences};
pub use engine::{RoutePlan, RoutingEngine};
pub use error::{EngineError, EngineResult};
pub use prepare::{GraphProvider, PreparedGraph, StaticGraphs, WorkingGraph, prepare_graph, trip_bbox};
pub use scanner::{EnvironmentScanner, HazardLayers};
pub use search::diversify;
pub use weights::{EdgeAnnotation, EdgeWeights, HazardScores, RiskFlags, WeightCalculator};
