//! `sr-hazard` — hazard layers and everything that turns them into scores.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`record`]  | `HazardRecord` tagged union, `WeatherCondition`, `VenueType`   |
//! | [`scoring`] | Severity, decay, crowd, traffic, speed, and penalty functions  |
//! | [`index`]   | `HazardIndex`, R-tree over hazard influence rectangles        |
//! | [`model`]   | `PenaltyModel` / `TrafficModel` seams for learned models       |
//! | [`source`]  | `DisasterSource` / `WeatherSource` traits, static sources, `CrowdTable` |
//! | [`loader`]  | CSV loaders for crowd and disaster tables                      |
//! | [`error`]   | `HazardError`, `ModelError`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on records and enums.      |

pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod record;
pub mod scoring;
pub mod source;


pub use error::{HazardError, HazardResult, ModelError, ModelResult};
pub use index::HazardIndex;
pub use loader::{load_crowd_csv, load_crowd_reader, load_disasters_csv, load_disasters_reader};
pub use model::{PenaltyModel, TrafficModel};
pub use record::{HazardKind, HazardPayload, HazardRecord, VenueType, WeatherCondition, clip_to_bbox};
pub use source::{CrowdTable, DisasterSource, StaticDisasters, StaticWeather, WeatherSource};
