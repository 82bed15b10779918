//! `sr-core` — foundational types for the `saferoute` routing engine.
//!
//! This crate is a dependency of every other `sr-*` crate.  It intentionally
//! has no `sr-*` dependencies and minimal external ones (only `chrono` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `EdgeId`                                        |
//! | [`geo`]         | `GeoPoint`, `BoundingBox`, haversine, point-to-segment    |
//! | [`time`]        | `TripTime` (hour of day, weekend flag, reference instant) |
//! | [`transport`]   | `VehicleMode`, `NetworkKind`                              |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod time;
pub mod transport;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, GeoPoint, great_circle_km, point_to_polyline_km, point_to_segment_km};
pub use ids::{EdgeId, NodeId};
pub use time::TripTime;
pub use transport::{NetworkKind, VehicleMode};
