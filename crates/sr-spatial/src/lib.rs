//! `sr-spatial` — road network, node snapping, pruning, and routing.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`road`]     | `RoadClass`, OSM `highway` / `maxspeed` tag parsing        |
//! | [`network`]  | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`, `EdgeSpec` |
//! | [`subgraph`] | `Subgraph`, owned induced sub-network with id mapping     |
//! | [`router`]   | `Router` trait, `Route`, `DijkstraRouter`                  |
//! | [`osm`]      | `load_from_pbf` (feature = `"osm"` only)                   |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod network;
pub mod road;
pub mod router;
pub mod subgraph;

#[cfg(feature = "osm")]
pub mod osm;


pub use error::{SpatialError, SpatialResult};
pub use network::{EdgeSpec, RoadNetwork, RoadNetworkBuilder};
pub use road::{RoadClass, SpeedTier, parse_maxspeed_kmh};
pub use router::{DijkstraRouter, Route, Router};
pub use subgraph::Subgraph;
