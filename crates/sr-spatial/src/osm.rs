//! Road networks from OpenStreetMap PBF extracts (`osm` feature).
//!
//! ```ignore
//! let drive = sr_spatial::osm::load_from_pbf(Path::new("hcmc.osm.pbf"), NetworkKind::Drive)?;
//! let walk = sr_spatial::osm::load_from_pbf(Path::new("hcmc.osm.pbf"), NetworkKind::Walk)?;
//! ```
//!
//! Only `highway=*` ways the requested [`NetworkKind`] accepts are kept.
//! Consecutive way nodes become straight edges carrying the way's road class
//! and `maxspeed`.  Drive graphs honour `oneway`; walk graphs never do.

use std::collections::HashMap;
use std::path::Path;

use osmpbf::{Element, ElementReader};

use sr_core::{GeoPoint, NetworkKind, NodeId};

use crate::network::{EdgeSpec, RoadNetwork, RoadNetworkBuilder};
use crate::road::{RoadClass, parse_maxspeed_kmh};
use crate::SpatialError;

/// Read `path` and build the network of the given kind.
///
/// # Errors
///
/// [`SpatialError::Osm`] if the file cannot be opened or decoded.
pub fn load_from_pbf(path: &Path, kind: NetworkKind) -> Result<RoadNetwork, SpatialError> {
    let (coords, ways) = scan(path, kind)?;
    Ok(assemble(&coords, &ways))
}

/// One sequential pass over the file: every node position plus the ways
/// that survive [`classify_way`].
fn scan(path: &Path, kind: NetworkKind) -> Result<(HashMap<i64, GeoPoint>, Vec<OsmWay>), SpatialError> {
    let osm_err = |e: osmpbf::Error| SpatialError::Osm(e.to_string());
    let reader = ElementReader::from_path(path).map_err(osm_err)?;

    let mut coords = HashMap::new();
    let mut ways = Vec::new();
    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                coords.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                coords.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                let tags: Vec<(&str, &str)> = w.tags().collect();
                if let Some(way) = classify_way(&tags, kind) {
                    ways.push(OsmWay { refs: w.refs().collect(), ..way });
                }
            }
            _ => {}
        })
        .map_err(osm_err)?;
    Ok((coords, ways))
}

fn assemble(coords: &HashMap<i64, GeoPoint>, ways: &[OsmWay]) -> RoadNetwork {
    // Ascending OSM id order keeps local numbering stable between runs.
    let mut referenced: Vec<i64> = ways.iter().flat_map(|w| w.refs.iter().copied()).collect();
    referenced.sort_unstable();
    referenced.dedup();

    let mut builder = RoadNetworkBuilder::with_capacity(referenced.len(), referenced.len() * 2);
    let local: HashMap<i64, NodeId> = referenced
        .into_iter()
        .filter_map(|id| coords.get(&id).map(|&pos| (id, builder.add_node(pos))))
        .collect();

    for way in ways {
        for pair in way.refs.windows(2) {
            let (Some(&a), Some(&b)) = (local.get(&pair[0]), local.get(&pair[1])) else {
                continue;
            };
            let metres = builder.node_pos(a).distance_km(builder.node_pos(b)) * 1_000.0;
            let mut spec = EdgeSpec::new(metres, way.class);
            spec.speed_limit_kmh = way.maxspeed_kmh;
            if way.oneway {
                builder.add_directed_edge(a, b, spec);
            } else {
                builder.add_road(a, b, spec);
            }
        }
    }
    builder.build()
}

#[derive(Debug, PartialEq)]
struct OsmWay {
    refs:         Vec<i64>,
    class:        RoadClass,
    maxspeed_kmh: Option<f32>,
    oneway:       bool,
}

fn tag<'a>(tags: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Decide whether a way belongs to the requested network and extract the
/// attributes the graph keeps.  `refs` is left empty for the caller to fill.
fn classify_way(tags: &[(&str, &str)], kind: NetworkKind) -> Option<OsmWay> {
    let highway = tag(tags, "highway")?;
    if tag(tags, "area") == Some("yes") || tag(tags, "access") == Some("no") {
        return None;
    }
    let class = RoadClass::from_highway_tag(highway);

    let accepted = match kind {
        NetworkKind::Drive => {
            class.is_drivable()
                && class != RoadClass::Other
                && !matches!(tag(tags, "motor_vehicle"), Some("no"))
        }
        NetworkKind::Walk => {
            let foot = tag(tags, "foot");
            let sidewalk = tag(tags, "sidewalk");
            foot != Some("no")
                && (class.is_walkable()
                    || matches!(foot, Some("yes" | "designated"))
                    || matches!(sidewalk, Some("both" | "left" | "right" | "yes")))
        }
    };
    if !accepted {
        return None;
    }

    let oneway = kind == NetworkKind::Drive && is_oneway(class, tags);
    Some(OsmWay {
        refs: Vec::new(),
        class,
        maxspeed_kmh: tag(tags, "maxspeed").and_then(parse_maxspeed_kmh),
        oneway,
    })
}

/// Motorways are implicitly one-way in OSM convention.
fn is_oneway(class: RoadClass, tags: &[(&str, &str)]) -> bool {
    let explicit = matches!(tag(tags, "oneway"), Some("yes" | "1" | "true"));
    explicit || class == RoadClass::Motorway
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footway_only_in_walk_network() {
        let tags = [("highway", "footway")];
        assert!(classify_way(&tags, NetworkKind::Drive).is_none());
        assert!(classify_way(&tags, NetworkKind::Walk).is_some());
    }

    #[test]
    fn primary_needs_sidewalk_for_walking() {
        assert!(classify_way(&[("highway", "primary")], NetworkKind::Walk).is_none());
        let tags = [("highway", "primary"), ("sidewalk", "both")];
        assert!(classify_way(&tags, NetworkKind::Walk).is_some());
    }

    #[test]
    fn oneway_ignored_for_walking() {
        let tags = [("highway", "residential"), ("oneway", "yes"), ("maxspeed", "30")];
        let drive = classify_way(&tags, NetworkKind::Drive).unwrap();
        assert!(drive.oneway);
        assert_eq!(drive.maxspeed_kmh, Some(30.0));
        assert!(!classify_way(&tags, NetworkKind::Walk).unwrap().oneway);
    }
}
