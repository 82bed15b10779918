//! Multi-route search by iterative path penalisation.
//!
//! Each attempt runs the router on the current overlay, keeps the path if
//! its edge sequence is new, then multiplies the weight of every edge on it
//! by the inflation factor so the next attempt prefers other streets.

use tracing::{debug, warn};

use sr_core::NodeId;
use sr_spatial::{Route, Router, RoadNetwork, SpatialError};

/// Searches allowed per requested route before giving up on finding more.
const SEARCHES_PER_ROUTE: usize = 8;

/// Up to `attempts` distinct routes from `origin` to `destination`, best
/// first.
///
/// `weights` is inflated in place along every path found, duplicates
/// included, and the search repeats until `attempts` distinct paths are
/// collected.  A path that keeps reappearing is inflated again each time, so
/// a costlier detour eventually wins; networks with fewer distinct paths stop
/// after `attempts * 8` searches.  A trivial route (`origin == destination`)
/// is returned alone.
///
/// # Errors
///
/// Only a failure of the first search is returned.  Later failures end the
/// search and keep the routes already collected.
pub fn diversify<R: Router + ?Sized>(
    router: &R,
    network: &RoadNetwork,
    origin: NodeId,
    destination: NodeId,
    weights: &mut [f64],
    attempts: usize,
    inflation: f64,
) -> Result<Vec<Route>, SpatialError> {
    let wanted = attempts.max(1);
    let mut routes: Vec<Route> = Vec::with_capacity(wanted);

    for search in 0..wanted * SEARCHES_PER_ROUTE {
        let route = match router.route(network, origin, destination, weights) {
            Ok(route) => route,
            Err(err) if search == 0 => return Err(err),
            Err(err) => {
                warn!(search, error = %err, "alternative search stopped early");
                break;
            }
        };

        if route.is_trivial() {
            routes.push(route);
            break;
        }

        for e in &route.edges {
            weights[e.index()] *= inflation;
        }

        if routes.iter().any(|r| r.edges == route.edges) {
            debug!(search, "duplicate path discarded");
            continue;
        }
        routes.push(route);
        if routes.len() == wanted {
            break;
        }
    }

    Ok(routes)
}
