//! Shortest paths over a per-request weight overlay.
//!
//! The engine only talks to the [`Router`] trait, so a different search
//! (A*, contraction hierarchies, bidirectional) can be dropped in without
//! touching weight calculation or diversification.
//!
//! Costs are opaque here: the router sums `weights[edge]` along a path and
//! minimises that sum.  The engine happens to fill the overlay with
//! risk-adjusted seconds.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use sr_core::{EdgeId, NodeId};

use crate::network::RoadNetwork;
use crate::SpatialError;

/// A path found by a [`Router`].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Directed edges from origin to destination.
    pub edges: Vec<EdgeId>,
    /// Sum of the overlay weights of `edges`.
    pub total_cost: f64,
}

impl Route {
    /// Origin and destination were the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Node sequence visited by the route, starting at the source.
    pub fn nodes(&self, network: &RoadNetwork) -> Vec<NodeId> {
        let Some(first) = self.edges.first() else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(self.edges.len() + 1);
        nodes.push(network.edge_from[first.index()]);
        nodes.extend(self.edges.iter().map(|e| network.edge_to[e.index()]));
        nodes
    }

    /// Physical length in metres.
    pub fn length_m(&self, network: &RoadNetwork) -> f64 {
        self.edges.iter().map(|e| network.edge_length_m[e.index()]).sum()
    }
}

/// Minimum-cost path search.  One router is shared by every request, hence
/// the `Send + Sync` bound.
pub trait Router: Send + Sync {
    /// Compute the minimum-weight route from `from` to `to`.
    ///
    /// `weights[e]` is the traversal cost of edge `e`; it must have exactly
    /// `network.edge_count()` entries.  `from == to` yields an empty route.
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        weights: &[f64],
    ) -> Result<Route, SpatialError>;
}

/// Binary-heap Dijkstra over the CSR adjacency.
///
/// Frontier ties on cost go to the lower `NodeId`, so a given network and
/// overlay always produce the same path.  NaN and negative weights are
/// skipped as impassable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        weights: &[f64],
    ) -> Result<Route, SpatialError> {
        if weights.len() != network.edge_count() {
            return Err(SpatialError::WeightCountMismatch {
                expected: network.edge_count(),
                got: weights.len(),
            });
        }
        if let Some(&missing) = [from, to].iter().find(|n| !network.contains_node(**n)) {
            return Err(SpatialError::NodeNotFound(missing));
        }
        if from == to {
            return Ok(Route { edges: Vec::new(), total_cost: 0.0 });
        }
        search(network, from, to, weights).ok_or(SpatialError::NoRoute { from, to })
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the cheapest, then lowest id.
#[derive(Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    node: NodeId,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn search(network: &RoadNetwork, from: NodeId, to: NodeId, weights: &[f64]) -> Option<Route> {
    let mut best = vec![f64::INFINITY; network.node_count()];
    let mut via = vec![EdgeId::INVALID; network.node_count()];
    let mut frontier = BinaryHeap::new();

    best[from.index()] = 0.0;
    frontier.push(Frontier { cost: 0.0, node: from });

    while let Some(Frontier { cost, node }) = frontier.pop() {
        if node == to {
            return Some(Route { edges: walk_back(network, &via, to), total_cost: cost });
        }
        if cost > best[node.index()] {
            continue;
        }
        for edge in network.out_edges(node) {
            let w = weights[edge.index()];
            if w.is_nan() || w < 0.0 {
                continue;
            }
            let next = network.edge_to[edge.index()];
            let reached = cost + w;
            if reached < best[next.index()] {
                best[next.index()] = reached;
                via[next.index()] = edge;
                frontier.push(Frontier { cost: reached, node: next });
            }
        }
    }
    None
}

/// Follow `via` from `to` back to the origin, whose entry is still unset.
fn walk_back(network: &RoadNetwork, via: &[EdgeId], to: NodeId) -> Vec<EdgeId> {
    let step = |e: EdgeId| Some(e).filter(|e| e.is_valid());
    let mut edges: Vec<EdgeId> = std::iter::successors(step(via[to.index()]), |e| {
        step(via[network.edge_from[e.index()].index()])
    })
    .collect();
    edges.reverse();
    edges
}
