//! Graph preparation: endpoint snapping and bounding-box pruning.
//!
//! The base graphs are large and shared.  Each request snaps its endpoints,
//! derives a trip bounding box whose buffer grows with trip length, and
//! copies the induced sub-network out of the base graph.  When pruning
//! would drop an endpoint the request runs on the full graph instead.

use std::sync::Arc;

use tracing::{debug, warn};

use sr_core::{BoundingBox, EdgeId, GeoPoint, NetworkKind, NodeId, VehicleMode};
use sr_spatial::{RoadNetwork, Subgraph};

use crate::{EngineConfig, EngineError, EngineResult};

// ── Graph provider ────────────────────────────────────────────────────────────

/// Supplies the shared, read-only base graph for a network kind.
pub trait GraphProvider: Send + Sync {
    /// `None` when the graph for `kind` could not be loaded.
    fn graph(&self, kind: NetworkKind) -> Option<Arc<RoadNetwork>>;
}

/// Graphs loaded up front and held for the life of the process.
#[derive(Clone, Default)]
pub struct StaticGraphs {
    walk:  Option<Arc<RoadNetwork>>,
    drive: Option<Arc<RoadNetwork>>,
}

impl StaticGraphs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: NetworkKind, network: Arc<RoadNetwork>) -> Self {
        match kind {
            NetworkKind::Walk  => self.walk = Some(network),
            NetworkKind::Drive => self.drive = Some(network),
        }
        self
    }
}

impl GraphProvider for StaticGraphs {
    fn graph(&self, kind: NetworkKind) -> Option<Arc<RoadNetwork>> {
        match kind {
            NetworkKind::Walk  => self.walk.clone(),
            NetworkKind::Drive => self.drive.clone(),
        }
    }
}

// ── Working graph ─────────────────────────────────────────────────────────────

/// The network a single request weights and searches.
pub enum WorkingGraph {
    /// Pruning would have cut off an endpoint; ids are base-graph ids.
    Full(Arc<RoadNetwork>),
    /// Owned copy of the region around the trip; ids are local.
    Pruned(Subgraph),
}

impl WorkingGraph {
    pub fn network(&self) -> &RoadNetwork {
        match self {
            WorkingGraph::Full(net)   => net.as_ref(),
            WorkingGraph::Pruned(sub) => &sub.network,
        }
    }

    pub fn is_pruned(&self) -> bool {
        matches!(self, WorkingGraph::Pruned(_))
    }

    /// Base-graph id of a working-graph edge.
    pub fn base_edge(&self, edge: EdgeId) -> EdgeId {
        match self {
            WorkingGraph::Full(_)     => edge,
            WorkingGraph::Pruned(sub) => sub.parent_edge[edge.index()],
        }
    }
}

/// Output of [`prepare_graph`].
pub struct PreparedGraph {
    pub graph: WorkingGraph,
    /// Origin node in working-graph ids.
    pub origin: NodeId,
    /// Destination node in working-graph ids.
    pub destination: NodeId,
    /// Trip bounding box used for pruning and hazard scanning.
    pub bbox: BoundingBox,
}

// ── Pruning geometry ──────────────────────────────────────────────────────────

/// Half the larger coordinate span between the endpoints, clamped to
/// `[min_deg, max_deg]`.
pub fn dynamic_buffer_deg(start: GeoPoint, end: GeoPoint, min_deg: f64, max_deg: f64) -> f64 {
    let span = (start.lat - end.lat).abs().max((start.lon - end.lon).abs());
    (span * 0.5).clamp(min_deg, max_deg)
}

/// Box spanning both endpoints, grown by the dynamic buffer.
pub fn trip_bbox(start: GeoPoint, end: GeoPoint, config: &EngineConfig) -> BoundingBox {
    let buffer = dynamic_buffer_deg(start, end, config.min_buffer_deg, config.max_buffer_deg);
    BoundingBox::new(
        start.lat.min(end.lat),
        start.lon.min(end.lon),
        start.lat.max(end.lat),
        start.lon.max(end.lon),
    )
    .expand(buffer)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Snap both endpoints and carve out the working graph.
///
/// # Errors
///
/// - [`EngineError::GraphUnavailable`] if the mode's base graph is missing
///   or empty.
/// - [`EngineError::EndpointSnapFailure`] if a coordinate is invalid or
///   cannot be snapped.
pub fn prepare_graph(
    provider: &dyn GraphProvider,
    start: GeoPoint,
    end: GeoPoint,
    mode: VehicleMode,
    config: &EngineConfig,
) -> EngineResult<PreparedGraph> {
    let kind = mode.network_kind();
    let base = provider
        .graph(kind)
        .filter(|g| !g.is_empty())
        .ok_or(EngineError::GraphUnavailable { kind })?;

    let origin = snap(&base, start, "start")?;
    let destination = snap(&base, end, "end")?;

    let bbox = trip_bbox(start, end, config);
    let sub = base.extract(&bbox);

    match (sub.local_node(origin), sub.local_node(destination)) {
        (Some(o), Some(d)) => {
            debug!(
                nodes = sub.network.node_count(),
                edges = sub.network.edge_count(),
                base_nodes = base.node_count(),
                "pruned working graph"
            );
            Ok(PreparedGraph { graph: WorkingGraph::Pruned(sub), origin: o, destination: d, bbox })
        }
        _ => {
            warn!(%bbox, "pruning dropped an endpoint; using the full graph");
            Ok(PreparedGraph { graph: WorkingGraph::Full(base), origin, destination, bbox })
        }
    }
}

fn snap(network: &RoadNetwork, point: GeoPoint, endpoint: &'static str) -> EngineResult<NodeId> {
    if !point.is_valid() {
        return Err(EngineError::EndpointSnapFailure { endpoint, point });
    }
    network
        .snap_to_node(point)
        .ok_or(EngineError::EndpointSnapFailure { endpoint, point })
}
