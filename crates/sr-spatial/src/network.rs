//! The road graph shared by every routing request.
//!
//! Outgoing edges are stored row-compressed: the edges leaving node `n`
//! are exactly the ids `node_out_start[n]..node_out_start[n + 1]`, and every
//! per-edge column (`edge_to`, `edge_length_m`, `edge_class`, ...) is
//! indexed by that same `EdgeId`.  Two nodes may be joined by several
//! edges.
//!
//! A built network never changes.  Scores, penalties and weights computed
//! for a request live in that request's overlay vectors, so one network can
//! sit behind an `Arc` and serve many threads.  Start and end coordinates
//! are snapped through an `rstar` R-tree over node positions.

use std::borrow::Cow;

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use sr_core::{BoundingBox, EdgeId, GeoPoint, NodeId};

use crate::RoadClass;

/// R-tree entry: `[lat, lon]` tagged with its node.  Distances are squared
/// degrees, which ranks neighbours correctly at city scale.
type NodeEntry = GeomWithData<[f64; 2], NodeId>;

// ── EdgeSpec ──────────────────────────────────────────────────────────────────

/// Static attributes of one directed street segment, as supplied to the
/// builder.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
    /// Physical length in metres.
    pub length_m: f64,
    /// OSM road classification.
    pub class: RoadClass,
    /// Posted speed limit, if tagged.
    pub speed_limit_kmh: Option<f32>,
    /// Full polyline including both endpoints, for curved segments.  Empty
    /// means the segment is the straight line between its endpoint nodes.
    pub geometry: Vec<GeoPoint>,
}

impl EdgeSpec {
    pub fn new(length_m: f64, class: RoadClass) -> Self {
        Self { length_m, class, speed_limit_kmh: None, geometry: Vec::new() }
    }

    pub fn with_speed_limit(mut self, kmh: f32) -> Self {
        self.speed_limit_kmh = Some(kmh);
        self
    }

    pub fn with_geometry(mut self, polyline: Vec<GeoPoint>) -> Self {
        self.geometry = polyline;
        self
    }

    /// The same segment traversed in the opposite direction.
    fn reversed(&self) -> Self {
        let mut rev = self.clone();
        rev.geometry.reverse();
        rev
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road multigraph with a node-snapping index.
///
/// Columns are public for tight loops; build one with
/// [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    /// Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Row offsets, `node_count + 1` long.
    pub node_out_start: Vec<u32>,

    // Per-edge columns, indexed by `EdgeId`.
    /// Tail node; lets routes be walked back from their last edge.
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    /// Metres.
    pub edge_length_m: Vec<f64>,
    pub edge_class: Vec<RoadClass>,
    /// Posted limit in km/h.
    pub edge_speed_limit_kmh: Vec<Option<f32>>,
    /// Curve polyline; empty for straight segments.
    pub edge_geometry: Vec<Vec<GeoPoint>>,

    spatial_idx: RTree<NodeEntry>,
}

impl RoadNetwork {
    /// No nodes, no edges; every route request against it fails.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    fn out_range(&self, node: NodeId) -> std::ops::Range<u32> {
        self.node_out_start[node.index()]..self.node_out_start[node.index() + 1]
    }

    /// Edges leaving `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_range(node).map(EdgeId)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_range(node).len()
    }

    /// Iterator over every `EdgeId` in the network.
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_count()).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Edge geometry ─────────────────────────────────────────────────────

    /// The polyline traced by `edge`: its curve geometry if present,
    /// otherwise the straight line between its endpoint nodes.
    pub fn edge_points(&self, edge: EdgeId) -> Cow<'_, [GeoPoint]> {
        let curve = &self.edge_geometry[edge.index()];
        if curve.len() >= 2 {
            Cow::Borrowed(curve.as_slice())
        } else {
            let a = self.node_pos[self.edge_from[edge.index()].index()];
            let b = self.node_pos[self.edge_to[edge.index()].index()];
            Cow::Owned(vec![a, b])
        }
    }

    /// Bounding box of the edge's polyline.
    pub fn edge_bbox(&self, edge: EdgeId) -> BoundingBox {
        let points = self.edge_points(edge);
        // edge_points always yields at least two points.
        BoundingBox::from_points(points.iter().copied())
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Midpoint of the straight line between the edge's endpoint nodes.
    pub fn edge_midpoint(&self, edge: EdgeId) -> GeoPoint {
        let a = self.node_pos[self.edge_from[edge.index()].index()];
        let b = self.node_pos[self.edge_to[edge.index()].index()];
        a.midpoint(b)
    }

    /// First edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    // ── Snapping ──────────────────────────────────────────────────────────

    /// Nearest node to `pos`; `None` only for an empty network.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.data)
    }

    /// Up to `k` nodes nearest to `pos`, closest first.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.data)
            .collect()
    }

    /// All nodes whose position lies strictly inside `bbox`, in ascending
    /// `NodeId` order.
    pub fn nodes_within(&self, bbox: &BoundingBox) -> Vec<NodeId> {
        let envelope = AABB::from_corners([bbox.south, bbox.west], [bbox.north, bbox.east]);
        let mut ids: Vec<NodeId> = self
            .spatial_idx
            .locate_in_envelope(&envelope)
            .filter(|e| {
                let [lat, lon] = *e.geom();
                bbox.contains_strict(GeoPoint::new(lat, lon))
            })
            .map(|e| e.data)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Nodes and directed edges may be added in any order; `build()` groups
/// the edges by source node and bulk-loads the snapping index.
///
/// # Example
///
/// ```
/// use sr_core::GeoPoint;
/// use sr_spatial::{EdgeSpec, RoadClass, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(10.775, 106.700));
/// let c = b.add_node(GeoPoint::new(10.780, 106.705));
/// b.add_road(a, c, EdgeSpec::new(760.0, RoadClass::Secondary));
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from: NodeId,
    to:   NodeId,
    spec: EdgeSpec,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Sized for a PBF import or a sub-network copy.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Ids are handed out densely from 0.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// One-way segment.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, spec: EdgeSpec) {
        self.raw_edges.push(RawEdge { from, to, spec });
    }

    /// Two-way segment; the return direction walks the polyline backwards.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, spec: EdgeSpec) {
        let rev = spec.reversed();
        self.add_directed_edge(a, b, spec);
        self.add_directed_edge(b, a, rev);
    }

    /// Two-way straight street whose length is the great-circle distance
    /// between its endpoint nodes.
    pub fn add_street(&mut self, a: NodeId, b: NodeId, class: RoadClass) {
        let length_m = self.node_pos(a).distance_km(self.node_pos(b)) * 1_000.0;
        self.add_road(a, b, EdgeSpec::new(length_m, class));
    }

    /// Position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Freeze into a [`RoadNetwork`].
    ///
    /// Edges are placed by a counting pass over their source nodes, so
    /// edges sharing a source keep the order they were added in.
    pub fn build(self) -> RoadNetwork {
        let n = self.nodes.len();
        let m = self.raw_edges.len();

        let mut node_out_start = vec![0u32; n + 1];
        for e in &self.raw_edges {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 0..n {
            node_out_start[i + 1] += node_out_start[i];
        }

        // slot[i] = final EdgeId of the i-th raw edge.
        let mut cursor: Vec<u32> = node_out_start[..n].to_vec();
        let slot: Vec<usize> = self
            .raw_edges
            .iter()
            .map(|e| {
                let at = cursor[e.from.index()];
                cursor[e.from.index()] += 1;
                at as usize
            })
            .collect();

        let mut placed: Vec<Option<RawEdge>> = (0..m).map(|_| None).collect();
        for (raw, at) in self.raw_edges.into_iter().zip(slot) {
            placed[at] = Some(raw);
        }

        let mut edge_from = Vec::with_capacity(m);
        let mut edge_to = Vec::with_capacity(m);
        let mut edge_length_m = Vec::with_capacity(m);
        let mut edge_class = Vec::with_capacity(m);
        let mut edge_speed_limit_kmh = Vec::with_capacity(m);
        let mut edge_geometry = Vec::with_capacity(m);
        for RawEdge { from, to, spec } in placed.into_iter().flatten() {
            edge_from.push(from);
            edge_to.push(to);
            edge_length_m.push(spec.length_m);
            edge_class.push(spec.class);
            edge_speed_limit_kmh.push(spec.speed_limit_kmh);
            edge_geometry.push(spec.geometry);
        }

        let spatial_idx = RTree::bulk_load(
            self.nodes
                .iter()
                .enumerate()
                .map(|(i, p)| NodeEntry::new([p.lat, p.lon], NodeId(i as u32)))
                .collect(),
        );

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_class,
            edge_speed_limit_kmh,
            edge_geometry,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
