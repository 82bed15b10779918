//! Owned induced sub-networks.
//!
//! A [`Subgraph`] is a self-contained [`RoadNetwork`] built from the nodes of
//! a parent network that fall strictly inside a bounding box, plus every
//! parent edge whose endpoints both survive.  Edge attributes are copied
//! verbatim; local ids map back to parent ids through `parent_node` and
//! `parent_edge`.
//!
//! Local node ids are assigned in ascending parent-id order and local edges
//! are emitted in parent-edge order, so local `EdgeId` order matches parent
//! `EdgeId` order.

use rustc_hash::FxHashMap;

use sr_core::{BoundingBox, EdgeId, NodeId};

use crate::network::{EdgeSpec, RoadNetwork, RoadNetworkBuilder};

pub struct Subgraph {
    /// The extracted network with its own dense ids and spatial index.
    pub network: RoadNetwork,
    /// `parent_node[local]` is the parent `NodeId` of a local node.
    pub parent_node: Vec<NodeId>,
    /// `parent_edge[local]` is the parent `EdgeId` of a local edge.
    pub parent_edge: Vec<EdgeId>,
    local: FxHashMap<NodeId, NodeId>,
}

impl Subgraph {
    /// Local id of a parent node, if it was kept.
    pub fn local_node(&self, parent: NodeId) -> Option<NodeId> {
        self.local.get(&parent).copied()
    }

    /// `true` if every parent node in `parents` survived extraction.
    pub fn contains_all(&self, parents: &[NodeId]) -> bool {
        parents.iter().all(|p| self.local.contains_key(p))
    }
}

impl RoadNetwork {
    /// Extract the sub-network induced by the nodes strictly inside `bbox`.
    pub fn extract(&self, bbox: &BoundingBox) -> Subgraph {
        let kept = self.nodes_within(bbox);

        let mut local: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        local.reserve(kept.len());
        let mut builder = RoadNetworkBuilder::with_capacity(kept.len(), kept.len() * 2);
        for &parent in &kept {
            let id = builder.add_node(self.node_pos[parent.index()]);
            local.insert(parent, id);
        }

        let mut parent_edge = Vec::new();
        for edge in self.edges() {
            let i = edge.index();
            let (Some(&from), Some(&to)) =
                (local.get(&self.edge_from[i]), local.get(&self.edge_to[i]))
            else {
                continue;
            };
            builder.add_directed_edge(
                from,
                to,
                EdgeSpec {
                    length_m:        self.edge_length_m[i],
                    class:           self.edge_class[i],
                    speed_limit_kmh: self.edge_speed_limit_kmh[i],
                    geometry:        self.edge_geometry[i].clone(),
                },
            );
            parent_edge.push(edge);
        }

        Subgraph {
            network: builder.build(),
            parent_node: kept,
            parent_edge,
            local,
        }
    }
}
