//! The network builder: deduplicated nodes and edges derived from split
//! trail segments, plus the spatial and topological indexes the
//! generators query.

pub mod builder;
pub mod edge;
pub mod node;
#[cfg(test)]
mod test;

use geo::Point;
use indexmap::IndexMap;
use petgraph::prelude::UnGraphMap;
use rstar::{RTree, AABB};
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

use crate::geo::{degree_radius, haversine_m};
use crate::trail::TrailPoint;

#[doc(inline)]
pub use builder::build_network;
#[doc(inline)]
pub use edge::{EdgeId, NetworkEdge};
#[doc(inline)]
pub use node::{NetworkNode, NodeId, NodeKind};

/// Edges between one node pair. Parallel edges are real here: two trails
/// can run different paths between the same two intersections.
pub type ParallelEdges = SmallVec<[EdgeId; 2]>;

/// The routing network for one workspace.
pub struct Network {
    pub(crate) nodes: IndexMap<NodeId, NetworkNode>,
    pub(crate) edges: IndexMap<EdgeId, NetworkEdge>,
    pub(crate) topology: UnGraphMap<NodeId, ParallelEdges>,
    pub(crate) index: RTree<NetworkNode>,
    /// Data-quality rejections recorded during the build (zero-length or
    /// degenerate edges).
    pub(crate) rejected_edges: usize,
}

impl Debug for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Network with {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        )
    }
}

impl Network {
    pub fn nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &NetworkEdge> {
        self.edges.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&NetworkNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&NetworkEdge> {
        self.edges.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn rejected_edges(&self) -> usize {
        self.rejected_edges
    }

    /// Edges incident to a node, in canonical edge order.
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = &NetworkEdge> + '_ {
        self.edges
            .values()
            .filter(move |edge| edge.source == node || edge.target == node)
    }

    /// All edges between two nodes (parallel edges included).
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> &[EdgeId] {
        self.topology
            .edge_weight(a, b)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    /// Nearest node to a position, if the network is non-empty.
    pub fn nearest_node(&self, point: Point<f64>) -> Option<&NetworkNode> {
        self.index
            .nearest_neighbor(&NetworkNode::at(point.x(), point.y()))
    }

    /// Nodes within a planar radius of a position.
    pub fn nodes_within(
        &self,
        point: &TrailPoint,
        radius_m: f64,
    ) -> impl Iterator<Item = &NetworkNode> + '_ {
        let (dlng, dlat) = degree_radius(point.lat, radius_m);
        let envelope = AABB::from_corners(
            NetworkNode::at(point.lng - dlng, point.lat - dlat),
            NetworkNode::at(point.lng + dlng, point.lat + dlat),
        );

        let origin = *point;
        self.index
            .locate_in_envelope(&envelope)
            .filter(move |node| haversine_m(&node.point, &origin) <= radius_m)
    }
}
