//! The graph oracle: an implementation-agnostic contract for the path
//! and cycle queries the generators need. Any engine satisfying this
//! trait is substitutable; [`NetworkOracle`] is the in-process default
//! built on the `pathfinding` primitives.

pub mod network;
#[cfg(test)]
mod test;

use std::fmt::{Debug, Formatter};

use crate::network::{EdgeId, NodeId};

#[doc(inline)]
pub use network::NetworkOracle;

/// Query cost unit: edge length in integer centimetres, so costs are
/// totally ordered and sum without drift.
pub type Cost = u64;

#[inline]
pub fn cost_cm(length_m: f64) -> Cost {
    (length_m * 100.0).round() as Cost
}

#[inline]
pub fn cost_to_m(cost: Cost) -> f64 {
    cost as f64 / 100.0
}

/// An ordered path through the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePath {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub cost: Cost,
}

impl OraclePath {
    pub fn length_m(&self) -> f64 {
        cost_to_m(self.cost)
    }
}

/// A simple cycle: `nodes` lists each visited node once in traversal
/// order, `edges` closes back to the first node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub cost: Cost,
}

impl Circuit {
    pub fn length_m(&self) -> f64 {
        cost_to_m(self.cost)
    }

    pub fn distinct_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// One node reached by a bounded one-to-many expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reached {
    pub node: NodeId,
    pub cost: Cost,
}

/// Result of a bounded reach query. `exhausted` is set when the node cap
/// stopped the expansion early; callers report it, they do not fail.
#[derive(Debug, Clone)]
pub struct ReachSet {
    pub reached: Vec<Reached>,
    pub exhausted: bool,
}

/// Result of circuit enumeration, with the same exhaustion semantics.
#[derive(Debug, Clone)]
pub struct CircuitSet {
    pub circuits: Vec<Circuit>,
    pub exhausted: bool,
}

/// Bounds every circuit enumeration must take. These are mandatory: the
/// enumeration is exponential without them.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBounds {
    /// Edges costlier than this are excluded from enumeration.
    pub max_edge_cost: Cost,
    /// Circuits costlier than this are pruned mid-walk.
    pub max_total_cost: Cost,
    /// Maximum distinct nodes per circuit.
    pub max_nodes: usize,
    /// Hard cap on circuits returned.
    pub max_circuits: usize,
}

/// Connectivity failures are explicit: a query against a disconnected
/// pair is `Unreachable`, never a silent empty success.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    Unreachable { from: NodeId, to: NodeId },
    UnknownNode(NodeId),
}

impl Debug for OracleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Unreachable { from, to } => {
                write!(f, "no path between {from:?} and {to:?}")
            }
            OracleError::UnknownNode(node) => write!(f, "unknown node {node:?}"),
        }
    }
}

/// The queries the route generators require, independent of the backing
/// engine.
pub trait GraphOracle: Sync {
    /// Least-cost path between two nodes.
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<OraclePath, OracleError>;

    /// Up to `k` paths ranked by ascending cost, deduplicated by edge
    /// set.
    fn k_shortest_paths(
        &self,
        from: NodeId,
        to: NodeId,
        k: usize,
    ) -> Result<Vec<OraclePath>, OracleError>;

    /// Simple cycles within the supplied bounds.
    fn enumerate_circuits(&self, bounds: &CircuitBounds) -> CircuitSet;

    /// Bounded one-to-many expansion: every node reachable within
    /// `max_cost`, capped at `max_nodes` explored.
    fn reach(&self, from: NodeId, max_cost: Cost, max_nodes: usize) -> ReachSet;
}
