//! In-process oracle over a built [`Network`], backed by the
//! `pathfinding` primitives with integer-centimetre costs.

use log::debug;
use pathfinding::prelude::{dijkstra, dijkstra_reach, yen};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::network::{EdgeId, Network, NodeId};
use crate::oracle::{
    cost_cm, Circuit, CircuitBounds, CircuitSet, Cost, GraphOracle, OracleError, OraclePath,
    ReachSet, Reached,
};

type Successor = (NodeId, EdgeId, Cost);

/// The default [`GraphOracle`] implementation. Precomputes a successor
/// table in deterministic order (ascending neighbour, then cost) so
/// repeated queries over one workspace snapshot yield identical results.
pub struct NetworkOracle {
    successors: FxHashMap<NodeId, SmallVec<[Successor; 4]>>,
    /// Cheapest edge per unordered node pair, for path reconstruction.
    cheapest: FxHashMap<(NodeId, NodeId), (EdgeId, Cost)>,
    node_ids: Vec<NodeId>,
}

impl NetworkOracle {
    pub fn new(network: &Network) -> Self {
        let mut successors: FxHashMap<NodeId, SmallVec<[Successor; 4]>> = FxHashMap::default();
        let mut cheapest: FxHashMap<(NodeId, NodeId), (EdgeId, Cost)> = FxHashMap::default();

        for edge in network.edges() {
            let cost = cost_cm(edge.length_m);

            for (from, to) in [(edge.source, edge.target), (edge.target, edge.source)] {
                successors
                    .entry(from)
                    .or_default()
                    .push((to, edge.id, cost));

                let entry = cheapest.entry((from, to)).or_insert((edge.id, cost));
                if cost < entry.1 {
                    *entry = (edge.id, cost);
                }
            }
        }

        for neighbours in successors.values_mut() {
            neighbours.sort_by_key(|(node, edge, cost)| (*node, *cost, *edge));
        }

        let mut node_ids: Vec<NodeId> = network.nodes().map(|n| n.id).collect();
        node_ids.sort();

        NetworkOracle {
            successors,
            cheapest,
            node_ids,
        }
    }

    #[inline]
    fn neighbours(&self, node: &NodeId) -> &[Successor] {
        self.successors
            .get(node)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    fn require_node(&self, node: NodeId) -> Result<(), OracleError> {
        if self.successors.contains_key(&node) {
            Ok(())
        } else {
            Err(OracleError::UnknownNode(node))
        }
    }

    /// Rebuilds the edge sequence for a node path using the cheapest
    /// edge between each consecutive pair.
    fn edges_of(&self, nodes: &[NodeId]) -> Vec<EdgeId> {
        nodes
            .windows(2)
            .filter_map(|pair| self.cheapest.get(&(pair[0], pair[1])).map(|(edge, _)| *edge))
            .collect()
    }
}

impl GraphOracle for NetworkOracle {
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<OraclePath, OracleError> {
        self.require_node(from)?;
        self.require_node(to)?;

        let (nodes, cost) = dijkstra(
            &from,
            |node| {
                self.neighbours(node)
                    .iter()
                    .map(|(next, _, cost)| (*next, *cost))
                    .collect::<Vec<_>>()
            },
            |node| *node == to,
        )
        .ok_or(OracleError::Unreachable { from, to })?;

        let edges = self.edges_of(&nodes);
        Ok(OraclePath { nodes, edges, cost })
    }

    fn k_shortest_paths(
        &self,
        from: NodeId,
        to: NodeId,
        k: usize,
    ) -> Result<Vec<OraclePath>, OracleError> {
        self.require_node(from)?;
        self.require_node(to)?;

        let ranked = yen(
            &from,
            |node| {
                self.neighbours(node)
                    .iter()
                    .map(|(next, _, cost)| (*next, *cost))
                    .collect::<Vec<_>>()
            },
            |node| *node == to,
            k,
        );

        if ranked.is_empty() {
            return Err(OracleError::Unreachable { from, to });
        }

        // Rank is ascending already; dedupe by edge set.
        let mut seen: FxHashSet<Vec<EdgeId>> = FxHashSet::default();
        let mut paths = Vec::with_capacity(ranked.len());

        for (nodes, cost) in ranked {
            let edges = self.edges_of(&nodes);
            let mut key = edges.clone();
            key.sort();

            if seen.insert(key) {
                paths.push(OraclePath { nodes, edges, cost });
            }
        }

        paths.truncate(k);
        Ok(paths)
    }

    fn enumerate_circuits(&self, bounds: &CircuitBounds) -> CircuitSet {
        let mut walker = CircuitWalker {
            oracle: self,
            bounds,
            circuits: Vec::new(),
            exhausted: false,
        };

        for start in self.node_ids.clone() {
            if walker.exhausted {
                break;
            }

            let mut visited = FxHashSet::default();
            visited.insert(start);
            walker.walk(start, start, &mut vec![start], &mut Vec::new(), 0, &mut visited);
        }

        debug!(
            "enumerated {} circuits (exhausted: {})",
            walker.circuits.len(),
            walker.exhausted
        );

        CircuitSet {
            circuits: walker.circuits,
            exhausted: walker.exhausted,
        }
    }

    fn reach(&self, from: NodeId, max_cost: Cost, max_nodes: usize) -> ReachSet {
        let mut reached = Vec::new();
        let mut exhausted = false;

        for item in dijkstra_reach(&from, |node| {
            self.neighbours(node)
                .iter()
                .map(|(next, _, cost)| (*next, *cost))
                .collect::<Vec<_>>()
        }) {
            if item.total_cost > max_cost {
                break;
            }
            if reached.len() >= max_nodes {
                exhausted = true;
                break;
            }

            reached.push(Reached {
                node: item.node,
                cost: item.total_cost,
            });
        }

        ReachSet { reached, exhausted }
    }
}

/// Depth-first simple-cycle enumeration. Each cycle is discovered
/// exactly once: only its smallest node acts as the start, and only one
/// orientation (second node below last node) is kept.
struct CircuitWalker<'a> {
    oracle: &'a NetworkOracle,
    bounds: &'a CircuitBounds,
    circuits: Vec<Circuit>,
    exhausted: bool,
}

impl CircuitWalker<'_> {
    #[allow(clippy::too_many_arguments)]
    fn walk(
        &mut self,
        start: NodeId,
        current: NodeId,
        nodes: &mut Vec<NodeId>,
        edges: &mut Vec<EdgeId>,
        cost: Cost,
        visited: &mut FxHashSet<NodeId>,
    ) {
        if self.exhausted {
            return;
        }

        for (next, edge, edge_cost) in self.oracle.neighbours(&current).to_vec() {
            if edge_cost > self.bounds.max_edge_cost {
                continue;
            }

            let total = cost + edge_cost;
            if total > self.bounds.max_total_cost {
                continue;
            }

            if next == start {
                // Closing the cycle. Two-node back-and-forth is not a
                // loop; one orientation of each cycle is enough.
                if nodes.len() >= 3 && nodes[1] < nodes[nodes.len() - 1] {
                    let mut circuit_edges = edges.clone();
                    circuit_edges.push(edge);

                    self.circuits.push(Circuit {
                        nodes: nodes.clone(),
                        edges: circuit_edges,
                        cost: total,
                    });

                    if self.circuits.len() >= self.bounds.max_circuits {
                        self.exhausted = true;
                        return;
                    }
                }
                continue;
            }

            if next < start || visited.contains(&next) || nodes.len() >= self.bounds.max_nodes {
                continue;
            }

            nodes.push(next);
            edges.push(edge);
            visited.insert(next);

            self.walk(start, next, nodes, edges, total, visited);

            visited.remove(&next);
            edges.pop();
            nodes.pop();

            if self.exhausted {
                return;
            }
        }
    }
}
