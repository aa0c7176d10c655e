//! Route candidates: concrete paths evaluated against a pattern, plus
//! the edge-overlap measure used to enforce route diversity.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};

use crate::network::{EdgeId, Network, NodeId};
use crate::pattern::{RoutePattern, RouteShape};
use crate::trail::TrailId;

/// Stable candidate identifier: a deterministic hash of anchor, shape
/// and edge set, so re-running a workspace yields identical ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CandidateId(pub u64);

/// A generated route that passed its pattern check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub id: CandidateId,
    /// Human-readable name derived from the constituent trail names.
    pub name: String,
    pub anchor: NodeId,
    pub shape: RouteShape,
    /// Node visit order. Out-and-back routes list the outbound leg only;
    /// lollipops list outbound then return.
    pub nodes: Vec<NodeId>,
    /// Edge traversal order, repeats included (an out-and-back traverses
    /// each edge twice).
    pub edges: Vec<EdgeId>,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    /// Similarity to the pattern, in [0, 1].
    pub score: f64,
    /// Maximum edge overlap against already-accepted candidates in the
    /// same anchor/shape group. Zero until deduplication runs.
    pub overlap_percent: f64,
}

impl RouteCandidate {
    pub fn new(
        anchor: NodeId,
        shape: RouteShape,
        nodes: Vec<NodeId>,
        edges: Vec<EdgeId>,
        distance_km: f64,
        elevation_gain_m: f64,
        pattern: &RoutePattern,
    ) -> Self {
        let score = pattern.similarity_score(distance_km, elevation_gain_m);
        let id = derive_id(anchor, shape, &edges);

        RouteCandidate {
            id,
            name: String::new(),
            anchor,
            shape,
            nodes,
            edges,
            distance_km,
            elevation_gain_m,
            score,
            overlap_percent: 0.0,
        }
    }

    /// The distinct edges this route uses.
    pub fn edge_set(&self) -> FxHashSet<EdgeId> {
        self.edges.iter().copied().collect()
    }

    /// Names the route from its constituent trails, e.g.
    /// `"Mesa Trail / Bear Canyon lollipop"`.
    pub fn derive_name<F>(&mut self, network: &Network, trail_name: F)
    where
        F: Fn(TrailId) -> Option<String>,
    {
        let mut seen: Vec<String> = Vec::new();

        for edge_id in &self.edges {
            let Some(edge) = network.edge(*edge_id) else {
                continue;
            };
            for trail_id in &edge.trail_ids {
                if let Some(name) = trail_name(*trail_id) {
                    if !name.is_empty() && !seen.contains(&name) {
                        seen.push(name);
                    }
                }
            }
        }

        seen.truncate(3);
        let trails = if seen.is_empty() {
            "Unnamed".to_string()
        } else {
            seen.join(" / ")
        };

        self.name = format!("{trails} {}", self.shape);
    }
}

fn derive_id(anchor: NodeId, shape: RouteShape, edges: &[EdgeId]) -> CandidateId {
    let mut sorted: Vec<EdgeId> = edges.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut hasher = FxHasher::default();
    anchor.hash(&mut hasher);
    shape.hash(&mut hasher);
    sorted.hash(&mut hasher);
    CandidateId(hasher.finish())
}

/// Edge overlap between two paths:
/// `|a ∩ b| / |a ∪ b|` as a percentage in [0, 100].
pub fn edge_overlap_percent(a: &FxHashSet<EdgeId>, b: &FxHashSet<EdgeId>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }

    let shared = a.intersection(b).count();
    100.0 * shared as f64 / union as f64
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(ids: &[u64]) -> FxHashSet<EdgeId> {
        ids.iter().map(|id| EdgeId(*id)).collect()
    }

    #[test]
    fn overlap_is_jaccard_as_percent() {
        let a = set(&[1, 2, 3, 4]);
        let b = set(&[3, 4, 5, 6]);

        // 2 shared of 6 total.
        let overlap = edge_overlap_percent(&a, &b);
        assert!((overlap - 100.0 * 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn identical_paths_overlap_fully() {
        let a = set(&[1, 2, 3]);
        assert_eq!(edge_overlap_percent(&a, &a.clone()), 100.0);
    }

    #[test]
    fn disjoint_paths_do_not_overlap() {
        assert_eq!(edge_overlap_percent(&set(&[1, 2]), &set(&[3, 4])), 0.0);
    }

    #[test]
    fn empty_paths_overlap_zero() {
        assert_eq!(edge_overlap_percent(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn candidate_ids_are_stable_and_order_insensitive() {
        let a = derive_id(NodeId(1), RouteShape::Lollipop, &[EdgeId(1), EdgeId(2)]);
        let b = derive_id(NodeId(1), RouteShape::Lollipop, &[EdgeId(2), EdgeId(1)]);
        let c = derive_id(NodeId(2), RouteShape::Lollipop, &[EdgeId(1), EdgeId(2)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
