//! Final deduplication: within each anchor/shape group, keep the
//! best-scoring candidates whose edge overlap against everything already
//! kept stays under the configured ceiling.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::candidate::{edge_overlap_percent, RouteCandidate};
use crate::network::{EdgeId, NodeId};
use crate::pattern::RouteShape;

/// Returns the surviving candidates and the count rejected for overlap.
/// Exact duplicates (same id) are silently collapsed first.
pub fn dedup_candidates(
    candidates: Vec<RouteCandidate>,
    ceiling_percent: f64,
) -> (Vec<RouteCandidate>, usize) {
    let mut seen_ids = FxHashSet::default();
    let mut groups: IndexMap<(NodeId, RouteShape), Vec<RouteCandidate>> = IndexMap::new();

    for candidate in candidates {
        if seen_ids.insert(candidate.id) {
            groups
                .entry((candidate.anchor, candidate.shape))
                .or_default()
                .push(candidate);
        }
    }

    let mut kept = Vec::new();
    let mut rejected = 0;

    for (_, mut group) in groups {
        // Stable sort: generator-level tie-breaks survive equal scores.
        group.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut accepted: Vec<FxHashSet<EdgeId>> = Vec::new();

        for mut candidate in group {
            let edge_set = candidate.edge_set();

            let worst = accepted
                .iter()
                .map(|other| edge_overlap_percent(&edge_set, other))
                .fold(0.0_f64, f64::max);

            if worst >= ceiling_percent {
                rejected += 1;
                continue;
            }

            candidate.overlap_percent = candidate.overlap_percent.max(worst);
            accepted.push(edge_set);
            kept.push(candidate);
        }
    }

    // Best routes first across all groups.
    kept.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

    (kept, rejected)
}
