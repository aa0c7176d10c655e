//! The three route generators (out-and-back, loop, lollipop) plus the
//! final deduplication pass. Each generator fans out over anchor nodes
//! with `rayon` and collects in anchor order, so output is deterministic
//! for a given network and configuration.

pub mod dedup;
pub mod lollipop;
pub mod loops;
pub mod out_and_back;
#[cfg(test)]
mod test;

use log::info;
use measure_time::debug_time;

use crate::candidate::RouteCandidate;
use crate::config::SearchConfig;
use crate::network::{EdgeId, Network, NodeId};
use crate::oracle::GraphOracle;
use crate::pattern::{RoutePattern, RouteShape};

#[doc(inline)]
pub use dedup::dedup_candidates;

/// Everything a generator needs for one discovery run.
pub struct GeneratorContext<'a> {
    pub network: &'a Network,
    pub oracle: &'a dyn GraphOracle,
    pub pattern: &'a RoutePattern,
    pub config: &'a SearchConfig,
}

/// Counters surfaced in the run summary. Unreachable queries and
/// exhausted searches are recoverable events, not failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorStats {
    pub anchors_explored: usize,
    pub unreachable_queries: usize,
    pub exhausted_searches: usize,
    pub pattern_rejections: usize,
    pub overlap_rejections: usize,
}

impl GeneratorStats {
    pub fn absorb(&mut self, other: GeneratorStats) {
        self.anchors_explored += other.anchors_explored;
        self.unreachable_queries += other.unreachable_queries;
        self.exhausted_searches += other.exhausted_searches;
        self.pattern_rejections += other.pattern_rejections;
        self.overlap_rejections += other.overlap_rejections;
    }
}

/// Candidates plus the counters accumulated while finding them.
#[derive(Debug, Default)]
pub struct GeneratorOutput {
    pub candidates: Vec<RouteCandidate>,
    pub stats: GeneratorStats,
}

/// Runs the generator matching the pattern's shape, then deduplicates.
pub fn discover_routes(ctx: &GeneratorContext) -> GeneratorOutput {
    debug_time!("discovering {} routes", ctx.pattern.shape);

    let mut output = match ctx.pattern.shape {
        RouteShape::OutAndBack => out_and_back::generate(ctx),
        RouteShape::Loop => loops::generate(ctx),
        RouteShape::Lollipop => lollipop::generate(ctx),
    };

    let generated = output.candidates.len();
    let (kept, rejected) = dedup_candidates(
        output.candidates,
        ctx.config.dedup_overlap_ceiling_percent,
    );

    output.candidates = kept;
    output.stats.overlap_rejections += rejected;

    info!(
        "{} discovery: {} generated, {} kept after deduplication",
        ctx.pattern.shape,
        generated,
        output.candidates.len()
    );

    output
}

/// Anchor nodes for route starts: trailhead (degree-1) nodes, in
/// ascending id order, capped by the configured bound. Networks with no
/// endpoints at all (pure loop systems) fall back to every node.
pub fn anchors(network: &Network, config: &SearchConfig) -> Vec<NodeId> {
    let mut endpoints: Vec<NodeId> = network
        .nodes()
        .filter(|node| node.degree == 1)
        .map(|node| node.id)
        .collect();

    if endpoints.is_empty() {
        endpoints = network.nodes().map(|node| node.id).collect();
    }

    endpoints.sort();
    endpoints.truncate(config.max_anchor_nodes);
    endpoints
}

/// Directed elevation profile of a node/edge path: (gain, loss) walking
/// `nodes` in order across `edges`.
pub(crate) fn path_profile(
    network: &Network,
    nodes: &[NodeId],
    edges: &[EdgeId],
) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;

    for (from, edge_id) in nodes.iter().zip(edges) {
        if let Some(edge) = network.edge(*edge_id) {
            let (g, l) = edge.directed_profile(*from);
            gain += g;
            loss += l;
        }
    }

    (gain, loss)
}
