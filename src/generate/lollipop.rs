//! Lollipop generation: shortest path out to a junction, a materially
//! different path back. The stick is the shared prefix, the candy is
//! whatever the return leg does differently.

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::candidate::{edge_overlap_percent, RouteCandidate};
use crate::generate::{anchors, path_profile, GeneratorContext, GeneratorOutput};
use crate::network::NodeId;
use crate::oracle::{cost_cm, cost_to_m, OraclePath, Reached};
use crate::pattern::RouteShape;

pub fn generate(ctx: &GeneratorContext) -> GeneratorOutput {
    let anchors = anchors(ctx.network, ctx.config);

    let per_anchor: Vec<GeneratorOutput> = anchors
        .par_iter()
        .map(|anchor| explore_anchor(ctx, *anchor))
        .collect();

    let mut output = GeneratorOutput::default();
    for mut part in per_anchor {
        output.stats.absorb(part.stats);
        output.candidates.append(&mut part.candidates);
    }

    output
}

fn explore_anchor(ctx: &GeneratorContext, anchor: NodeId) -> GeneratorOutput {
    let mut output = GeneratorOutput::default();
    output.stats.anchors_explored = 1;

    let target_m = ctx.pattern.target_distance_km * 1_000.0;
    let band = ctx.config.destination_band;
    let (dest_min, dest_max) = (
        cost_cm(target_m * band.min_fraction),
        cost_cm(target_m * band.max_fraction),
    );

    let reach = ctx
        .oracle
        .reach(anchor, dest_max, ctx.config.max_reachable_nodes);
    if reach.exhausted {
        output.stats.exhausted_searches += 1;
    }

    for destination in destinations(ctx, anchor, &reach.reached, dest_min, dest_max) {
        let Ok(outbound) = ctx.oracle.shortest_path(anchor, destination) else {
            output.stats.unreachable_queries += 1;
            continue;
        };

        let Ok(returns) = ctx
            .oracle
            .k_shortest_paths(destination, anchor, ctx.config.ksp_paths)
        else {
            output.stats.unreachable_queries += 1;
            continue;
        };

        let outbound_set: FxHashSet<_> = outbound.edges.iter().copied().collect();

        for ret in returns {
            let return_set: FxHashSet<_> = ret.edges.iter().copied().collect();
            let overlap = edge_overlap_percent(&outbound_set, &return_set);

            // A return that mostly retraces the stick is an out-and-back
            // in disguise.
            if overlap > ctx.config.lollipop_overlap_threshold_percent {
                output.stats.overlap_rejections += 1;
                continue;
            }

            if let Some(candidate) = assemble(ctx, anchor, &outbound, &ret, overlap) {
                output.candidates.push(candidate);
            } else {
                output.stats.pattern_rejections += 1;
            }
        }
    }

    output
}

/// Candidate turn points: reached nodes inside the fractional distance
/// band, plus planar near neighbours of each (junctions a few metres off
/// the shortest-path tree still make good turn points). Ordered by how
/// close they sit to the band's midpoint, capped per anchor.
fn destinations(
    ctx: &GeneratorContext,
    anchor: NodeId,
    reached: &[Reached],
    dest_min: u64,
    dest_max: u64,
) -> Vec<NodeId> {
    let midpoint = (dest_min + dest_max) / 2;

    let mut in_band: Vec<Reached> = reached
        .iter()
        .filter(|r| r.node != anchor && r.cost >= dest_min && r.cost <= dest_max)
        .copied()
        .collect();
    in_band.sort_by_key(|r| (r.cost.abs_diff(midpoint), r.node));

    let mut seen: FxHashSet<NodeId> = FxHashSet::default();
    let mut picked = Vec::new();

    for reached in in_band {
        if picked.len() >= ctx.config.max_destinations_per_anchor {
            break;
        }
        if seen.insert(reached.node) {
            picked.push(reached.node);
        }

        let Some(node) = ctx.network.node(reached.node) else {
            continue;
        };

        let mut nearby: Vec<NodeId> = ctx
            .network
            .nodes_within(&node.point, ctx.config.nearby_node_radius_m)
            .map(|n| n.id)
            .filter(|id| *id != anchor)
            .collect();
        nearby.sort();

        for id in nearby {
            if picked.len() >= ctx.config.max_destinations_per_anchor {
                break;
            }
            if seen.insert(id) {
                picked.push(id);
            }
        }
    }

    picked
}

fn assemble(
    ctx: &GeneratorContext,
    anchor: NodeId,
    outbound: &OraclePath,
    ret: &OraclePath,
    overlap: f64,
) -> Option<RouteCandidate> {
    let distance_km = cost_to_m(outbound.cost + ret.cost) / 1_000.0;

    let (out_gain, _) = path_profile(ctx.network, &outbound.nodes, &outbound.edges);
    let (ret_gain, _) = path_profile(ctx.network, &ret.nodes, &ret.edges);
    let elevation_gain_m = out_gain + ret_gain;

    if !ctx.pattern.matches(distance_km, elevation_gain_m) {
        return None;
    }

    let mut nodes = outbound.nodes.clone();
    nodes.extend(ret.nodes.iter().skip(1).copied());

    let mut edges = outbound.edges.clone();
    edges.extend(ret.edges.iter().copied());

    let mut candidate = RouteCandidate::new(
        anchor,
        RouteShape::Lollipop,
        nodes,
        edges,
        distance_km,
        elevation_gain_m,
        ctx.pattern,
    );
    candidate.overlap_percent = overlap;
    Some(candidate)
}
