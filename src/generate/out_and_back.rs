//! Out-and-back generation: walk out to a turnaround near half the
//! target distance, retrace the same edges home.

use rayon::prelude::*;

use crate::candidate::RouteCandidate;
use crate::generate::{anchors, path_profile, GeneratorContext, GeneratorOutput};
use crate::network::NodeId;
use crate::oracle::{cost_cm, cost_to_m};
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

    // The turnaround sits near half the target; the tolerance band
    // halves with it.
    let half_target_m = ctx.pattern.target_distance_km * 1_000.0 / 2.0;
    let band = half_target_m * ctx.pattern.tolerance_percent / 100.0;
    let (half_min, half_max) = (cost_cm(half_target_m - band), cost_cm(half_target_m + band));

    let reach = ctx
        .oracle
        .reach(anchor, half_max, ctx.config.max_reachable_nodes);
    if reach.exhausted {
        output.stats.exhausted_searches += 1;
    }

    for turnaround in reach.reached {
        if turnaround.node == anchor || turnaround.cost < half_min {
            continue;
        }

        let Ok(outbound) = ctx.oracle.shortest_path(anchor, turnaround.node) else {
            output.stats.unreachable_queries += 1;
            continue;
        };

        let distance_km = 2.0 * cost_to_m(outbound.cost) / 1_000.0;

        // Retracing the outbound leg climbs what it descended, so the
        // round trip gains the outbound gain plus the outbound loss.
        let (out_gain, out_loss) = path_profile(ctx.network, &outbound.nodes, &outbound.edges);
        let elevation_gain_m = out_gain + out_loss;

        if !ctx.pattern.matches(distance_km, elevation_gain_m) {
            output.stats.pattern_rejections += 1;
            continue;
        }

        let mut edges = outbound.edges.clone();
        edges.extend(outbound.edges.iter().rev().copied());

        output.candidates.push(RouteCandidate::new(
            anchor,
            RouteShape::OutAndBack,
            outbound.nodes,
            edges,
            distance_km,
            elevation_gain_m,
            ctx.pattern,
        ));
    }

    output
}
