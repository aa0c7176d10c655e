//! Loop generation: bounded simple-cycle enumeration over the whole
//! network, filtered against the pattern.

use crate::candidate::RouteCandidate;
use crate::generate::{path_profile, GeneratorContext, GeneratorOutput};
use crate::oracle::{cost_cm, cost_to_m, CircuitBounds};
use crate::pattern::RouteShape;

pub fn generate(ctx: &GeneratorContext) -> GeneratorOutput {
    let mut output = GeneratorOutput::default();
    let circuits = &ctx.config.circuits;

    let set = ctx.oracle.enumerate_circuits(&CircuitBounds {
        max_edge_cost: cost_cm(circuits.max_edge_cost_m),
        max_total_cost: cost_cm(ctx.pattern.max_distance_m()),
        max_nodes: circuits.max_circuit_nodes,
        max_circuits: circuits.max_circuits,
    });

    if set.exhausted {
        output.stats.exhausted_searches += 1;
    }

    for circuit in set.circuits {
        let distance_km = cost_to_m(circuit.cost) / 1_000.0;
        let (gain, _) = path_profile(ctx.network, &circuit.nodes, &circuit.edges);

        if !ctx.pattern.matches(distance_km, gain) {
            output.stats.pattern_rejections += 1;
            continue;
        }

        let anchor = circuit.nodes[0];
        output.candidates.push(RouteCandidate::new(
            anchor,
            RouteShape::Loop,
            circuit.nodes,
            circuit.edges,
            distance_km,
            gain,
            ctx.pattern,
        ));
    }

    // Equal scores break towards richer loops: more junctions visited
    // means more varied terrain.
    output.candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.nodes.len().cmp(&a.nodes.len()))
            .then_with(|| a.id.cmp(&b.id))
    });

    output
}
