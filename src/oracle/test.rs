use crate::config::NetworkConfig;
use crate::network::{build_network, Network, NodeId};
use crate::oracle::{cost_cm, CircuitBounds, GraphOracle, NetworkOracle, OracleError};
use crate::trail::{TrailId, TrailPoint, TrailSegment};

fn config() -> NetworkConfig {
    NetworkConfig {
        snap_tolerance_m: 2.0,
        loop_closing_tolerance_m: 5.0,
    }
}

fn pt(lng: f64, lat: f64) -> TrailPoint {
    TrailPoint::new(lng, lat, 1500.0)
}

fn segment(trail: u64, points: Vec<TrailPoint>) -> TrailSegment {
    TrailSegment::new(TrailId(trail), 0, points)
}

fn node_at(network: &Network, lng: f64, lat: f64) -> NodeId {
    network
        .nearest_node(geo::Point::new(lng, lat))
        .expect("node")
        .id
}

/// S - M1 - T over the top, S - M2 - T along a longer bottom detour.
fn diamond() -> Network {
    build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.001, 0.0005)]),
            segment(2, vec![pt(0.001, 0.0005), pt(0.002, 0.0)]),
            segment(3, vec![pt(0.0, 0.0), pt(0.001, -0.002)]),
            segment(4, vec![pt(0.001, -0.002), pt(0.002, 0.0)]),
        ],
        &config(),
    )
}

#[test]
fn shortest_path_prefers_the_short_side() {
    let network = diamond();
    let oracle = NetworkOracle::new(&network);

    let s = node_at(&network, 0.0, 0.0);
    let t = node_at(&network, 0.002, 0.0);
    let m1 = node_at(&network, 0.001, 0.0005);

    let path = oracle.shortest_path(s, t).expect("path");

    assert_eq!(path.nodes, vec![s, m1, t]);
    assert_eq!(path.edges.len(), 2);
    // Cost equals the summed edge lengths.
    let expected: u64 = path
        .edges
        .iter()
        .map(|id| cost_cm(network.edge(*id).expect("edge").length_m))
        .sum();
    assert_eq!(path.cost, expected);
}

#[test]
fn k_shortest_paths_rank_ascending_and_dedupe() {
    let network = diamond();
    let oracle = NetworkOracle::new(&network);

    let s = node_at(&network, 0.0, 0.0);
    let t = node_at(&network, 0.002, 0.0);

    let paths = oracle.k_shortest_paths(s, t, 4).expect("paths");

    assert_eq!(paths.len(), 2, "diamond has exactly two distinct routes");
    assert!(paths[0].cost <= paths[1].cost);

    let mut a = paths[0].edges.clone();
    let mut b = paths[1].edges.clone();
    a.sort();
    b.sort();
    assert_ne!(a, b, "paths must differ by edge set");
}

#[test]
fn disconnected_components_are_unreachable_not_empty() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.0, 0.001)]),
            segment(2, vec![pt(1.0, 1.0), pt(1.0, 1.001)]),
        ],
        &config(),
    );
    let oracle = NetworkOracle::new(&network);

    let here = node_at(&network, 0.0, 0.0);
    let there = node_at(&network, 1.0, 1.0);

    match oracle.shortest_path(here, there) {
        Err(OracleError::Unreachable { from, to }) => {
            assert_eq!(from, here);
            assert_eq!(to, there);
        }
        other => panic!("expected Unreachable, got {other:?}"),
    }

    assert!(oracle.k_shortest_paths(here, there, 3).is_err());
}

#[test]
fn triangle_yields_exactly_one_circuit() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.001, 0.0)]),
            segment(2, vec![pt(0.001, 0.0), pt(0.0, 0.001)]),
            segment(3, vec![pt(0.0, 0.001), pt(0.0, 0.0)]),
        ],
        &config(),
    );
    let oracle = NetworkOracle::new(&network);

    let set = oracle.enumerate_circuits(&CircuitBounds {
        max_edge_cost: cost_cm(10_000.0),
        max_total_cost: cost_cm(100_000.0),
        max_nodes: 10,
        max_circuits: 100,
    });

    assert!(!set.exhausted);
    assert_eq!(set.circuits.len(), 1);
    assert_eq!(set.circuits[0].distinct_nodes(), 3);
    assert_eq!(set.circuits[0].edges.len(), 3);
}

#[test]
fn parallel_edge_pair_is_not_a_circuit() {
    // Two distinct paths between the same node pair: a 2-node
    // back-and-forth, not a loop.
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.001, 0.001), pt(0.002, 0.0)]),
            segment(2, vec![pt(0.0, 0.0), pt(0.001, -0.001), pt(0.002, 0.0)]),
        ],
        &config(),
    );
    let oracle = NetworkOracle::new(&network);

    let set = oracle.enumerate_circuits(&CircuitBounds {
        max_edge_cost: cost_cm(10_000.0),
        max_total_cost: cost_cm(100_000.0),
        max_nodes: 10,
        max_circuits: 100,
    });

    assert!(set.circuits.is_empty());
}

#[test]
fn circuit_enumeration_respects_the_edge_cost_filter() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.001, 0.0)]),
            segment(2, vec![pt(0.001, 0.0), pt(0.0, 0.001)]),
            segment(3, vec![pt(0.0, 0.001), pt(0.0, 0.0)]),
        ],
        &config(),
    );
    let oracle = NetworkOracle::new(&network);

    // Every edge is over 100m; a 50m filter excludes them all.
    let set = oracle.enumerate_circuits(&CircuitBounds {
        max_edge_cost: cost_cm(50.0),
        max_total_cost: cost_cm(100_000.0),
        max_nodes: 10,
        max_circuits: 100,
    });

    assert!(set.circuits.is_empty());
}

#[test]
fn reach_is_bounded_by_cost_and_node_caps() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0), pt(0.0, 0.001)]),
            segment(2, vec![pt(0.0, 0.001), pt(0.0, 0.002)]),
            segment(3, vec![pt(0.0, 0.002), pt(0.0, 0.003)]),
        ],
        &config(),
    );
    let oracle = NetworkOracle::new(&network);
    let start = node_at(&network, 0.0, 0.0);

    // ~111m per hop; a 150m ceiling reaches only the first neighbour.
    let close = oracle.reach(start, cost_cm(150.0), 100);
    assert!(!close.exhausted);
    assert_eq!(close.reached.len(), 2, "start plus one neighbour");

    let capped = oracle.reach(start, cost_cm(1_000.0), 2);
    assert!(capped.exhausted);
    assert_eq!(capped.reached.len(), 2);
}
