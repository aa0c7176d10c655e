use approx::assert_relative_eq;

use crate::config::{NetworkConfig, SearchConfig};
use crate::generate::{anchors, dedup_candidates, discover_routes, GeneratorContext};
use crate::network::{build_network, Network, NodeId};
use crate::oracle::NetworkOracle;
use crate::pattern::{RoutePattern, RouteShape};
use crate::candidate::RouteCandidate;
use crate::network::EdgeId;
use crate::trail::{TrailId, TrailPoint, TrailSegment};

fn network_config() -> NetworkConfig {
    NetworkConfig {
        snap_tolerance_m: 2.0,
        loop_closing_tolerance_m: 5.0,
    }
}

fn pt(lng: f64, lat: f64, elevation: f64) -> TrailPoint {
    TrailPoint::new(lng, lat, elevation)
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

fn pattern(distance_km: f64, gain_m: f64, shape: RouteShape, tolerance: f64) -> RoutePattern {
    RoutePattern {
        target_distance_km: distance_km,
        target_elevation_gain_m: gain_m,
        shape,
        tolerance_percent: tolerance,
    }
}

/// Four collinear hops of ~111m each, rising 10m per hop.
fn rising_line() -> Network {
    build_network(
        &[
            segment(1, vec![pt(0.0, 0.000, 100.0), pt(0.0, 0.001, 110.0)]),
            segment(2, vec![pt(0.0, 0.001, 110.0), pt(0.0, 0.002, 120.0)]),
            segment(3, vec![pt(0.0, 0.002, 120.0), pt(0.0, 0.003, 130.0)]),
            segment(4, vec![pt(0.0, 0.003, 130.0), pt(0.0, 0.004, 140.0)]),
        ],
        &network_config(),
    )
}

#[test]
fn anchors_are_trailhead_nodes_in_id_order() {
    let network = rising_line();
    let config = SearchConfig::recommended();

    let anchors = anchors(&network, &config);

    assert_eq!(anchors.len(), 2, "a line has two trailheads");
    for pair in anchors.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    for id in &anchors {
        assert_eq!(network.node(*id).expect("node").degree, 1);
    }
}

#[test]
fn anchor_count_respects_the_configured_cap() {
    let network = rising_line();
    let config = SearchConfig {
        max_anchor_nodes: 1,
        ..SearchConfig::recommended()
    };

    assert_eq!(anchors(&network, &config).len(), 1);
}

#[test]
fn out_and_back_doubles_the_outbound_leg() {
    let network = rising_line();
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    // Full line is ~445m out, ~890m round trip. Climbing out gains 40m;
    // the retrace from the far anchor descends out and climbs home, so
    // both anchors see 40m of total gain.
    let pattern = pattern(0.89, 40.0, RouteShape::OutAndBack, 10.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    let output = discover_routes(&ctx);

    assert_eq!(output.candidates.len(), 2, "one route per trailhead");
    for candidate in &output.candidates {
        assert_eq!(candidate.shape, RouteShape::OutAndBack);
        assert_relative_eq!(candidate.distance_km, 0.8906, epsilon = 0.01);
        assert_relative_eq!(candidate.elevation_gain_m, 40.0, epsilon = 0.01);
        // The edge list walks out then retraces.
        let half = candidate.edges.len() / 2;
        let retrace: Vec<_> = candidate.edges[half..].iter().rev().collect();
        assert_eq!(candidate.edges[..half].iter().collect::<Vec<_>>(), retrace);
    }
}

#[test]
fn out_and_back_rejects_turnarounds_outside_the_band() {
    let network = rising_line();
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    // Target round trip of 10km is far beyond the network.
    let pattern = pattern(10.0, 0.0, RouteShape::OutAndBack, 10.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    assert!(discover_routes(&ctx).candidates.is_empty());
}

#[test]
fn loop_generation_finds_the_triangle_once() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0, 100.0), pt(0.001, 0.0, 100.0)]),
            segment(2, vec![pt(0.001, 0.0, 100.0), pt(0.0, 0.001, 100.0)]),
            segment(3, vec![pt(0.0, 0.001, 100.0), pt(0.0, 0.0, 100.0)]),
        ],
        &network_config(),
    );
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    // Triangle perimeter is ~380m.
    let pattern = pattern(0.38, 0.0, RouteShape::Loop, 20.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    let output = discover_routes(&ctx);

    assert_eq!(output.candidates.len(), 1);
    let route = &output.candidates[0];
    assert_eq!(route.shape, RouteShape::Loop);
    assert_eq!(route.edges.len(), 3);
    assert_relative_eq!(route.distance_km, 0.38, epsilon = 0.01);
}

#[test]
fn loop_generation_rejects_off_target_circuits() {
    let network = build_network(
        &[
            segment(1, vec![pt(0.0, 0.0, 100.0), pt(0.001, 0.0, 100.0)]),
            segment(2, vec![pt(0.001, 0.0, 100.0), pt(0.0, 0.001, 100.0)]),
            segment(3, vec![pt(0.0, 0.001, 100.0), pt(0.0, 0.0, 100.0)]),
        ],
        &network_config(),
    );
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    let pattern = pattern(10.0, 0.0, RouteShape::Loop, 20.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    let output = discover_routes(&ctx);
    assert!(output.candidates.is_empty());
    assert_eq!(output.stats.pattern_rejections, 1);
}

/// A stick from the trailhead to a junction, with a triangular candy
/// hanging off it.
fn lollipop_network() -> Network {
    build_network(
        &[
            // Stick: A(0,0) to J(0.001,0).
            segment(1, vec![pt(0.0, 0.0, 100.0), pt(0.001, 0.0, 100.0)]),
            // Candy: J - P - Q - J.
            segment(2, vec![pt(0.001, 0.0, 100.0), pt(0.002, 0.0, 100.0)]),
            segment(3, vec![pt(0.002, 0.0, 100.0), pt(0.0015, 0.001, 100.0)]),
            segment(4, vec![pt(0.0015, 0.001, 100.0), pt(0.001, 0.0, 100.0)]),
        ],
        &network_config(),
    )
}

#[test]
fn lollipop_requires_a_materially_different_return() {
    let network = lollipop_network();
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    // Stick ~111m, candy perimeter ~360m: full lollipop ~583m.
    let pattern = pattern(0.583, 0.0, RouteShape::Lollipop, 15.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    let output = discover_routes(&ctx);

    // The same physical loop is discoverable through both candy
    // junctions; deduplication keeps one.
    assert_eq!(output.candidates.len(), 1);

    let route = &output.candidates[0];
    assert_eq!(route.shape, RouteShape::Lollipop);
    assert_eq!(route.anchor, node_at(&network, 0.0, 0.0));
    assert_relative_eq!(route.distance_km, 0.583, epsilon = 0.01);
    assert!(route.overlap_percent <= config.lollipop_overlap_threshold_percent);
    // Start and end are both the anchor.
    assert_eq!(route.nodes.first(), route.nodes.last());

    // Pure retraces (the out-and-back in disguise) were offered by the
    // k-shortest search and rejected for overlap.
    assert!(output.stats.overlap_rejections > 0);
}

#[test]
fn lollipop_finds_nothing_on_a_bare_line() {
    let network = rising_line();
    let oracle = NetworkOracle::new(&network);
    let config = SearchConfig::recommended();

    let pattern = pattern(0.89, 40.0, RouteShape::Lollipop, 20.0);
    let ctx = GeneratorContext {
        network: &network,
        oracle: &oracle,
        pattern: &pattern,
        config: &config,
    };

    // Every return leg retraces the only path; all are rejected.
    let output = discover_routes(&ctx);
    assert!(output.candidates.is_empty());
}

fn fabricated(anchor: u64, edges: &[u64], distance_km: f64) -> RouteCandidate {
    let pattern = pattern(1.0, 0.0, RouteShape::Loop, 50.0);
    RouteCandidate::new(
        NodeId(anchor),
        RouteShape::Loop,
        vec![NodeId(anchor)],
        edges.iter().map(|id| EdgeId(*id)).collect(),
        distance_km,
        0.0,
        &pattern,
    )
}

#[test]
fn dedup_keeps_the_best_of_heavily_overlapping_candidates() {
    // Best scores 1.0; the near-duplicate shares 3 of 4 edges (75%).
    let best = fabricated(1, &[1, 2, 3], 1.0);
    let near_duplicate = fabricated(1, &[1, 2, 3, 4], 1.2);
    let distinct = fabricated(1, &[7, 8, 9], 1.1);

    let (kept, rejected) = dedup_candidates(
        vec![near_duplicate.clone(), best.clone(), distinct.clone()],
        60.0,
    );

    assert_eq!(rejected, 1);
    let ids: Vec<_> = kept.iter().map(|c| c.id).collect();
    assert!(ids.contains(&best.id));
    assert!(ids.contains(&distinct.id));
    assert!(!ids.contains(&near_duplicate.id));
}

#[test]
fn dedup_rejects_overlap_at_exactly_the_ceiling() {
    let best = fabricated(1, &[1, 2, 3, 4], 1.0);
    // Shares 3 of 5 distinct edges with the best: exactly 60%.
    let borderline = fabricated(1, &[1, 2, 3, 5], 1.1);

    let (kept, rejected) = dedup_candidates(vec![best.clone(), borderline], 60.0);

    assert_eq!(rejected, 1);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, best.id);
}

#[test]
fn dedup_groups_by_anchor() {
    // Identical edge sets at different anchors both survive.
    let here = fabricated(1, &[1, 2, 3], 1.0);
    let there = fabricated(2, &[1, 2, 3], 1.0);

    let (kept, rejected) = dedup_candidates(vec![here, there], 60.0);

    assert_eq!(kept.len(), 2);
    assert_eq!(rejected, 0);
}

#[test]
fn dedup_collapses_identical_ids() {
    let route = fabricated(1, &[1, 2, 3], 1.0);

    let (kept, rejected) = dedup_candidates(vec![route.clone(), route], 60.0);

    assert_eq!(kept.len(), 1);
    assert_eq!(rejected, 0, "an exact duplicate is not an overlap rejection");
}
