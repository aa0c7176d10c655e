use crate::config::NetworkConfig;
use crate::geo::haversine_m;
use crate::network::{build_network, NodeKind};
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

fn segment(trail: u64, ordinal: u32, points: Vec<TrailPoint>) -> TrailSegment {
    TrailSegment::new(TrailId(trail), ordinal, points)
}

/// Two segments meeting end-to-start, with a 1m gap inside the snap
/// tolerance.
fn chain() -> Vec<TrailSegment> {
    vec![
        segment(1, 0, vec![pt(0.0, 0.0), pt(0.0, 0.001)]),
        segment(1, 1, vec![pt(0.0, 0.001009), pt(0.0, 0.002)]),
    ]
}

#[test]
fn snapped_endpoints_share_one_node() {
    let network = build_network(&chain(), &config());

    // Four endpoints, two of which cluster together.
    assert_eq!(network.node_count(), 3);
    assert_eq!(network.edge_count(), 2);
}

#[test]
fn cluster_representative_is_the_centroid() {
    let network = build_network(&chain(), &config());

    let shared = network
        .nodes()
        .find(|node| node.degree == 2)
        .expect("shared connector node");

    // Centroid of lat 0.001 and 0.001009.
    let expected = pt(0.0, 0.0010045);
    assert!(haversine_m(&shared.point, &expected) < 0.1);
}

#[test]
fn degree_matches_incident_edge_count() {
    let mut segments = chain();
    // Third edge out of the shared point.
    segments.push(segment(2, 0, vec![pt(0.0, 0.001), pt(0.001, 0.001)]));

    let network = build_network(&segments, &config());

    for node in network.nodes() {
        assert_eq!(
            node.degree as usize,
            network.incident_edges(node.id).count(),
            "degree mismatch at {:?}",
            node.id
        );
    }

    let hub = network.nodes().find(|n| n.degree == 3).expect("hub node");
    assert_eq!(hub.kind(), NodeKind::Intersection);
}

#[test]
fn node_kinds_follow_degree_only() {
    let network = build_network(&chain(), &config());

    let kinds: Vec<NodeKind> = network.nodes().map(|n| n.kind()).collect();
    assert_eq!(
        kinds.iter().filter(|k| **k == NodeKind::Endpoint).count(),
        2
    );
    assert_eq!(
        kinds.iter().filter(|k| **k == NodeKind::Connector).count(),
        1
    );
}

#[test]
fn duplicate_geometry_segments_merge_into_one_edge() {
    let mut segments = chain();
    // Same geometry as the first segment, different trail.
    segments.push(segment(3, 0, vec![pt(0.0, 0.0), pt(0.0, 0.001)]));

    let network = build_network(&segments, &config());

    assert_eq!(network.edge_count(), 2);
    let merged = network
        .edges()
        .find(|edge| edge.trail_ids.len() == 2)
        .expect("merged edge");
    assert!(merged.trail_ids.contains(&TrailId(1)));
    assert!(merged.trail_ids.contains(&TrailId(3)));
}

#[test]
fn reversed_duplicate_geometry_also_merges() {
    let mut segments = chain();
    segments.push(segment(4, 0, vec![pt(0.0, 0.001), pt(0.0, 0.0)]));

    let network = build_network(&segments, &config());
    assert_eq!(network.edge_count(), 2);
}

#[test]
fn zero_length_segments_are_rejected_not_fatal() {
    let mut segments = chain();
    segments.push(segment(5, 0, vec![pt(0.5, 0.5), pt(0.5, 0.5)]));

    let network = build_network(&segments, &config());

    assert_eq!(network.edge_count(), 2);
    assert_eq!(network.rejected_edges(), 1);
}

#[test]
fn closed_segment_becomes_a_three_arc_cycle() {
    // Diamond loop, endpoints ~3m apart (inside the closing tolerance).
    let loop_segment = segment(
        6,
        0,
        vec![
            pt(0.0, 0.0),
            pt(0.002, 0.002),
            pt(0.0, 0.004),
            pt(-0.002, 0.002),
            pt(0.0, 0.000027),
        ],
    );

    let network = build_network(&[loop_segment], &config());

    assert_eq!(network.node_count(), 3);
    assert_eq!(network.edge_count(), 3);
    // No degenerate self-edges.
    for edge in network.edges() {
        assert_ne!(edge.source, edge.target);
    }
    // Every node participates in the cycle.
    for node in network.nodes() {
        assert_eq!(node.degree, 2);
    }
}

#[test]
fn parallel_edges_are_kept_distinct() {
    // Two different paths between the same two nodes.
    let segments = vec![
        segment(7, 0, vec![pt(0.0, 0.0), pt(0.001, 0.001), pt(0.002, 0.0)]),
        segment(8, 0, vec![pt(0.0, 0.0), pt(0.001, -0.001), pt(0.002, 0.0)]),
    ];

    let network = build_network(&segments, &config());

    assert_eq!(network.node_count(), 2);
    assert_eq!(network.edge_count(), 2);

    let nodes: Vec<_> = network.nodes().map(|n| n.id).collect();
    assert_eq!(network.edges_between(nodes[0], nodes[1]).len(), 2);
}
