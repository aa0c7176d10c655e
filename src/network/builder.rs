//! Builds the canonical node/edge sets from split trail segments.
//!
//! Every segment endpoint is clustered (within the snap tolerance) into
//! exactly one node whose coordinate is the cluster centroid; every
//! surviving segment becomes exactly one edge.

use indexmap::IndexMap;
use log::{info, warn};
use measure_time::debug_time;
use petgraph::prelude::UnGraphMap;
use rstar::RTree;
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::config::NetworkConfig;
use crate::geo::{
    elevation_profile_m, haversine_m, horizontal_length_m, polyline_length_m,
};
use crate::network::{
    EdgeId, Network, NetworkEdge, NetworkNode, NodeId, ParallelEdges,
};
use crate::split::splitter::cut_polyline;
use crate::trail::{TrailId, TrailPoint, TrailSegment};

/// A piece of segment geometry headed for edge emission. Closed segments
/// are subdivided into arcs before this point.
struct Piece {
    trail_id: TrailId,
    points: Vec<TrailPoint>,
}

/// An endpoint cluster accumulating a running centroid.
struct Cluster {
    sum_lng: f64,
    sum_lat: f64,
    sum_elevation: f64,
    count: u32,
}

impl Cluster {
    fn seed(point: &TrailPoint) -> Self {
        Cluster {
            sum_lng: point.lng,
            sum_lat: point.lat,
            sum_elevation: point.elevation,
            count: 1,
        }
    }

    fn absorb(&mut self, point: &TrailPoint) {
        self.sum_lng += point.lng;
        self.sum_lat += point.lat;
        self.sum_elevation += point.elevation;
        self.count += 1;
    }

    fn centroid(&self) -> TrailPoint {
        TrailPoint {
            lng: self.sum_lng / self.count as f64,
            lat: self.sum_lat / self.count as f64,
            elevation: self.sum_elevation / self.count as f64,
        }
    }
}

/// Assembles the network. Closed-loop segments (both endpoints in one
/// cluster) are subdivided into three arcs so the loop is expressed as a
/// path revisiting a node rather than a degenerate self-edge.
pub fn build_network(segments: &[TrailSegment], config: &NetworkConfig) -> Network {
    debug_time!("building network from {} segments", segments.len());

    let mut pieces = Vec::with_capacity(segments.len());
    for segment in segments {
        if closes_on_itself(segment, config.loop_closing_tolerance_m) {
            // Snap the closure shut, then subdivide into three arcs so
            // the loop revisits its trailhead node instead of forming a
            // degenerate self-edge.
            let mut closed = segment.points.clone();
            if let (Some(first), Some(last)) = (closed.first().copied(), closed.last_mut()) {
                *last = first;
            }

            let length = horizontal_length_m(&closed);
            for arc in cut_polyline(&closed, &[length / 3.0, 2.0 * length / 3.0]) {
                pieces.push(Piece {
                    trail_id: segment.trail_id,
                    points: arc,
                });
            }
        } else {
            pieces.push(Piece {
                trail_id: segment.trail_id,
                points: segment.points.clone(),
            });
        }
    }

    // Greedy endpoint clustering: an endpoint joins the first cluster
    // whose running centroid lies within the snap tolerance.
    let mut clusters: Vec<Cluster> = Vec::new();
    let assign = |clusters: &mut Vec<Cluster>, point: &TrailPoint| -> usize {
        for (index, cluster) in clusters.iter_mut().enumerate() {
            if haversine_m(&cluster.centroid(), point) <= config.snap_tolerance_m {
                cluster.absorb(point);
                return index;
            }
        }

        clusters.push(Cluster::seed(point));
        clusters.len() - 1
    };

    let endpoints: Vec<(usize, usize)> = pieces
        .iter()
        .map(|piece| {
            let start = assign(&mut clusters, &piece.points[0]);
            let end = assign(&mut clusters, &piece.points[piece.points.len() - 1]);
            (start, end)
        })
        .collect();

    // Emit edges, merging duplicate (source, target, geometry) triples.
    let mut edges: IndexMap<EdgeId, NetworkEdge> = IndexMap::new();
    let mut seen: FxHashMap<(NodeId, NodeId, Vec<(i64, i64)>), EdgeId> = FxHashMap::default();
    let mut rejected_edges = 0;
    let mut next_edge = 0u64;

    for (piece, (start, end)) in pieces.iter().zip(&endpoints) {
        let source = NodeId(*start as u64);
        let target = NodeId(*end as u64);

        if source == target {
            warn!(
                "dropping self-loop edge from trail {:?} (cluster {:?})",
                piece.trail_id, source
            );
            rejected_edges += 1;
            continue;
        }

        let length_m = polyline_length_m(&piece.points);
        if length_m <= 0.0 {
            rejected_edges += 1;
            continue;
        }

        let key = (
            source.min(target),
            source.max(target),
            geometry_key(&piece.points),
        );

        match seen.get(&key) {
            Some(existing) => {
                // Duplicate geometry: merge, keeping the richer
                // attribute set.
                if let Some(edge) = edges.get_mut(existing) {
                    if !edge.trail_ids.contains(&piece.trail_id) {
                        edge.trail_ids.push(piece.trail_id);
                    }
                    if piece.points.len() > edge.geometry.len() {
                        let (gain, loss) = elevation_profile_m(&piece.points);
                        edge.geometry = piece.points.clone();
                        edge.length_m = length_m;
                        edge.elevation_gain_m = gain;
                        edge.elevation_loss_m = loss;
                    }
                }
            }
            None => {
                let id = EdgeId(next_edge);
                next_edge += 1;

                let (gain, loss) = elevation_profile_m(&piece.points);
                edges.insert(
                    id,
                    NetworkEdge {
                        id,
                        source,
                        target,
                        length_m,
                        elevation_gain_m: gain,
                        elevation_loss_m: loss,
                        trail_ids: smallvec![piece.trail_id],
                        geometry: piece.points.clone(),
                    },
                );
                seen.insert(key, id);
            }
        }
    }

    // Degree from the emitted edge set, then final node emission.
    let mut degrees: FxHashMap<NodeId, u32> = FxHashMap::default();
    for edge in edges.values() {
        *degrees.entry(edge.source).or_default() += 1;
        *degrees.entry(edge.target).or_default() += 1;
    }

    let mut nodes: IndexMap<NodeId, NetworkNode> = IndexMap::new();
    for (index, cluster) in clusters.iter().enumerate() {
        let id = NodeId(index as u64);
        let degree = degrees.get(&id).copied().unwrap_or(0);

        // Clusters with no surviving incident edge are not emitted.
        if degree == 0 {
            continue;
        }

        nodes.insert(
            id,
            NetworkNode {
                id,
                point: cluster.centroid(),
                degree,
            },
        );
    }

    let mut topology: UnGraphMap<NodeId, ParallelEdges> = UnGraphMap::new();
    for edge in edges.values() {
        match topology.edge_weight_mut(edge.source, edge.target) {
            Some(parallel) => parallel.push(edge.id),
            None => {
                topology.add_edge(edge.source, edge.target, smallvec![edge.id]);
            }
        }
    }

    let index = RTree::bulk_load(nodes.values().copied().collect());

    info!(
        "built network: {} nodes, {} edges ({} rejected)",
        nodes.len(),
        edges.len(),
        rejected_edges
    );

    Network {
        nodes,
        edges,
        topology,
        index,
        rejected_edges,
    }
}

fn closes_on_itself(segment: &TrailSegment, snap_tolerance_m: f64) -> bool {
    segment.points.len() > 3
        && haversine_m(segment.start(), segment.end()) <= snap_tolerance_m
}

/// Direction-normalised, quantised geometry key (about 0.1m resolution)
/// for duplicate-edge detection.
fn geometry_key(points: &[TrailPoint]) -> Vec<(i64, i64)> {
    let quantise =
        |p: &TrailPoint| ((p.lng * 1e6).round() as i64, (p.lat * 1e6).round() as i64);

    let forward: Vec<(i64, i64)> = points.iter().map(quantise).collect();
    let mut backward = forward.clone();
    backward.reverse();

    forward.min(backward)
}
