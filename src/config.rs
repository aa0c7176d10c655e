//! The configuration surface. Every tolerance and search bound the
//! pipeline consumes is an explicit field here; nothing is hard-coded
//! inside algorithmic code. The `recommended()` constructors carry the
//! documented defaults, callers are free to override any field.

use serde::{Deserialize, Serialize};

/// Per-run configuration for the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub split: SplitConfig,
    pub network: NetworkConfig,
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Defaults validated against foothill-scale networks (order of 10^4
    /// edges). Denser datasets should tighten the search bounds.
    pub fn recommended() -> Self {
        EngineConfig {
            split: SplitConfig::recommended(),
            network: NetworkConfig::recommended(),
            search: SearchConfig::recommended(),
        }
    }
}

/// Tolerances for the intersection & splitting stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Near-miss band: how far apart two trails may be and still count
    /// as meeting, in metres.
    pub snap_tolerance_m: f64,
    /// Cuts closer than this to an existing endpoint snap to it instead
    /// of creating a micro-segment.
    pub min_segment_length_m: f64,
    /// Start/end separation under which a trail is a closed loop and is
    /// exempt from self-splitting.
    pub loop_closing_tolerance_m: f64,
}

impl SplitConfig {
    pub fn recommended() -> Self {
        SplitConfig {
            snap_tolerance_m: 2.0,
            min_segment_length_m: 5.0,
            loop_closing_tolerance_m: 5.0,
        }
    }
}

/// Tolerances for the network builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Segment endpoints within this distance cluster into one node.
    pub snap_tolerance_m: f64,
    /// A segment whose own endpoints sit within this distance is treated
    /// as closed: its end snaps onto its start and the loop is encoded
    /// as arcs revisiting that node.
    pub loop_closing_tolerance_m: f64,
}

impl NetworkConfig {
    pub fn recommended() -> Self {
        NetworkConfig {
            snap_tolerance_m: 2.0,
            loop_closing_tolerance_m: 5.0,
        }
    }
}

/// The fractional band of the target distance in which lollipop
/// destinations are searched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceBand {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

/// Bounds on circuit enumeration. These keep cycle discovery tractable
/// on dense graphs; enumeration stops (and reports exhaustion) when a
/// cap is hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Edges longer than this are ignored during enumeration.
    pub max_edge_cost_m: f64,
    /// Maximum node count per circuit.
    pub max_circuit_nodes: usize,
    /// Maximum number of circuits returned.
    pub max_circuits: usize,
}

/// Mandatory bounds for the three generators. All unbounded-looking
/// searches take their caps from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// How many anchor nodes each generator may explore.
    pub max_anchor_nodes: usize,
    /// Cap on nodes expanded by any one bounded reach query.
    pub max_reachable_nodes: usize,
    /// Cap on destinations examined per anchor (lollipop).
    pub max_destinations_per_anchor: usize,
    /// `k` for k-shortest-path alternate return legs.
    pub ksp_paths: usize,
    /// Fractional distance band for lollipop destinations.
    pub destination_band: DistanceBand,
    /// Planar relaxation radius for near-adjacent destinations that are
    /// not strictly on the shortest-path tree.
    pub nearby_node_radius_m: f64,
    /// Maximum outbound/return edge overlap for an accepted lollipop.
    pub lollipop_overlap_threshold_percent: f64,
    /// Maximum overlap against already-accepted candidates during final
    /// deduplication.
    pub dedup_overlap_ceiling_percent: f64,
    pub circuits: CircuitConfig,
}

impl SearchConfig {
    pub fn recommended() -> Self {
        SearchConfig {
            max_anchor_nodes: 50,
            max_reachable_nodes: 5_000,
            max_destinations_per_anchor: 25,
            ksp_paths: 5,
            destination_band: DistanceBand {
                min_fraction: 0.2,
                max_fraction: 0.8,
            },
            nearby_node_radius_m: 50.0,
            lollipop_overlap_threshold_percent: 30.0,
            dedup_overlap_ceiling_percent: 60.0,
            circuits: CircuitConfig {
                max_edge_cost_m: 5_000.0,
                max_circuit_nodes: 60,
                max_circuits: 10_000,
            },
        }
    }
}
