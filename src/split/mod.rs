//! The intersection & splitting stage. Detects crossing, T and Y
//! intersections between trail polylines and splits trails at those
//! points, while preserving closed-loop trails as single un-split
//! entities.

pub mod intersection;
pub mod splitter;

use std::fmt::{Debug, Formatter};

use log::{info, warn};
use measure_time::debug_time;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::SplitConfig;
use crate::trail::{Trail, TrailId, TrailPoint, TrailSegment};

#[doc(inline)]
pub use intersection::detect_intersections;
#[doc(inline)]
pub use splitter::split_trail;

/// Identifier for an intersection point, sequential within one run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IntersectionId(pub u64);

/// How two (or more) trails meet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum IntersectionKind {
    /// Interior-to-interior crossing.
    Crossing,
    /// An endpoint of one trail meets the interior of another.
    TIntersection,
    /// Endpoints of both trails meet.
    YIntersection,
    /// More than one distinct meeting point, or a collinear overlap.
    MultiPoint,
}

/// A location where two or more trails meet or nearly meet (within the
/// snap tolerance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionPoint {
    pub id: IntersectionId,
    pub point: TrailPoint,
    pub trail_ids: SmallVec<[TrailId; 2]>,
    pub kind: IntersectionKind,
}

/// Per-trail geometry failures. These are logged and recovered locally;
/// the offending trail is excluded from splitting, the stage continues.
#[derive(Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Fewer than two vertices or zero length.
    DegenerateTrail(TrailId),
    /// Self-overlapping geometry that cannot be split meaningfully.
    UnsplittableSelfOverlap(TrailId),
}

impl GeometryError {
    pub fn trail_id(&self) -> TrailId {
        match self {
            GeometryError::DegenerateTrail(id) => *id,
            GeometryError::UnsplittableSelfOverlap(id) => *id,
        }
    }
}

impl Debug for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::DegenerateTrail(id) => write!(f, "degenerate trail {id:?}"),
            GeometryError::UnsplittableSelfOverlap(id) => {
                write!(f, "unsplittable self-overlap in trail {id:?}")
            }
        }
    }
}

/// Everything the splitting stage hands to the network builder.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub intersections: Vec<IntersectionPoint>,
    pub segments: Vec<TrailSegment>,
    /// Trails excluded from splitting, with the reason.
    pub skipped: Vec<GeometryError>,
    /// Degenerate segments dropped during splitting.
    pub dropped_segments: usize,
}

/// Runs the full stage: detect intersections across all trails, then
/// split each trail at the points that lie on it.
pub fn split_trails(trails: &[Trail], config: &SplitConfig) -> SplitOutcome {
    debug_time!("splitting {} trails", trails.len());

    let detection = detect_intersections(trails, config);

    for error in &detection.skipped {
        warn!("excluding trail from splitting: {error:?}");
    }

    let by_id: FxHashMap<TrailId, &Trail> = trails.iter().map(|t| (t.id(), t)).collect();

    let mut segments = Vec::new();
    let mut dropped_segments = 0;

    // Deterministic order: trails as supplied.
    for trail in trails {
        if detection.skipped.iter().any(|e| e.trail_id() == trail.id()) {
            continue;
        }

        let cuts = detection
            .cuts
            .get(&trail.id())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let (split, dropped) = split_trail(trail, cuts, config);
        segments.extend(split);
        dropped_segments += dropped;
    }

    info!(
        "split {} trails into {} segments ({} intersections, {} skipped, {} dropped)",
        by_id.len(),
        segments.len(),
        detection.intersections.len(),
        detection.skipped.len(),
        dropped_segments
    );

    SplitOutcome {
        intersections: detection.intersections,
        segments,
        skipped: detection.skipped,
        dropped_segments,
    }
}
