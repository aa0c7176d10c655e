//! Raw trail entities as supplied by the ingestion collaborator. Trails
//! are the immutable source of truth: the pipeline only ever derives
//! segments from them, it never mutates them.

use rstar::{RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

use crate::geo::{degree_radius, elevation_profile_m, haversine_m, polyline_length_m};

/// Stable identifier assigned by the ingestion collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TrailId(pub u64);

/// A 3D vertex of a trail polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub lng: f64,
    pub lat: f64,
    /// Metres above sea level.
    pub elevation: f64,
}

impl TrailPoint {
    pub fn new(lng: f64, lat: f64, elevation: f64) -> Self {
        TrailPoint {
            lng,
            lat,
            elevation,
        }
    }

    #[inline]
    pub fn as_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

/// An immutable input trail with derived metrics.
#[derive(Clone, Serialize, Deserialize)]
pub struct Trail {
    id: TrailId,
    name: String,
    points: Vec<TrailPoint>,
    length_m: f64,
    elevation_gain_m: f64,
    elevation_loss_m: f64,
}

impl Debug for Trail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trail({:?} {:?}, {} pts, {:.0}m)",
            self.id,
            self.name,
            self.points.len(),
            self.length_m
        )
    }
}

impl Trail {
    /// Constructs a trail, deriving length and elevation metrics from the
    /// supplied polyline.
    pub fn new(id: TrailId, name: impl Into<String>, points: Vec<TrailPoint>) -> Self {
        let length_m = polyline_length_m(&points);
        let (elevation_gain_m, elevation_loss_m) = elevation_profile_m(&points);

        Trail {
            id,
            name: name.into(),
            points,
            length_m,
            elevation_gain_m,
            elevation_loss_m,
        }
    }

    pub fn id(&self) -> TrailId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    pub fn elevation_loss_m(&self) -> f64 {
        self.elevation_loss_m
    }

    /// A trail is a closed loop when its start and end vertices sit
    /// within the closing tolerance of one another.
    pub fn is_loop(&self, closing_tolerance_m: f64) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => {
                haversine_m(first, last) <= closing_tolerance_m
            }
            _ => false,
        }
    }

    /// Fewer than two vertices, or zero horizontal extent.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.length_m <= 0.0
    }

    /// Bounding envelope in degree space, padded by `pad_m` so near-miss
    /// intersections within the tolerance band still register as overlap.
    pub fn bounds(&self, pad_m: f64) -> TrailBounds {
        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);

        for point in &self.points {
            min_x = min_x.min(point.lng);
            min_y = min_y.min(point.lat);
            max_x = max_x.max(point.lng);
            max_y = max_y.max(point.lat);
        }

        let (dlng, dlat) = degree_radius((min_y + max_y) / 2.0, pad_m);

        TrailBounds {
            id: self.id,
            aabb: AABB::from_corners(
                [min_x - dlng, min_y - dlat],
                [max_x + dlng, max_y + dlat],
            ),
        }
    }
}

/// Spatially-indexable bounding envelope of one trail, used to prune the
/// pairwise intersection scan.
#[derive(Debug, Clone)]
pub struct TrailBounds {
    pub id: TrailId,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for TrailBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// A contiguous piece of one trail produced by the splitting stage.
/// Re-assembling a trail's segments in ordinal order reconstructs the
/// original geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailSegment {
    pub trail_id: TrailId,
    /// Position of this segment along its parent trail, zero-based.
    pub ordinal: u32,
    pub points: Vec<TrailPoint>,
    pub length_m: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
}

impl TrailSegment {
    pub fn new(trail_id: TrailId, ordinal: u32, points: Vec<TrailPoint>) -> Self {
        let length_m = polyline_length_m(&points);
        let (elevation_gain_m, elevation_loss_m) = elevation_profile_m(&points);

        TrailSegment {
            trail_id,
            ordinal,
            points,
            length_m,
            elevation_gain_m,
            elevation_loss_m,
        }
    }

    /// Zero length or too few vertices to form a line. Dropped by the
    /// splitting stage, never retried.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2 || self.length_m <= 0.0
    }

    pub fn start(&self) -> &TrailPoint {
        &self.points[0]
    }

    pub fn end(&self) -> &TrailPoint {
        &self.points[self.points.len() - 1]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pt(lng: f64, lat: f64, elevation: f64) -> TrailPoint {
        TrailPoint::new(lng, lat, elevation)
    }

    #[test]
    fn derives_metrics_on_construction() {
        let trail = Trail::new(
            TrailId(1),
            "Mesa Trail",
            vec![
                pt(-105.28, 39.98, 1700.0),
                pt(-105.28, 39.99, 1780.0),
                pt(-105.28, 40.00, 1750.0),
            ],
        );

        assert!(trail.length_m() > 2000.0);
        assert_eq!(trail.elevation_gain_m(), 80.0);
        assert_eq!(trail.elevation_loss_m(), 30.0);
    }

    #[test]
    fn loop_detection_uses_closing_tolerance() {
        // Start and end roughly 3m apart.
        let trail = Trail::new(
            TrailId(2),
            "Ridge Loop",
            vec![
                pt(-105.28, 39.98, 1700.0),
                pt(-105.27, 39.99, 1750.0),
                pt(-105.28, 39.99, 1760.0),
                pt(-105.28, 39.980027, 1700.0),
            ],
        );

        assert!(trail.is_loop(5.0));
        assert!(!trail.is_loop(1.0));
    }

    #[test]
    fn two_point_polyline_is_never_a_loop() {
        let trail = Trail::new(
            TrailId(3),
            "Stub",
            vec![pt(-105.28, 39.98, 1700.0), pt(-105.28, 39.980001, 1700.0)],
        );

        assert!(!trail.is_loop(50.0));
    }
}
