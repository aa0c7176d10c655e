use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineLocatePoint, Point};

use crate::geo::haversine_m;
use crate::trail::TrailPoint;

/// The outcome of intersecting two polyline segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentCrossing {
    /// The segments meet at a single point. `proper` is false when the
    /// meeting point is an endpoint of either segment.
    Point { at: Coord<f64>, proper: bool },
    /// The segments are collinear and share a sub-segment.
    Collinear { overlap: Line<f64> },
}

/// Intersects two segments, wrapping the kernel's result so callers never
/// depend on the backing geometry library directly.
pub fn line_pair_intersection(a: Line<f64>, b: Line<f64>) -> Option<SegmentCrossing> {
    match line_intersection(a, b)? {
        LineIntersection::SinglePoint {
            intersection,
            is_proper,
        } => Some(SegmentCrossing::Point {
            at: intersection,
            proper: is_proper,
        }),
        LineIntersection::Collinear { intersection } => Some(SegmentCrossing::Collinear {
            overlap: intersection,
        }),
    }
}

/// A point located onto a polyline.
#[derive(Debug, Clone, Copy)]
pub struct MeasureAlong {
    /// Horizontal distance from the polyline start to the projection, in
    /// metres.
    pub measure_m: f64,
    /// Offset between the query point and its projection, in metres.
    pub offset_m: f64,
    /// The projected point, with elevation interpolated from the
    /// surrounding vertices.
    pub projected: TrailPoint,
}

/// Projects `target` onto the polyline and measures how far along it the
/// projection lies. Returns `None` for polylines with fewer than two
/// points.
pub fn measure_along_m(points: &[TrailPoint], target: Point<f64>) -> Option<MeasureAlong> {
    let mut cursor_m = 0.0;
    let mut best: Option<MeasureAlong> = None;

    for pair in points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let segment_m = haversine_m(a, b);

        let line = Line::new(
            Coord { x: a.lng, y: a.lat },
            Coord { x: b.lng, y: b.lat },
        );

        if let Some(frac) = line.line_locate_point(&target) {
            let projected = TrailPoint {
                lng: a.lng + (b.lng - a.lng) * frac,
                lat: a.lat + (b.lat - a.lat) * frac,
                elevation: a.elevation + (b.elevation - a.elevation) * frac,
            };
            let offset_m = haversine_m(
                &projected,
                &TrailPoint {
                    lng: target.x(),
                    lat: target.y(),
                    elevation: projected.elevation,
                },
            );

            if best.as_ref().map_or(true, |b| offset_m < b.offset_m) {
                best = Some(MeasureAlong {
                    measure_m: cursor_m + segment_m * frac,
                    offset_m,
                    projected,
                });
            }
        }

        cursor_m += segment_m;
    }

    best
}
