use geo::{Distance, Haversine, Point};

use crate::trail::TrailPoint;

/// Great-circle distance between two trail points, in metres.
#[inline]
pub fn haversine_m(lhs: &TrailPoint, rhs: &TrailPoint) -> f64 {
    Haversine.distance(Point::new(lhs.lng, lhs.lat), Point::new(rhs.lng, rhs.lat))
}

/// 3D distance between two trail points: the haversine horizontal
/// distance combined with the elevation delta by Pythagoras.
#[inline]
pub fn distance_3d_m(lhs: &TrailPoint, rhs: &TrailPoint) -> f64 {
    let horizontal = haversine_m(lhs, rhs);
    let vertical = rhs.elevation - lhs.elevation;
    (horizontal * horizontal + vertical * vertical).sqrt()
}

/// Total 3D length of a polyline, in metres. Polylines with fewer than
/// two points have zero length.
pub fn polyline_length_m(points: &[TrailPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_3d_m(&pair[0], &pair[1]))
        .sum()
}

/// Horizontal (2D) length of a polyline, in metres. This is the measure
/// space used when locating cut points along a trail.
pub fn horizontal_length_m(points: &[TrailPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(&pair[0], &pair[1]))
        .sum()
}

/// Accumulated (gain, loss) over a polyline, both as positive metres.
pub fn elevation_profile_m(points: &[TrailPoint]) -> (f64, f64) {
    points.windows(2).fold((0.0, 0.0), |(gain, loss), pair| {
        let delta = pair[1].elevation - pair[0].elevation;
        if delta >= 0.0 {
            (gain + delta, loss)
        } else {
            (gain, loss - delta)
        }
    })
}
