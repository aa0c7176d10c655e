//! The geometry kernel. Thin contract wrappers over the `geo` crate:
//! 3D polyline length, elevation accumulation, segment intersection and
//! measure-along-line queries. Everything downstream (splitting, network
//! building, generators) talks to geometry through this module.

pub mod intersect;
pub mod length;

#[doc(inline)]
pub use intersect::{line_pair_intersection, measure_along_m, SegmentCrossing};
#[doc(inline)]
pub use length::{
    distance_3d_m, elevation_profile_m, haversine_m, horizontal_length_m, polyline_length_m,
};

/// Approximate metres per degree of latitude. Only used to convert a metric
/// tolerance into a degree-space search envelope; all real distances go
/// through [`haversine_m`].
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Half-extents in degree space (dlng, dlat) covering `distance_m` at the
/// given latitude.
pub fn degree_radius(lat: f64, distance_m: f64) -> (f64, f64) {
    let dlat = distance_m / METERS_PER_DEGREE;
    let dlng = distance_m / (METERS_PER_DEGREE * lat.to_radians().cos().max(1e-6));
    (dlng, dlat)
}
