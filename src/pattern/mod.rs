//! Route patterns: the target profile a generated route must satisfy,
//! and the similarity score used to rank routes that do.


use serde::{Deserialize, Serialize};

/// The three route shapes the engine searches for.
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
pub enum RouteShape {
    OutAndBack,
    Loop,
    Lollipop,
}

/// A target distance/elevation profile with a tolerance band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePattern {
    pub target_distance_km: f64,
    pub target_elevation_gain_m: f64,
    pub shape: RouteShape,
    /// Applied to both distance and elevation, as a percentage of the
    /// target.
    pub tolerance_percent: f64,
}

impl RoutePattern {
    /// True when both distance and elevation gain fall inside the
    /// tolerance band.
    pub fn matches(&self, distance_km: f64, elevation_gain_m: f64) -> bool {
        self.within(distance_km, self.target_distance_km)
            && self.within(elevation_gain_m, self.target_elevation_gain_m)
    }

    fn within(&self, actual: f64, target: f64) -> bool {
        (actual - target).abs() <= target * self.tolerance_percent / 100.0
    }

    /// Normalised inverse of the combined relative deviation, in [0, 1].
    /// 1.0 is an exact match on both axes.
    pub fn similarity_score(&self, distance_km: f64, elevation_gain_m: f64) -> f64 {
        let deviation = |actual: f64, target: f64| {
            if target > 0.0 {
                ((actual - target).abs() / target).min(1.0)
            } else {
                // A zero target only deviates if the candidate is
                // non-zero.
                if actual > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        };

        let distance_dev = deviation(distance_km, self.target_distance_km);
        let elevation_dev = deviation(elevation_gain_m, self.target_elevation_gain_m);

        1.0 - (distance_dev + elevation_dev) / 2.0
    }

    /// The outer distance bound of the tolerance band, in metres.
    pub fn max_distance_m(&self) -> f64 {
        self.target_distance_km * 1_000.0 * (1.0 + self.tolerance_percent / 100.0)
    }
}
