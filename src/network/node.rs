use serde::{Deserialize, Serialize};

use crate::trail::TrailPoint;

/// Canonical identifier of a network node, sequential within one
/// workspace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

/// Node classification, derived from connectivity degree alone.
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
pub enum NodeKind {
    /// Degree 1: a trailhead or dead end.
    Endpoint,
    /// Degree 2: a pass-through point.
    Connector,
    /// Degree 3 or more.
    Intersection,
}

impl NodeKind {
    pub fn from_degree(degree: u32) -> Self {
        match degree {
            0 | 1 => NodeKind::Endpoint,
            2 => NodeKind::Connector,
            _ => NodeKind::Intersection,
        }
    }
}

/// A deduplicated graph node: the centroid of all segment endpoints that
/// clustered within the snap tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: NodeId,
    pub point: TrailPoint,
    /// Count of incident edges in the emitted edge set.
    pub degree: u32,
}

impl NetworkNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_degree(self.degree)
    }

    /// A positional probe for spatial queries. Identifier and degree are
    /// placeholders.
    pub fn at(lng: f64, lat: f64) -> Self {
        NetworkNode {
            id: NodeId(0),
            point: TrailPoint::new(lng, lat, 0.0),
            degree: 0,
        }
    }
}

impl rstar::Point for NetworkNode {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        NetworkNode::at(generator(0), generator(1))
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.point.lng,
            1 => self.point.lat,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.point.lng,
            1 => &mut self.point.lat,
            _ => unreachable!(),
        }
    }
}
