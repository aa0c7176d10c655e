use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::network::NodeId;
use crate::trail::{TrailId, TrailPoint};

/// Canonical identifier of a network edge, sequential within one
/// workspace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EdgeId(pub u64);

/// A graph edge derived from one trail segment (or several, when
/// duplicate-geometry segments merged). Costs are symmetric: the edge is
/// traversable both ways, with gain and loss swapping under reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub length_m: f64,
    /// Gain when traversed source -> target.
    pub elevation_gain_m: f64,
    /// Loss when traversed source -> target.
    pub elevation_loss_m: f64,
    /// Originating trail segment(s); more than one after a duplicate
    /// merge.
    pub trail_ids: SmallVec<[TrailId; 2]>,
    pub geometry: Vec<TrailPoint>,
}

impl NetworkEdge {
    /// (gain, loss) for a traversal leaving `from`.
    pub fn directed_profile(&self, from: NodeId) -> (f64, f64) {
        if from == self.source {
            (self.elevation_gain_m, self.elevation_loss_m)
        } else {
            (self.elevation_loss_m, self.elevation_gain_m)
        }
    }
}
