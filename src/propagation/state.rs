//! Per-run node state (spec §4.4). Never stored on [`crate::graph::Graph`]
//! itself — the graph is immutable between runs (spec §3).

use serde::{Deserialize, Serialize};

use crate::graph::EdgeIdx;
use crate::model::NodeId;

/// Direction a node has taken in this propagation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Unknown,
    Unchanged,
}

impl Direction {
    /// `increases` edges preserve direction, `decreases` edges flip it;
    /// `unknown` is a fixed point of flipping (spec §8 invariant).
    pub fn flip(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Unknown => Direction::Unknown,
            Direction::Unchanged => Direction::Unchanged,
        }
    }
}

/// Confidence magnitude bucket (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    None,
    Small,
    Medium,
    Large,
}

impl Magnitude {
    pub fn from_confidence(confidence: f64) -> Magnitude {
        if confidence < 0.2 {
            Magnitude::None
        } else if confidence < 0.5 {
            Magnitude::Small
        } else if confidence < 0.8 {
            Magnitude::Medium
        } else {
            Magnitude::Large
        }
    }
}

/// A single candidate contribution accepted into a node's winning
/// direction group; the back-pointer chain [`crate::trace`] walks to
/// reconstruct causal paths.
#[derive(Clone, Debug)]
pub struct IncomingPath {
    /// `None` for a seed (tick 0); `Some` for an edge traversal.
    pub predecessor_edge: Option<EdgeIdx>,
    pub source: NodeId,
    pub source_confidence: f64,
    pub source_direction: Direction,
    pub direction: Direction,
    pub tick: u32,
}

/// Per-node propagation state, keyed by [`NodeId`] in the engine's
/// working map. Tracks the probabilistic-OR-combined confidence of each
/// direction group separately so later, weaker paths can still move the
/// needle (spec §4.4 step 2) without re-deriving it from scratch.
#[derive(Clone, Debug, Default)]
pub struct NodeState {
    pub up_confidence: Option<f64>,
    pub down_confidence: Option<f64>,
    pub direction: Direction,
    pub confidence: f64,
    pub blocked: bool,
    pub first_tick: Option<u32>,
    pub incoming_paths: Vec<IncomingPath>,
}

impl NodeState {
    pub fn unchanged() -> Self {
        NodeState {
            direction: Direction::Unchanged,
            ..Default::default()
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_is_involution_except_on_fixed_points() {
        assert_eq!(Direction::Up.flip(), Direction::Down);
        assert_eq!(Direction::Down.flip(), Direction::Up);
        assert_eq!(Direction::Unknown.flip(), Direction::Unknown);
        assert_eq!(Direction::Unchanged.flip(), Direction::Unchanged);
    }

    #[test]
    fn magnitude_bucket_boundaries() {
        assert_eq!(Magnitude::from_confidence(0.0), Magnitude::None);
        assert_eq!(Magnitude::from_confidence(0.19), Magnitude::None);
        assert_eq!(Magnitude::from_confidence(0.2), Magnitude::Small);
        assert_eq!(Magnitude::from_confidence(0.49), Magnitude::Small);
        assert_eq!(Magnitude::from_confidence(0.5), Magnitude::Medium);
        assert_eq!(Magnitude::from_confidence(0.79), Magnitude::Medium);
        assert_eq!(Magnitude::from_confidence(0.8), Magnitude::Large);
        assert_eq!(Magnitude::from_confidence(1.0), Magnitude::Large);
    }
}
