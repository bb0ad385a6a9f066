//! Baseline-vs-intervention diffing (spec §4.6).
//!
//! Runs the Propagation Engine twice with identical options and
//! classifies every node affected in either run. The 0.05 change
//! threshold is fixed by spec §4.6 and is deliberately not wired to
//! [`crate::config::EngineConfig::unknown_epsilon`] — they answer
//! different questions (direction conflict vs. change significance)
//! and happen to share a default value, not a meaning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::SimulationError;
use crate::graph::Graph;
use crate::model::NodeId;
use crate::propagation::{self, Direction, SimulationRequest, SimulationResponse};

/// Threshold above which a confidence delta counts as `strengthened`
/// or `weakened` rather than `unchanged` (spec §4.6).
const CHANGE_THRESHOLD: f64 = 0.05;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub baseline: SimulationRequest,
    pub intervention: SimulationRequest,
}

/// Classification of a single node across the two runs (spec §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    New,
    Resolved,
    DirectionFlip,
    Strengthened,
    Weakened,
    Unchanged,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComparedNode {
    pub node_id: NodeId,
    pub kind: ChangeKind,
    pub baseline_direction: Option<Direction>,
    pub intervention_direction: Option<Direction>,
    /// `intervention confidence - baseline confidence`; absent inputs
    /// are treated as confidence `0.0` for this computation.
    pub confidence_delta: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub baseline: SimulationResponse,
    pub intervention: SimulationResponse,
    pub changed_nodes: Vec<ComparedNode>,
}

pub fn compare(
    graph: &Graph,
    request: &ComparisonRequest,
    config: &EngineConfig,
) -> Result<ComparisonResponse, SimulationError> {
    let baseline = propagation::simulate(graph, &request.baseline, config)?;
    let intervention = propagation::simulate(graph, &request.intervention, config)?;

    let baseline_by_node: BTreeMap<NodeId, (Direction, f64)> = baseline
        .affected_nodes
        .iter()
        .map(|n| (n.node_id.clone(), (n.direction, n.confidence)))
        .collect();
    let intervention_by_node: BTreeMap<NodeId, (Direction, f64)> = intervention
        .affected_nodes
        .iter()
        .map(|n| (n.node_id.clone(), (n.direction, n.confidence)))
        .collect();

    let mut all_ids: Vec<NodeId> = baseline_by_node
        .keys()
        .chain(intervention_by_node.keys())
        .cloned()
        .collect();
    all_ids.sort();
    all_ids.dedup();

    let mut changed_nodes = Vec::with_capacity(all_ids.len());
    for node_id in all_ids {
        let base = baseline_by_node.get(&node_id).copied();
        let interv = intervention_by_node.get(&node_id).copied();
        let kind = classify(base, interv);
        changed_nodes.push(ComparedNode {
            node_id,
            kind,
            baseline_direction: base.map(|(d, _)| d),
            intervention_direction: interv.map(|(d, _)| d),
            confidence_delta: interv.map(|(_, c)| c).unwrap_or(0.0) - base.map(|(_, c)| c).unwrap_or(0.0),
        });
    }

    Ok(ComparisonResponse {
        baseline,
        intervention,
        changed_nodes,
    })
}

fn classify(base: Option<(Direction, f64)>, interv: Option<(Direction, f64)>) -> ChangeKind {
    match (base, interv) {
        (None, Some(_)) => ChangeKind::New,
        (Some(_), None) => ChangeKind::Resolved,
        (Some((bd, bc)), Some((id, ic))) => {
            if bd != id && is_opposite(bd, id) {
                return ChangeKind::DirectionFlip;
            }
            let delta = ic - bc;
            if delta >= CHANGE_THRESHOLD {
                ChangeKind::Strengthened
            } else if -delta >= CHANGE_THRESHOLD {
                ChangeKind::Weakened
            } else {
                ChangeKind::Unchanged
            }
        }
        (None, None) => ChangeKind::Unchanged,
    }
}

fn is_opposite(a: Direction, b: Direction) -> bool {
    matches!(
        (a, b),
        (Direction::Up, Direction::Down) | (Direction::Down, Direction::Up)
    )
}
