//! The Propagation Engine (spec §4.4): the system's intellectual core.
//!
//! [`simulate`] is the one pure entry point the surrounding HTTP or CLI
//! collaborator calls: `simulate(graph, request) -> response`, with no
//! suspension points and no interpretation of `dim_unaffected` (spec
//! §5, §6).

pub mod engine;
pub mod options;
pub mod state;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::EngineConfig;
use crate::error::SimulationError;
use crate::graph::Graph;
use crate::model::{ContextMap, Delay, NodeId, Perturbation};
use crate::rules;
use crate::trace::{self, TraceStep};

pub use options::{SimulationOptions, TimeWindow};
pub use state::{Direction, Magnitude, NodeState};

/// A simulation request (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub perturbations: Vec<Perturbation>,
    #[serde(default)]
    pub context: ContextMap,
    #[serde(default)]
    pub options: SimulationOptions,
}

/// One node whose direction is not `unchanged` after propagation
/// (spec §3 `AffectedNode`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AffectedNode {
    pub node_id: NodeId,
    pub direction: Direction,
    pub magnitude: Magnitude,
    pub confidence: f64,
    pub dominant_timescale: Option<Delay>,
    pub first_tick: u32,
}

/// A completed simulation (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub affected_nodes: Vec<AffectedNode>,
    pub traces: BTreeMap<NodeId, Vec<TraceStep>>,
    pub max_ticks: u32,
}

/// Run one propagation to a fixed point (spec §4.4-§4.5). The only
/// fallible step is seed resolution and option validation; once
/// underway, nothing inside the engine is recoverable by partial
/// results (spec §7).
#[instrument(skip(graph, request, config), err)]
pub fn simulate(
    graph: &Graph,
    request: &SimulationRequest,
    config: &EngineConfig,
) -> Result<SimulationResponse, SimulationError> {
    request.options.validate()?;

    let mut resolved = Vec::with_capacity(request.perturbations.len());
    for p in &request.perturbations {
        let node_id = graph
            .resolve(p.node_id.as_str())
            .ok_or_else(|| SimulationError::UnknownNode(p.node_id.as_str().to_string()))?;
        resolved.push(Perturbation { node_id, op: p.op });
    }

    let effective = rules::effective_perturbations(graph, &resolved, &request.context, graph.rules());
    let states = engine::run(graph, &effective, &request.context, &request.options, config);
    let built_traces = trace::build_traces(graph, &states, config.default_trace_fanout);

    let mut affected_nodes: Vec<AffectedNode> = states
        .iter()
        .filter(|(_, state)| state.direction != Direction::Unchanged)
        .map(|(node_id, state)| AffectedNode {
            node_id: node_id.clone(),
            direction: state.direction,
            magnitude: Magnitude::from_confidence(state.confidence),
            confidence: state.confidence,
            dominant_timescale: built_traces.get(node_id).and_then(|t| t.dominant_timescale),
            first_tick: state.first_tick.unwrap_or(0),
        })
        .collect();
    affected_nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));

    let max_ticks = affected_nodes.iter().map(|a| a.first_tick).max().unwrap_or(0);

    let traces = built_traces
        .into_iter()
        .map(|(node_id, built)| (node_id, built.steps))
        .collect();

    Ok(SimulationResponse {
        affected_nodes,
        traces,
        max_ticks,
    })
}
