//! Causal path reconstruction and macro-summarisation (spec §4.5).
//!
//! Paths are rebuilt by walking the `predecessor_edge` back-pointers
//! [`crate::propagation::NodeState::incoming_paths`] leaves behind —
//! an arena-indexed DAG, per design note §9, rather than owned parent
//! pointers.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::model::{Delay, NodeId, RelKind};
use crate::propagation::state::{Direction, IncomingPath, NodeState};

/// One reconstructed causal path from a seed to an affected node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceStep {
    pub path: Vec<NodeId>,
    pub steps: Vec<String>,
    pub confidence: f64,
}

/// The full set of reconstructed paths for one affected node, plus the
/// timescale derived from the highest-confidence path (feeds
/// `AffectedNode::dominant_timescale`).
#[derive(Clone, Debug, Default)]
pub struct BuiltTrace {
    pub steps: Vec<TraceStep>,
    pub dominant_timescale: Option<Delay>,
}

struct PathCandidate {
    nodes: Vec<NodeId>,
    steps: Vec<String>,
    confidence: f64,
    delays: Vec<Delay>,
}

/// Safety cap on the number of partial paths accumulated per node while
/// walking back-pointers, so a densely cross-linked graph cannot blow
/// up path enumeration before the top-k trim runs.
const MAX_CANDIDATES_PER_NODE: usize = 64;

/// Reconstruct up to `fanout` highest-confidence traces for every node
/// whose direction is not `unchanged`.
pub fn build_traces(
    graph: &Graph,
    states: &FxHashMap<NodeId, NodeState>,
    fanout: usize,
) -> FxHashMap<NodeId, BuiltTrace> {
    let mut memo: FxHashMap<(NodeId, Direction, u32), Vec<PathCandidate>> = FxHashMap::default();
    let mut out = FxHashMap::default();

    for (node_id, state) in states {
        if state.direction == Direction::Unchanged {
            continue;
        }
        let mut candidates = reconstruct(graph, states, node_id, state.direction, u32::MAX, &mut memo);

        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap()
                .then_with(|| a.nodes.len().cmp(&b.nodes.len()))
                .then_with(|| a.nodes.cmp(&b.nodes))
        });
        candidates.truncate(fanout);

        let dominant_timescale = candidates
            .first()
            .and_then(|c| c.delays.iter().max().copied());

        let steps = candidates
            .into_iter()
            .map(|c| TraceStep {
                path: c.nodes,
                steps: c.steps,
                confidence: c.confidence,
            })
            .collect();

        out.insert(node_id.clone(), BuiltTrace { steps, dominant_timescale });
    }

    out
}

/// Paths on `node_id` contributing to `direction` (mirrors
/// [`crate::propagation::engine`]'s own winning-group filter, but
/// parametrized since a recursive step asks about an ancestor's
/// direction at the time it fired, not its own final classification),
/// bounded to `tick <= tick_bound` so recursion always walks toward
/// strictly earlier ticks.
fn matching_paths(
    state: &NodeState,
    direction: Direction,
    tick_bound: u32,
) -> impl Iterator<Item = &IncomingPath> {
    state.incoming_paths.iter().filter(move |p| {
        p.tick <= tick_bound
            && match direction {
                Direction::Unknown => matches!(p.direction, Direction::Up | Direction::Down),
                other => p.direction == other,
            }
    })
}

/// Recursively walk back-pointers to a seed, memoized on
/// `(node, direction, tick_bound)` since the same prefix is shared by
/// every downstream path through a hub node. Seed paths
/// (`predecessor_edge: None`) are the base case; every other path
/// recurses into its `source` one hop earlier, so the recursion always
/// terminates within `max_hops` steps regardless of cycles in the
/// underlying graph.
fn reconstruct<'a>(
    graph: &Graph,
    states: &FxHashMap<NodeId, NodeState>,
    node_id: &NodeId,
    direction: Direction,
    tick_bound: u32,
    memo: &'a mut FxHashMap<(NodeId, Direction, u32), Vec<PathCandidate>>,
) -> Vec<PathCandidate> {
    let key = (node_id.clone(), direction, tick_bound);
    if let Some(cached) = memo.get(&key) {
        return clone_candidates(cached);
    }

    let mut candidates = Vec::new();
    'paths: {
        let Some(state) = states.get(node_id) else {
            break 'paths;
        };
        for p in matching_paths(state, direction, tick_bound) {
            if p.predecessor_edge.is_none() {
                candidates.push(PathCandidate {
                    nodes: vec![node_id.clone()],
                    steps: Vec::new(),
                    confidence: 1.0,
                    delays: Vec::new(),
                });
                if candidates.len() >= MAX_CANDIDATES_PER_NODE {
                    break 'paths;
                }
                continue;
            }

            let sub = reconstruct(
                graph,
                states,
                &p.source,
                p.source_direction,
                p.tick.saturating_sub(1),
                memo,
            );
            for base in &sub {
                let mut nodes = base.nodes.clone();
                nodes.push(node_id.clone());
                let mut steps = base.steps.clone();
                let mut delays = base.delays.clone();
                let mut confidence = base.confidence;
                if let Some(edge_idx) = p.predecessor_edge {
                    let edge = graph.edge(edge_idx);
                    steps.push(render_step(graph, edge));
                    delays.push(edge.delay);
                    confidence *= edge.weight;
                }
                candidates.push(PathCandidate { nodes, steps, confidence, delays });
                if candidates.len() >= MAX_CANDIDATES_PER_NODE {
                    break 'paths;
                }
            }
        }
    }

    memo.insert(key, clone_candidates(&candidates));
    candidates
}

fn clone_candidates(candidates: &[PathCandidate]) -> Vec<PathCandidate> {
    candidates
        .iter()
        .map(|c| PathCandidate {
            nodes: c.nodes.clone(),
            steps: c.steps.clone(),
            confidence: c.confidence,
            delays: c.delays.clone(),
        })
        .collect()
}

fn render_step(graph: &Graph, edge: &crate::model::Edge) -> String {
    let arrow = match edge.rel {
        RelKind::Increases => "\u{2191}",
        RelKind::Decreases => "\u{2193}",
        RelKind::ConvertsTo | RelKind::Requires => "\u{2192}",
    };
    let src_label = graph
        .node(&edge.source)
        .map(|n| n.label.as_str())
        .unwrap_or(edge.source.as_str());
    let tgt_label = graph
        .node(&edge.target)
        .map(|n| n.label.as_str())
        .unwrap_or(edge.target.as_str());
    match &edge.description {
        Some(desc) => format!("{src_label} {arrow} {tgt_label} ({desc})"),
        None => format!("{src_label} {arrow} {tgt_label}"),
    }
}

/// Templated clinical-phrase summaries over a reconstructed path (spec
/// §4.5). An empty match returns `None`; implementers are explicitly
/// allowed to ship no templates at all, so this is deliberately small.
pub fn macro_summary(path: &[NodeId]) -> Option<String> {
    let contains = |needle: &str| path.iter().any(|n| n.as_str() == needle);

    if contains("renal.raas.renin") && contains("cardio.mechanics.preload") {
        return Some("RAAS activation raising preload".to_string());
    }
    if contains("neuro.ans.sympathetic_tone") && contains("cardio.hemodynamics.heart_rate") {
        return Some("Sympathetic activation raising heart rate".to_string());
    }
    if contains("acidbase.blood.h_concentration") && contains("acidbase.blood.ph") {
        return Some("Rising hydrogen ion concentration depressing pH".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Domain, Edge, Node, NodeType, Op, Perturbation, StateType};
    use crate::propagation::engine;
    use crate::propagation::options::SimulationOptions;
    use crate::config::EngineConfig;
    use crate::model::ContextMap;

    fn node(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            label: format!("Label({id})"),
            domain: Domain::Cardio,
            subdomain: None,
            node_type: NodeType::Variable,
            state_type: StateType::Qualitative,
            unit: None,
            normal_range: None,
            aliases: vec![],
        }
    }

    #[test]
    fn single_hop_trace_has_one_step_and_product_confidence() {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodeId::new("a"), node("a"));
        nodes.insert(NodeId::new("b"), node("b"));
        let edge = Edge {
            source: NodeId::new("a"),
            target: NodeId::new("b"),
            rel: RelKind::Increases,
            weight: 0.7,
            delay: Delay::Minutes,
            context: ContextMap::default(),
            priority: None,
            description: None,
        };
        let graph = Graph::from_parts(nodes, vec![edge], FxHashMap::default());
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let states = engine::run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        let traces = build_traces(&graph, &states, 5);
        let b_trace = &traces[&NodeId::new("b")];
        assert_eq!(b_trace.steps.len(), 1);
        let step = &b_trace.steps[0];
        assert_eq!(step.path, vec![NodeId::new("a"), NodeId::new("b")]);
        assert!((step.confidence - 0.7).abs() < 1e-9);
        assert_eq!(b_trace.dominant_timescale, Some(Delay::Minutes));
    }

    #[test]
    fn three_hop_trace_walks_back_through_every_edge() {
        let mut nodes = FxHashMap::default();
        for id in ["a", "b", "c", "d"] {
            nodes.insert(NodeId::new(id), node(id));
        }
        let edges = vec![
            Edge {
                source: NodeId::new("a"),
                target: NodeId::new("b"),
                rel: RelKind::Increases,
                weight: 0.9,
                delay: Delay::Minutes,
                context: ContextMap::default(),
                priority: None,
                description: None,
            },
            Edge {
                source: NodeId::new("b"),
                target: NodeId::new("c"),
                rel: RelKind::Increases,
                weight: 0.8,
                delay: Delay::Hours,
                context: ContextMap::default(),
                priority: None,
                description: None,
            },
            Edge {
                source: NodeId::new("c"),
                target: NodeId::new("d"),
                rel: RelKind::Decreases,
                weight: 0.5,
                delay: Delay::Days,
                context: ContextMap::default(),
                priority: None,
                description: None,
            },
        ];
        let graph = Graph::from_parts(nodes, edges, FxHashMap::default());
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let states = engine::run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions { max_hops: 5, ..SimulationOptions::default() },
            &EngineConfig::default(),
        );
        let traces = build_traces(&graph, &states, 5);

        let d_trace = &traces[&NodeId::new("d")];
        assert_eq!(d_trace.steps.len(), 1);
        let step = &d_trace.steps[0];
        assert_eq!(
            step.path,
            vec![NodeId::new("a"), NodeId::new("b"), NodeId::new("c"), NodeId::new("d")]
        );
        assert_eq!(step.steps.len(), 3);
        assert!((step.confidence - 0.9 * 0.8 * 0.5).abs() < 1e-9);
        assert_eq!(d_trace.dominant_timescale, Some(Delay::Days));

        let c_trace = &traces[&NodeId::new("c")];
        assert_eq!(c_trace.steps[0].path, vec![NodeId::new("a"), NodeId::new("b"), NodeId::new("c")]);
    }

    #[test]
    fn macro_summary_matches_raas_template() {
        let path = vec![
            NodeId::new("cardio.hemodynamics.map"),
            NodeId::new("renal.raas.renin"),
            NodeId::new("cardio.mechanics.preload"),
        ];
        assert!(macro_summary(&path).is_some());
    }

    #[test]
    fn macro_summary_none_for_unmatched_path() {
        let path = vec![NodeId::new("a"), NodeId::new("b")];
        assert!(macro_summary(&path).is_none());
    }
}
