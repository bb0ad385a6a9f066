//! The core relaxation loop (spec §4.4).
//!
//! Every hop strictly increases `tick`, and the queue only ever holds
//! ticks in `0..=max_hops`, so the run terminates in at most `max_hops`
//! layers regardless of cycles in the graph (spec §9 "cycles do not
//! terminate traversal because every path is bounded by max_hops").

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::context;
use crate::graph::Graph;
use crate::model::{ContextMap, NodeId, Perturbation, RelKind};

use super::options::SimulationOptions;
use super::state::{Direction, IncomingPath, NodeState};

/// Floating-point slack below which a merged confidence is not
/// considered a "strict increase" (spec §4.4 termination discipline).
const STRICT_INCREASE_EPS: f64 = 1e-12;

/// Run the frontier relaxation to a fixed point and return the final
/// per-node state map, keyed by node id.
pub fn run(
    graph: &Graph,
    effective: &[Perturbation],
    context: &ContextMap,
    options: &SimulationOptions,
    config: &EngineConfig,
) -> FxHashMap<NodeId, NodeState> {
    let mut states: FxHashMap<NodeId, NodeState> = FxHashMap::default();
    let mut queue: BTreeSet<(u32, NodeId)> = BTreeSet::new();

    for seed in effective {
        seed_node(&mut states, seed, graph, config);
        queue.insert((0, seed.node_id.clone()));
    }

    while let Some((tick, node_id)) = pop_lowest(&mut queue) {
        if tick >= options.max_hops {
            continue;
        }
        let Some(snapshot) = states.get(&node_id) else {
            continue;
        };
        if snapshot.blocked {
            continue;
        }
        let source_direction = snapshot.direction;
        let source_confidence = snapshot.confidence;
        if !matches!(source_direction, Direction::Up | Direction::Down) {
            continue;
        }

        for &edge_idx in graph.outgoing(&node_id) {
            let edge = graph.edge(edge_idx);
            if !edge.rel.propagates_direction() {
                continue;
            }
            if !context::is_live(edge, context) {
                continue;
            }
            if edge.rel == RelKind::Increases
                && is_suppressed_by_requires(graph, &edge.target, context, &states)
            {
                continue;
            }

            let next_direction = match edge.rel {
                RelKind::Increases => source_direction,
                RelKind::Decreases => source_direction.flip(),
                RelKind::ConvertsTo | RelKind::Requires => unreachable!("filtered above"),
            };
            let candidate_confidence = source_confidence * edge.weight;
            if candidate_confidence < options.min_confidence {
                continue;
            }
            if !options.time_window.admits(edge.delay) {
                continue;
            }
            let next_tick = tick + 1;
            if next_tick > options.max_hops {
                continue;
            }

            let path = IncomingPath {
                predecessor_edge: Some(edge_idx),
                source: node_id.clone(),
                source_confidence,
                source_direction,
                direction: next_direction,
                tick: next_tick,
            };
            let increased = merge_candidate(
                &mut states,
                &edge.target,
                next_direction,
                candidate_confidence,
                path,
                config,
            );
            if increased {
                queue.insert((next_tick, edge.target.clone()));
            }
        }
    }

    states
}

fn pop_lowest(queue: &mut BTreeSet<(u32, NodeId)>) -> Option<(u32, NodeId)> {
    let first = queue.iter().next().cloned()?;
    queue.remove(&first);
    Some(first)
}

fn seed_node(
    states: &mut FxHashMap<NodeId, NodeState>,
    seed: &Perturbation,
    graph: &Graph,
    config: &EngineConfig,
) {
    let midpoint = graph
        .node(&seed.node_id)
        .and_then(|n| n.normal_range)
        .map(|r| r.midpoint())
        .unwrap_or(0.0);
    let direction = if seed.op.implies_up(midpoint) {
        Direction::Up
    } else {
        Direction::Down
    };

    let state = states.entry(seed.node_id.clone()).or_default();
    let path = IncomingPath {
        predecessor_edge: None,
        source: seed.node_id.clone(),
        source_confidence: 1.0,
        source_direction: direction,
        direction,
        tick: 0,
    };
    match direction {
        Direction::Up => state.up_confidence = Some(1.0),
        Direction::Down => state.down_confidence = Some(1.0),
        Direction::Unknown | Direction::Unchanged => unreachable!("seeds are always up or down"),
    }
    state.incoming_paths.push(path);
    state.blocked = state.blocked || seed.op.blocks_outgoing();
    finalize_direction(state, config);
}

/// Probabilistic-OR merge of a new candidate into its direction group
/// (spec §4.4 steps 1-2). Returns whether the group's confidence
/// strictly increased; the caller re-enqueues the target only then,
/// bounding revisits (spec §4.4 "Termination").
fn merge_candidate(
    states: &mut FxHashMap<NodeId, NodeState>,
    target: &NodeId,
    direction: Direction,
    candidate_confidence: f64,
    path: IncomingPath,
    config: &EngineConfig,
) -> bool {
    let state = states.entry(target.clone()).or_default();
    let slot = match direction {
        Direction::Up => &mut state.up_confidence,
        Direction::Down => &mut state.down_confidence,
        Direction::Unknown | Direction::Unchanged => {
            unreachable!("edge candidates only ever carry up/down direction")
        }
    };
    let merged = match *slot {
        Some(existing) => 1.0 - (1.0 - existing) * (1.0 - candidate_confidence),
        None => candidate_confidence,
    };
    let increased = match *slot {
        Some(existing) => merged > existing + STRICT_INCREASE_EPS,
        None => true,
    };
    if !increased {
        return false;
    }
    *slot = Some(merged);
    state.incoming_paths.push(path);
    finalize_direction(state, config);
    true
}

/// Apply the conflict rule (spec §4.4 steps 3-5) and recompute
/// `first_tick` from whichever direction group(s) end up winning.
fn finalize_direction(state: &mut NodeState, config: &EngineConfig) {
    state.direction = match (state.up_confidence, state.down_confidence) {
        (Some(u), Some(d)) => {
            if (u - d).abs() <= config.unknown_epsilon {
                state.confidence = u.max(d);
                Direction::Unknown
            } else if u > d {
                state.confidence = u;
                Direction::Up
            } else {
                state.confidence = d;
                Direction::Down
            }
        }
        (Some(u), None) => {
            state.confidence = u;
            Direction::Up
        }
        (None, Some(d)) => {
            state.confidence = d;
            Direction::Down
        }
        (None, None) => {
            state.confidence = 0.0;
            Direction::Unchanged
        }
    };
    state.first_tick = winning_paths(state).map(|p| p.tick).min();
}

fn winning_paths(state: &NodeState) -> Box<dyn Iterator<Item = &IncomingPath> + '_> {
    match state.direction {
        Direction::Up => Box::new(
            state.incoming_paths.iter().filter(|p| p.direction == Direction::Up),
        ),
        Direction::Down => Box::new(
            state.incoming_paths.iter().filter(|p| p.direction == Direction::Down),
        ),
        Direction::Unknown => Box::new(
            state
                .incoming_paths
                .iter()
                .filter(|p| matches!(p.direction, Direction::Up | Direction::Down)),
        ),
        Direction::Unchanged => Box::new(std::iter::empty()),
    }
}

/// `requires` gating (spec §4.4): an `increases` edge into `target` is
/// suppressed if any live `requires` edge into `target` has a source
/// that is not currently `up`.
fn is_suppressed_by_requires(
    graph: &Graph,
    target: &NodeId,
    context: &ContextMap,
    states: &FxHashMap<NodeId, NodeState>,
) -> bool {
    graph.incoming(target).iter().any(|&idx| {
        let edge = graph.edge(idx);
        edge.rel == RelKind::Requires
            && context::is_live(edge, context)
            && !matches!(
                states.get(&edge.source).map(|s| s.direction),
                Some(Direction::Up)
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Delay, Domain, Edge, Node, NodeType, Op, StateType};

    fn node(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            label: id.to_string(),
            domain: Domain::Cardio,
            subdomain: None,
            node_type: NodeType::Variable,
            state_type: StateType::Qualitative,
            unit: None,
            normal_range: None,
            aliases: vec![],
        }
    }

    fn edge(source: &str, target: &str, rel: RelKind, weight: f64) -> Edge {
        Edge {
            source: NodeId::new(source),
            target: NodeId::new(target),
            rel,
            weight,
            delay: Delay::Immediate,
            context: ContextMap::default(),
            priority: None,
            description: None,
        }
    }

    fn chain_graph(rel: RelKind, weight: f64) -> Graph {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodeId::new("a"), node("a"));
        nodes.insert(NodeId::new("b"), node("b"));
        Graph::from_parts(nodes, vec![edge("a", "b", rel, weight)], FxHashMap::default())
    }

    #[test]
    fn increases_edge_preserves_direction() {
        let graph = chain_graph(RelKind::Increases, 0.8);
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let states = run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        let b = &states[&NodeId::new("b")];
        assert_eq!(b.direction, Direction::Up);
        assert!((b.confidence - 0.8).abs() < 1e-9);
        assert_eq!(b.first_tick, Some(1));
    }

    #[test]
    fn decreases_edge_flips_direction() {
        let graph = chain_graph(RelKind::Decreases, 0.6);
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let states = run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        assert_eq!(states[&NodeId::new("b")].direction, Direction::Down);
    }

    #[test]
    fn max_hops_zero_yields_only_seeds() {
        let graph = chain_graph(RelKind::Increases, 0.8);
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let mut options = SimulationOptions::default();
        options.max_hops = 0;
        let states = run(&graph, &seeds, &ContextMap::default(), &options, &EngineConfig::default());
        assert!(!states.contains_key(&NodeId::new("b")));
        assert_eq!(states[&NodeId::new("a")].direction, Direction::Up);
    }

    #[test]
    fn block_suppresses_outgoing_propagation() {
        let graph = chain_graph(RelKind::Increases, 0.8);
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Block }];
        let states = run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        assert!(!states.contains_key(&NodeId::new("b")));
    }

    #[test]
    fn requires_edge_suppresses_increases_when_source_not_up() {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodeId::new("a"), node("a"));
        nodes.insert(NodeId::new("b"), node("b"));
        nodes.insert(NodeId::new("gate"), node("gate"));
        let edges = vec![
            edge("a", "b", RelKind::Increases, 0.9),
            edge("gate", "b", RelKind::Requires, 1.0),
        ];
        let graph = Graph::from_parts(nodes, edges, FxHashMap::default());
        let seeds = vec![Perturbation { node_id: NodeId::new("a"), op: Op::Increase }];
        let states = run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        assert!(!states.contains_key(&NodeId::new("b")));
    }

    #[test]
    fn conflicting_directions_within_epsilon_become_unknown() {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodeId::new("a"), node("a"));
        nodes.insert(NodeId::new("c"), node("c"));
        nodes.insert(NodeId::new("b"), node("b"));
        let edges = vec![
            edge("a", "b", RelKind::Increases, 0.5),
            edge("c", "b", RelKind::Decreases, 0.52),
        ];
        let graph = Graph::from_parts(nodes, edges, FxHashMap::default());
        let seeds = vec![
            Perturbation { node_id: NodeId::new("a"), op: Op::Increase },
            Perturbation { node_id: NodeId::new("c"), op: Op::Increase },
        ];
        let states = run(
            &graph,
            &seeds,
            &ContextMap::default(),
            &SimulationOptions::default(),
            &EngineConfig::default(),
        );
        assert_eq!(states[&NodeId::new("b")].direction, Direction::Unknown);
    }
}
