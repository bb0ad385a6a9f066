//! Pure evaluation of [`WhenExpr`] and resolution of the effective
//! perturbation set (spec §4.3).

use std::collections::HashMap;

use crate::graph::Graph;
use crate::model::{ContextMap, NodeId, Op, Perturbation, Rule};

use super::WhenExpr;

/// Everything [`evaluate`] needs to resolve an atom.
pub struct EvalContext<'a> {
    pub context: &'a ContextMap,
    /// Direction of each node currently acting as a user-supplied seed,
    /// `true` = up, `false` = down. Populated from perturbations, not
    /// from a prior propagation run — the grammar's `.up`/`.down` atoms
    /// only ever see the initial seeds (spec §4.3).
    pub seed_directions: &'a HashMap<NodeId, bool>,
}

/// Evaluate a parsed `when` expression. Total and pure: context keys
/// absent from `ctx.context` are `false` (same rule as the edge context
/// gate, spec §4.2), and nodes absent from `seed_directions` make both
/// `.up` and `.down` atoms false.
pub fn evaluate(expr: &WhenExpr, ctx: &EvalContext) -> bool {
    match expr {
        WhenExpr::Literal(b) => *b,
        WhenExpr::Context(flag) => *ctx.context.get(flag).unwrap_or(&false),
        WhenExpr::SeedDirection { node, up } => {
            ctx.seed_directions.get(node) == Some(up)
        }
        WhenExpr::Not(inner) => !evaluate(inner, ctx),
        WhenExpr::And(l, r) => evaluate(l, ctx) && evaluate(r, ctx),
        WhenExpr::Or(l, r) => evaluate(l, ctx) || evaluate(r, ctx),
    }
}

fn op_direction(graph: &Graph, node: &NodeId, op: &Op) -> bool {
    let midpoint = graph
        .node(node)
        .and_then(|n| n.normal_range)
        .map(|r| r.midpoint())
        .unwrap_or(0.0);
    op.implies_up(midpoint)
}

/// Fold rules and user perturbations into the final set of effective
/// perturbations that seed propagation.
///
/// Rules are evaluated in ascending `id` order for determinism; the
/// first rule whose `then` clause targets a given node wins over any
/// later-firing rule targeting the same node (rules are authored, so
/// this is a simple, documented precedence rather than an error). User
/// perturbations always take precedence over any rule (spec §4.3).
pub fn effective_perturbations(
    graph: &Graph,
    user: &[Perturbation],
    context: &ContextMap,
    rules: &[Rule],
) -> Vec<Perturbation> {
    let seed_directions: HashMap<NodeId, bool> = user
        .iter()
        .map(|p| (p.node_id.clone(), op_direction(graph, &p.node_id, &p.op)))
        .collect();

    let eval_ctx = EvalContext {
        context,
        seed_directions: &seed_directions,
    };

    let mut sorted_rules: Vec<&Rule> = rules.iter().collect();
    sorted_rules.sort_by(|a, b| a.id.cmp(&b.id));

    let mut by_node: HashMap<NodeId, Op> = HashMap::new();
    for rule in sorted_rules {
        let Ok(expr) = super::parse_when(&rule.when) else {
            continue;
        };
        if !evaluate(&expr, &eval_ctx) {
            continue;
        }
        for (node_id, op) in &rule.then {
            by_node.entry(node_id.clone()).or_insert(*op);
        }
    }

    // User perturbations take precedence on conflict.
    for p in user {
        by_node.insert(p.node_id.clone(), p.op);
    }

    by_node
        .into_iter()
        .map(|(node_id, op)| Perturbation { node_id, op })
        .collect()
}
