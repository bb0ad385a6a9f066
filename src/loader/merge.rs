//! Merges a sequence of [`PackDocument`]s into a single canonical
//! [`Graph`] (spec §4.1).

use rustc_hash::FxHashMap;

use crate::error::{Diagnostic, LoadError};
use crate::graph::{normalize_alias, Graph};
use crate::model::{ContextMap, Node, NodeId, RelKind, Rule};
use crate::rules::parse_when;

use super::document::PackDocument;

/// Load and merge documents into a canonical graph, plus non-fatal
/// diagnostics observed along the way. Returns the first fatal error
/// encountered; on fatal error the caller must keep its previously
/// loaded graph active (spec §7).
#[tracing::instrument(skip(docs), fields(doc_count = docs.len()), err)]
pub fn load_pack(docs: &[PackDocument]) -> Result<(Graph, Vec<Diagnostic>), LoadError> {
    let mut diagnostics = Vec::new();

    let (nodes, alias_index) = merge_nodes(docs)?;
    let edges = merge_edges(docs, &nodes, &mut diagnostics)?;
    let rules = filter_rules(docs, &nodes, &mut diagnostics);

    let mut graph = Graph::from_parts(nodes, edges, alias_index);
    graph.set_rules(rules);
    Ok((graph, diagnostics))
}

fn merge_nodes(
    docs: &[PackDocument],
) -> Result<(FxHashMap<NodeId, Node>, FxHashMap<String, NodeId>), LoadError> {
    let mut nodes: FxHashMap<NodeId, Node> = FxHashMap::default();
    let mut alias_index: FxHashMap<String, NodeId> = FxHashMap::default();

    for (doc_index, doc) in docs.iter().enumerate() {
        for incoming in &doc.nodes {
            match nodes.get_mut(&incoming.id) {
                Some(existing) => {
                    if !existing.compatible_with(incoming) {
                        return Err(LoadError::DuplicateNodeConflict {
                            doc_index,
                            id: incoming.id.to_string(),
                        });
                    }
                    for alias in &incoming.aliases {
                        if !existing.aliases.iter().any(|a| a == alias) {
                            existing.aliases.push(alias.clone());
                        }
                    }
                    existing.unit = existing.unit.clone().or_else(|| incoming.unit.clone());
                    existing.normal_range = existing.normal_range.or(incoming.normal_range);
                    existing.subdomain = existing
                        .subdomain
                        .clone()
                        .or_else(|| incoming.subdomain.clone());
                }
                None => {
                    nodes.insert(incoming.id.clone(), incoming.clone());
                }
            }

            for alias in &incoming.aliases {
                let key = normalize_alias(alias);
                match alias_index.get(&key) {
                    Some(existing_id) if *existing_id != incoming.id => {
                        return Err(LoadError::DuplicateAlias {
                            doc_index,
                            alias: alias.clone(),
                            existing: existing_id.to_string(),
                            id: incoming.id.to_string(),
                        });
                    }
                    _ => {
                        alias_index.insert(key, incoming.id.clone());
                    }
                }
            }
        }
    }

    Ok((nodes, alias_index))
}

fn context_key(context: &ContextMap) -> String {
    let mut pairs: Vec<(&String, &bool)> = context.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn merge_edges(
    docs: &[PackDocument],
    nodes: &FxHashMap<NodeId, Node>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<crate::model::Edge>, LoadError> {
    let mut merged: Vec<crate::model::Edge> = Vec::new();
    let mut index_by_key: FxHashMap<(NodeId, NodeId, RelKind, String), usize> = FxHashMap::default();

    for (doc_index, doc) in docs.iter().enumerate() {
        for edge in &doc.edges {
            if !nodes.contains_key(&edge.source) {
                return Err(LoadError::MissingEndpoint {
                    doc_index,
                    source: edge.source.to_string(),
                    target: edge.target.to_string(),
                    rel: edge.rel.to_string(),
                    missing: edge.source.to_string(),
                });
            }
            if !nodes.contains_key(&edge.target) {
                return Err(LoadError::MissingEndpoint {
                    doc_index,
                    source: edge.source.to_string(),
                    target: edge.target.to_string(),
                    rel: edge.rel.to_string(),
                    missing: edge.target.to_string(),
                });
            }
            if !edge.has_valid_weight() {
                return Err(LoadError::MalformedWeight {
                    doc_index,
                    source: edge.source.to_string(),
                    target: edge.target.to_string(),
                    rel: edge.rel.to_string(),
                    weight: edge.weight,
                });
            }
            if edge.source == edge.target && edge.rel.propagates_direction() {
                return Err(LoadError::SelfLoop {
                    doc_index,
                    source: edge.source.to_string(),
                    target: edge.target.to_string(),
                    rel: edge.rel.to_string(),
                });
            }

            let key = (
                edge.source.clone(),
                edge.target.clone(),
                edge.rel,
                context_key(&edge.context),
            );
            match index_by_key.get(&key) {
                Some(&idx) => {
                    let existing = &mut merged[idx];
                    existing.weight = edge.weight;
                    existing.description = match (&existing.description, &edge.description) {
                        (Some(a), Some(b)) => Some(format!("{a}; {b}")),
                        (Some(a), None) => Some(a.clone()),
                        (None, Some(b)) => Some(b.clone()),
                        (None, None) => None,
                    };
                    diagnostics.push(Diagnostic::EdgeMerged {
                        source: edge.source.to_string(),
                        target: edge.target.to_string(),
                        rel: edge.rel.to_string(),
                    });
                }
                None => {
                    index_by_key.insert(key, merged.len());
                    merged.push(edge.clone());
                }
            }
        }
    }

    Ok(merged)
}

fn filter_rules(
    docs: &[PackDocument],
    nodes: &FxHashMap<NodeId, Node>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Rule> {
    let mut rules = Vec::new();
    for doc in docs {
        for rule in &doc.rules {
            let expr = match parse_when(&rule.when) {
                Ok(expr) => expr,
                Err(e) => {
                    diagnostics.push(Diagnostic::RuleDroppedParseError {
                        rule_id: rule.id.clone(),
                        reason: e.0,
                    });
                    continue;
                }
            };

            let mut unknown = None;
            collect_unknown_node(&expr, nodes, &mut unknown);
            if unknown.is_none() {
                for node_id in rule.then.keys() {
                    if !nodes.contains_key(node_id) {
                        unknown = Some(node_id.to_string());
                        break;
                    }
                }
            }

            if let Some(node_id) = unknown {
                diagnostics.push(Diagnostic::RuleDroppedUnknownNode {
                    rule_id: rule.id.clone(),
                    node_id,
                });
                continue;
            }

            rules.push(rule.clone());
        }
    }
    rules
}

fn collect_unknown_node(
    expr: &crate::rules::WhenExpr,
    nodes: &FxHashMap<NodeId, Node>,
    found: &mut Option<String>,
) {
    use crate::rules::WhenExpr::*;
    if found.is_some() {
        return;
    }
    match expr {
        Literal(_) | Context(_) => {}
        SeedDirection { node, .. } => {
            if !nodes.contains_key(node) {
                *found = Some(node.to_string());
            }
        }
        Not(inner) => collect_unknown_node(inner, nodes, found),
        And(l, r) | Or(l, r) => {
            collect_unknown_node(l, nodes, found);
            collect_unknown_node(r, nodes, found);
        }
    }
}
