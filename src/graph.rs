//! The canonical, immutable knowledge graph (spec §3).
//!
//! A [`Graph`] is produced once by [`crate::loader::load_pack`] and never
//! mutated in place; reloads construct a brand-new `Graph` and the
//! caller swaps it in atomically (spec §5). Edges are stored in an
//! arena (`Vec<Edge>`) indexed by `EdgeIdx`, with adjacency lists of
//! indices per source node — the same "arena + integer index" shape
//! design note §9 recommends for trace back-pointers, applied here to
//! avoid cloning edges into every adjacency list.

use rustc_hash::FxHashMap;

use crate::model::{Edge, Node, NodeId, Rule};

/// Index into [`Graph::edges`].
pub type EdgeIdx = usize;

/// The canonical knowledge graph: validated nodes, arena-allocated
/// edges, and a case-insensitive alias index built once at load time
/// (design note §9 — "alias lookup... should build a canonical mapping
/// once at load time" rather than the teacher's linear scan).
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: FxHashMap<NodeId, Node>,
    edges: Vec<Edge>,
    /// Outgoing edge indices per source node, in insertion order.
    outgoing: FxHashMap<NodeId, Vec<EdgeIdx>>,
    /// Incoming edge indices per target node, used to look up `requires`
    /// gating edges without a linear scan (spec §4.4).
    incoming: FxHashMap<NodeId, Vec<EdgeIdx>>,
    /// Normalized alias (lowercase, whitespace-collapsed) -> canonical id.
    alias_index: FxHashMap<String, NodeId>,
    /// Rules surviving loader validation (spec §4.3), evaluated once per
    /// simulation before propagation begins.
    rules: Vec<Rule>,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeId, Node>,
        edges: Vec<Edge>,
        alias_index: FxHashMap<String, NodeId>,
    ) -> Self {
        let mut outgoing: FxHashMap<NodeId, Vec<EdgeIdx>> = FxHashMap::default();
        let mut incoming: FxHashMap<NodeId, Vec<EdgeIdx>> = FxHashMap::default();
        for (idx, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(idx);
            incoming.entry(edge.target.clone()).or_default().push(idx);
        }
        Graph {
            nodes,
            edges,
            outgoing,
            incoming,
            alias_index,
            rules: Vec::new(),
        }
    }

    pub(crate) fn set_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx]
    }

    /// Outgoing edge indices from `id`, empty if the node has no
    /// outgoing edges or does not exist.
    pub fn outgoing(&self, id: &NodeId) -> &[EdgeIdx] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edge indices into `id`, empty if the node has no
    /// incoming edges or does not exist.
    pub fn incoming(&self, id: &NodeId) -> &[EdgeIdx] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a canonical id or an alias (case-insensitive,
    /// whitespace-collapsed) to the canonical [`NodeId`] (spec §3, §8
    /// round-trip invariant).
    pub fn resolve(&self, id_or_alias: &str) -> Option<NodeId> {
        if self.nodes.contains_key(&NodeId::new(id_or_alias)) {
            return Some(NodeId::new(id_or_alias));
        }
        self.alias_index.get(&normalize_alias(id_or_alias)).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Case-insensitive, whitespace-collapsed alias normalization (spec
/// §4.1 "Alias resolution is case-insensitive and whitespace-collapsed").
pub fn normalize_alias(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Domain, NodeType, StateType};

    fn sample_node(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            label: id.to_string(),
            domain: Domain::Cardio,
            subdomain: None,
            node_type: NodeType::Variable,
            state_type: StateType::Qualitative,
            unit: None,
            normal_range: None,
            aliases: vec!["Mean Arterial   Pressure".to_string()],
        }
    }

    #[test]
    fn alias_lookup_composed_with_canonical_lookup_is_identity() {
        let id = NodeId::new("cardio.hemodynamics.map");
        let mut nodes = FxHashMap::default();
        nodes.insert(id.clone(), sample_node(id.as_str()));
        let mut alias_index = FxHashMap::default();
        alias_index.insert(normalize_alias("Mean Arterial   Pressure"), id.clone());
        let graph = Graph::from_parts(nodes, vec![], alias_index);

        assert_eq!(graph.resolve("mean arterial pressure"), Some(id.clone()));
        assert_eq!(graph.resolve("  MEAN   ARTERIAL PRESSURE "), Some(id));
        assert_eq!(graph.resolve("nonexistent"), None);
    }
}
