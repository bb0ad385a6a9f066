//! The context gate (spec §4.2): the only hook by which patient state
//! conditionally alters the graph.

use crate::model::{ContextMap, Edge};

/// Returns `true` iff, for every key in `edge.context`, the current
/// `context` supplies the same boolean value. Keys absent from `context`
/// are treated as `false` (spec §4.2).
pub fn is_live(edge: &Edge, context: &ContextMap) -> bool {
    edge.context
        .iter()
        .all(|(flag, required)| context.get(flag).copied().unwrap_or(false) == *required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Delay, NodeId, RelKind};
    use rustc_hash::FxHashMap;

    fn edge_with_context(context: ContextMap) -> Edge {
        Edge {
            source: NodeId::new("a"),
            target: NodeId::new("b"),
            rel: RelKind::Increases,
            weight: 0.5,
            delay: Delay::Immediate,
            context,
            priority: None,
            description: None,
        }
    }

    #[test]
    fn empty_context_requirement_is_always_live() {
        let edge = edge_with_context(FxHashMap::default());
        assert!(is_live(&edge, &FxHashMap::default()));
    }

    #[test]
    fn missing_flag_treated_as_false() {
        let mut required = FxHashMap::default();
        required.insert("ace_inhibitor".to_string(), false);
        let edge = edge_with_context(required);
        // context omits the flag entirely -> treated as false -> matches
        assert!(is_live(&edge, &FxHashMap::default()));
    }

    #[test]
    fn mismatched_flag_blocks_edge() {
        let mut required = FxHashMap::default();
        required.insert("ace_inhibitor".to_string(), true);
        let edge = edge_with_context(required);
        assert!(!is_live(&edge, &FxHashMap::default()));

        let mut ctx = FxHashMap::default();
        ctx.insert("ace_inhibitor".to_string(), true);
        assert!(is_live(&edge, &ctx));
    }
}
