//! Core data model: nodes, edges, rules, and perturbations.
//!
//! These are the canonical, validated domain types produced by
//! [`crate::loader`] and consumed by [`crate::propagation`]. None of them
//! carry run-specific state (direction, confidence) — that lives in
//! [`crate::propagation::NodeState`], keyed by [`NodeId`], so the graph
//! itself stays immutable between simulation runs.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A globally-unique, dotted node identifier, e.g. `cardio.hemodynamics.map`.
///
/// Newtype over `String` so node identity can't be confused with a human
/// label or an alias at the type level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Closed set of physiological domains. No semantic effect on propagation
/// (see GLOSSARY "Domain / subdomain") — used for organisation and UI
/// grouping by the external collaborator only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Cardio,
    Pulm,
    Renal,
    Acidbase,
    Neuro,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::Cardio => "cardio",
            Domain::Pulm => "pulm",
            Domain::Renal => "renal",
            Domain::Acidbase => "acidbase",
            Domain::Neuro => "neuro",
        };
        write!(f, "{s}")
    }
}

/// Entity kind. Informational; does not gate traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Hormone,
    Variable,
    Organ,
    Vessel,
    Process,
}

/// Whether a node's normal-range semantics are qualitative or numeric.
///
/// Only `Numeric` nodes give [`Op::Set`] a midpoint to compare against;
/// see [`NormalRange::midpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Qualitative,
    Numeric,
}

/// Inclusive normal range for a numeric node, used to classify `set <v>`
/// perturbations relative to the midpoint (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// A physiological entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub domain: Domain,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub state_type: StateType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub normal_range: Option<NormalRange>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Node {
    /// Whether this node and `other` are compatible duplicate declarations
    /// (spec §4.1: same domain, type, state_type).
    pub fn compatible_with(&self, other: &Node) -> bool {
        self.domain == other.domain
            && self.node_type == other.node_type
            && self.state_type == other.state_type
    }
}

/// Signed causal relation kinds. `increases`/`decreases` carry direction
/// through propagation; `converts_to`/`requires` do not (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelKind {
    Increases,
    Decreases,
    ConvertsTo,
    Requires,
}

impl RelKind {
    /// Whether this relation carries direction through the frontier.
    pub fn propagates_direction(&self) -> bool {
        matches!(self, RelKind::Increases | RelKind::Decreases)
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelKind::Increases => "increases",
            RelKind::Decreases => "decreases",
            RelKind::ConvertsTo => "converts_to",
            RelKind::Requires => "requires",
        };
        write!(f, "{s}")
    }
}

/// Coarse timescale bucket. Ordered `Immediate < Minutes < Hours < Days`
/// so options like `time_window` can filter by "at most this slow".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delay {
    Immediate,
    Minutes,
    Hours,
    Days,
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Delay::Immediate => "immediate",
            Delay::Minutes => "minutes",
            Delay::Hours => "hours",
            Delay::Days => "days",
        };
        write!(f, "{s}")
    }
}

/// A patient-context mapping from flag name to required boolean value,
/// used both by [`crate::context`] edge gating and by [`crate::rules`]
/// `ctx.<flag>` atoms.
pub type ContextMap = FxHashMap<String, bool>;

/// A signed causal edge between two existing nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub rel: RelKind,
    pub weight: f64,
    pub delay: Delay,
    #[serde(default)]
    pub context: ContextMap,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Edge {
    /// Weight must be in `(0, 1]` per spec §3 invariants.
    pub fn has_valid_weight(&self) -> bool {
        self.weight > 0.0 && self.weight <= 1.0
    }
}

/// The symbolic operation a [`Rule`]'s `then` clause or a user
/// [`Perturbation`] applies to a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Increase,
    Decrease,
    Block,
    /// `set <value>`; direction is derived at seeding time relative to
    /// the target node's normal-range midpoint (spec §4.4).
    Set(f64),
}

impl Op {
    /// Whether this operation should seed the node as `up` given its
    /// normal-range midpoint (spec §4.4: `increase`/`set <v> above
    /// midpoint` -> up; `decrease`/`block`/`set <v> at-or-below midpoint`
    /// -> down).
    pub fn implies_up(&self, midpoint: f64) -> bool {
        match self {
            Op::Increase => true,
            Op::Decrease | Op::Block => false,
            Op::Set(value) => *value > midpoint,
        }
    }

    /// Whether this operation suppresses outgoing propagation from the
    /// seeded node (spec §4.4: `block` acts as a sink).
    pub fn blocks_outgoing(&self) -> bool {
        matches!(self, Op::Block)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Increase => write!(f, "increase"),
            Op::Decrease => write!(f, "decrease"),
            Op::Block => write!(f, "block"),
            Op::Set(v) => write!(f, "set {v}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid operation literal: {0:?}")]
pub struct OpParseError(pub String);

impl FromStr for Op {
    type Err = OpParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "increase" => Ok(Op::Increase),
            "decrease" => Ok(Op::Decrease),
            "block" => Ok(Op::Block),
            _ => {
                if let Some(rest) = s.strip_prefix("set") {
                    let value = rest
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| OpParseError(s.to_string()))?;
                    Ok(Op::Set(value))
                } else {
                    Err(OpParseError(s.to_string()))
                }
            }
        }
    }
}

/// A user-supplied forced change on one node, acting as a seed for
/// propagation (GLOSSARY "Perturbation").
///
/// Wire shape is `{node_id, op: "increase"|"decrease"|"block"|"set",
/// value?: number}` (spec §6) rather than `Op`'s own internally
/// convenient tagged-union shape, since this type crosses the HTTP
/// boundary directly as part of `SimulationRequest`.
#[derive(Clone, Debug)]
pub struct Perturbation {
    pub node_id: NodeId,
    pub op: Op,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OpTag {
    Increase,
    Decrease,
    Block,
    Set,
}

#[derive(Serialize, Deserialize)]
struct PerturbationWire {
    node_id: NodeId,
    op: OpTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
}

impl Serialize for Perturbation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (op, value) = match self.op {
            Op::Increase => (OpTag::Increase, None),
            Op::Decrease => (OpTag::Decrease, None),
            Op::Block => (OpTag::Block, None),
            Op::Set(v) => (OpTag::Set, Some(v)),
        };
        PerturbationWire { node_id: self.node_id.clone(), op, value }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Perturbation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = PerturbationWire::deserialize(deserializer)?;
        let op = match (wire.op, wire.value) {
            (OpTag::Increase, _) => Op::Increase,
            (OpTag::Decrease, _) => Op::Decrease,
            (OpTag::Block, _) => Op::Block,
            (OpTag::Set, Some(value)) => Op::Set(value),
            (OpTag::Set, None) => {
                return Err(serde::de::Error::custom("op \"set\" requires a `value` field"))
            }
        };
        Ok(Perturbation { node_id: wire.node_id, op })
    }
}

/// An authored `when`/`then` rule. `when` is parsed into
/// [`crate::rules::WhenExpr`] by the loader; `then` maps node ids to the
/// operation the rule contributes when it fires.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub when: String,
    pub then: FxHashMap<NodeId, Op>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_round_trips_through_display_and_from_str() {
        for op in [Op::Increase, Op::Decrease, Op::Block, Op::Set(37.5)] {
            let rendered = op.to_string();
            let parsed: Op = rendered.parse().unwrap();
            match (op, parsed) {
                (Op::Set(a), Op::Set(b)) => assert!((a - b).abs() < 1e-9),
                (a, b) => assert_eq!(format!("{a}"), format!("{b}")),
            }
        }
    }

    #[test]
    fn delay_orders_by_coarseness() {
        assert!(Delay::Immediate < Delay::Minutes);
        assert!(Delay::Minutes < Delay::Hours);
        assert!(Delay::Hours < Delay::Days);
    }

    #[test]
    fn normal_range_midpoint() {
        let r = NormalRange { min: 70.0, max: 100.0 };
        assert_eq!(r.midpoint(), 85.0);
    }

    #[test]
    fn perturbation_wire_shape_matches_documented_request_schema() {
        let p = Perturbation { node_id: NodeId::new("cardio.hemodynamics.map"), op: Op::Decrease };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"node_id": "cardio.hemodynamics.map", "op": "decrease"})
        );

        let set = Perturbation { node_id: NodeId::new("x"), op: Op::Set(5.0) };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!({"node_id": "x", "op": "set", "value": 5.0}));

        let parsed: Perturbation =
            serde_json::from_value(serde_json::json!({"node_id": "x", "op": "set", "value": 5.0}))
                .unwrap();
        assert!(matches!(parsed.op, Op::Set(v) if (v - 5.0).abs() < 1e-9));
    }

    #[test]
    fn perturbation_set_without_value_is_rejected() {
        let result: Result<Perturbation, _> =
            serde_json::from_value(serde_json::json!({"node_id": "x", "op": "set"}));
        assert!(result.is_err());
    }
}
