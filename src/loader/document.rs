//! Wire shape of a parsed knowledge pack document (spec §6).
//!
//! A `PackDocument` is deliberately just a structured record: the loader
//! is a pure function from a list of these to a [`crate::graph::Graph`],
//! with no awareness of where they came from (spec §1 — "the loader is
//! specified as a function from a list of parsed documents, not from
//! disk"). Reading YAML/JSON files into this shape is the job of the
//! CLI/server collaborators, not this crate's core.

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node, Rule};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl PackDocument {
    /// Parse a single document from a YAML string. A convenience for
    /// callers outside the engine core (CLI, server reload handler);
    /// the loader itself never touches the filesystem.
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}
