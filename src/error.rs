//! Load-time and runtime error types.
//!
//! Two tiers, matching spec §7: [`LoadError`] is fatal and prevents the
//! graph from being swapped in; [`SimulationError`] is per-request and
//! maps directly onto the HTTP status codes the external collaborator
//! uses (400 for validation, 500 for invariant violations).
//!
//! Both derive [`thiserror::Error`] and, behind the `diagnostics`
//! feature, `miette::Diagnostic`, mirroring the optional-miette pattern
//! the teacher uses for `ReducerError`.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// A single fatal pack-loading failure, identifying the offending
/// document, record, and field (spec §4.1, §7).
#[derive(Debug, Error, Clone, PartialEq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum LoadError {
    #[error("document {doc_index}: duplicate node `{id}` with conflicting fields")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(physio::load::duplicate_node),
            help("two documents declare the same node id with different domain/type/state_type")
        )
    )]
    DuplicateNodeConflict { doc_index: usize, id: String },

    #[error("document {doc_index}: alias `{alias}` already maps to `{existing}`, cannot also map to `{id}`")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(physio::load::duplicate_alias))
    )]
    DuplicateAlias {
        doc_index: usize,
        alias: String,
        existing: String,
        id: String,
    },

    #[error("document {doc_index}: edge {source} -{rel}-> {target} refers to missing endpoint `{missing}`")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(physio::load::missing_endpoint))
    )]
    MissingEndpoint {
        doc_index: usize,
        source: String,
        target: String,
        rel: String,
        missing: String,
    },

    #[error("document {doc_index}: edge {source} -{rel}-> {target} has malformed weight {weight}; must be in (0, 1]")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(physio::load::bad_weight)))]
    MalformedWeight {
        doc_index: usize,
        source: String,
        target: String,
        rel: String,
        weight: f64,
    },

    #[error("document {doc_index}: edge {source} -{rel}-> {target} is a self-loop on a signed relation")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(physio::load::self_loop)))]
    SelfLoop {
        doc_index: usize,
        source: String,
        target: String,
        rel: String,
    },

}

/// Non-fatal observations recorded while merging pack documents. These
/// travel alongside a successful load rather than aborting it (spec
/// §4.1: "warning, rule dropped" / "merged: later weight wins").
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RuleDroppedUnknownNode { rule_id: String, node_id: String },
    RuleDroppedParseError { rule_id: String, reason: String },
    EdgeMerged {
        source: String,
        target: String,
        rel: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::RuleDroppedUnknownNode { rule_id, node_id } => write!(
                f,
                "rule `{rule_id}` dropped: references unknown node `{node_id}`"
            ),
            Diagnostic::RuleDroppedParseError { rule_id, reason } => {
                write!(f, "rule `{rule_id}` dropped: {reason}")
            }
            Diagnostic::EdgeMerged { source, target, rel } => {
                write!(f, "duplicate edge {source} -{rel}-> {target} merged")
            }
        }
    }
}

/// Per-request failure. [`SimulationError::status_code`] gives the HTTP
/// status the server collaborator should report (spec §6, §7).
#[derive(Debug, Error, Clone, PartialEq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum SimulationError {
    #[error("perturbation refers to unknown node `{0}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(physio::sim::unknown_node)))]
    UnknownNode(String),

    #[error("option `{name}` out of range: {detail}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(physio::sim::bad_option)))]
    InvalidOption { name: String, detail: String },

    #[error("internal invariant violated: {token}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(physio::sim::internal)))]
    Internal { token: String },
}

impl SimulationError {
    /// HTTP status the external collaborator should surface for this
    /// error (spec §7: 400 for validation, 500 for internal failures).
    pub fn status_code(&self) -> u16 {
        match self {
            SimulationError::UnknownNode(_) | SimulationError::InvalidOption { .. } => 400,
            SimulationError::Internal { .. } => 500,
        }
    }
}
