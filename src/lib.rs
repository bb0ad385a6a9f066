//! # physio-reasoner: a qualitative physiology reasoner
//!
//! Given a knowledge graph of physiological entities and signed causal
//! relations, plus a set of user-supplied perturbations and a patient
//! context, this crate computes which other entities change, in which
//! direction, with what confidence, along which causal paths.
//!
//! This is a didactic reasoning tool, not a quantitative simulator: edge
//! weights are authored, not fit, and propagation is a signed, confidence-
//! weighted breadth-first relaxation rather than an ODE integration.
//!
//! ## Module guide
//!
//! - [`model`] — node, edge, rule and perturbation types
//! - [`graph`] — the immutable, alias-resolved [`graph::Graph`] value
//! - [`loader`] — merges parsed pack documents into a [`graph::Graph`]
//! - [`context`] — the context gate that decides whether an edge is live
//! - [`rules`] — the `when`/`then` rule engine and its expression grammar
//! - [`propagation`] — the core signed, context-gated traversal engine
//! - [`trace`] — causal path reconstruction and macro-summaries
//! - [`comparator`] — baseline-vs-intervention diffing
//! - [`config`] — engine-wide tunables
//! - [`error`] — load-time and runtime error types
//! - [`telemetry`] — human-readable rendering of diagnostics and traces

pub mod comparator;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod propagation;
pub mod rules;
pub mod telemetry;
pub mod trace;

#[cfg(feature = "server")]
pub mod server;

pub use comparator::{compare, ComparisonRequest, ComparisonResponse};
pub use config::EngineConfig;
pub use error::{LoadError, SimulationError};
pub use graph::Graph;
pub use model::{Edge, Node, Perturbation, Rule};
pub use propagation::{simulate, SimulationRequest, SimulationResponse};
