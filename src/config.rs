//! Engine-wide tunables (spec §9 open questions, §4.5 defaults).
//!
//! Grounded on the teacher's `RuntimeConfig` — a small, cheaply-cloned
//! value that callers build once and thread through every entry point,
//! rather than scattering magic numbers through the propagation code.

/// Defaults the spec leaves as "should be a configurable option" rather
/// than hardcoding them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Conflict-rule epsilon: when `up` and `down` confidences are within
    /// this margin, the node's direction becomes `unknown` (spec §4.4
    /// step 4). Default `0.05`, per spec §9 open question.
    pub unknown_epsilon: f64,
    /// Default number of top-confidence paths [`crate::trace`] retains
    /// per affected node (spec §4.5). Default `5`.
    pub default_trace_fanout: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            unknown_epsilon: 0.05,
            default_trace_fanout: 5,
        }
    }
}

impl EngineConfig {
    pub fn with_unknown_epsilon(mut self, epsilon: f64) -> Self {
        self.unknown_epsilon = epsilon;
        self
    }

    pub fn with_default_trace_fanout(mut self, fanout: usize) -> Self {
        self.default_trace_fanout = fanout;
        self
    }

    /// Load overrides from the process environment, falling back to
    /// [`EngineConfig::default`] for anything unset or unparsable.
    /// Reads a `.env` file first if one is present, same as the
    /// teacher's `RuntimeConfig::resolve_sqlite_db_name`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = EngineConfig::default();
        let unknown_epsilon = std::env::var("PHYSIO_UNKNOWN_EPSILON")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.unknown_epsilon);
        let default_trace_fanout = std::env::var("PHYSIO_TRACE_FANOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_trace_fanout);
        EngineConfig { unknown_epsilon, default_trace_fanout }
    }
}
