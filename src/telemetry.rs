//! Human-readable rendering of load diagnostics and simulation traces.
//!
//! Grounded on the teacher's `TelemetryFormatter`/`PlainFormatter` pair:
//! a small render trait so a CLI or log sink can format load
//! diagnostics and traces without this crate committing to a specific
//! output medium.

use crate::error::Diagnostic;
use crate::model::NodeId;
use crate::propagation::SimulationResponse;

pub const CONTEXT_COLOR: &str = "\x1b[32m";
pub const LINE_COLOR: &str = "\x1b[35m";
pub const RESET_COLOR: &str = "\x1b[0m";

/// Rendered output for one diagnostic or trace, consumable by any sink
/// (terminal, log line, CLI report).
#[derive(Clone, Debug, Default)]
pub struct EventRender {
    pub context: Option<String>,
    pub lines: Vec<String>,
}

impl EventRender {
    pub fn join_lines(&self) -> String {
        self.lines.join("")
    }
}

pub trait TelemetryFormatter: Send + Sync {
    fn render_diagnostics(&self, diagnostics: &[Diagnostic]) -> Vec<EventRender>;
    fn render_response(&self, node_id: &NodeId, response: &SimulationResponse) -> EventRender;
}

pub struct PlainFormatter;

impl TelemetryFormatter for PlainFormatter {
    fn render_diagnostics(&self, diagnostics: &[Diagnostic]) -> Vec<EventRender> {
        diagnostics
            .iter()
            .enumerate()
            .map(|(i, d)| EventRender {
                context: Some(diagnostic_kind(d).to_string()),
                lines: vec![format!(
                    "[{i}] {CONTEXT_COLOR}{}{RESET_COLOR}: {LINE_COLOR}{d}{RESET_COLOR}\n",
                    diagnostic_kind(d)
                )],
            })
            .collect()
    }

    fn render_response(&self, node_id: &NodeId, response: &SimulationResponse) -> EventRender {
        let affected = response.affected_nodes.iter().find(|n| &n.node_id == node_id);
        let mut lines = Vec::new();
        match affected {
            Some(a) => {
                lines.push(format!(
                    "{CONTEXT_COLOR}{node_id}{RESET_COLOR}: {:?} ({:?}, confidence={:.2}, tick={}){RESET_COLOR}\n",
                    a.direction, a.magnitude, a.confidence, a.first_tick
                ));
            }
            None => {
                lines.push(format!("{CONTEXT_COLOR}{node_id}{RESET_COLOR}: unchanged\n"));
            }
        }
        if let Some(steps) = response.traces.get(node_id) {
            for (i, step) in steps.iter().enumerate() {
                lines.push(format!(
                    "{LINE_COLOR}  path {i} (confidence={:.2}): {}{RESET_COLOR}\n",
                    step.confidence,
                    step.steps.join(" ")
                ));
            }
        }
        EventRender {
            context: Some(node_id.as_str().to_string()),
            lines,
        }
    }
}

fn diagnostic_kind(d: &Diagnostic) -> &'static str {
    match d {
        Diagnostic::RuleDroppedUnknownNode { .. } => "rule_dropped_unknown_node",
        Diagnostic::RuleDroppedParseError { .. } => "rule_dropped_parse_error",
        Diagnostic::EdgeMerged { .. } => "edge_merged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_line_per_diagnostic() {
        let diagnostics = vec![
            Diagnostic::RuleDroppedUnknownNode {
                rule_id: "r1".to_string(),
                node_id: "missing.node".to_string(),
            },
            Diagnostic::EdgeMerged {
                source: "a".to_string(),
                target: "b".to_string(),
                rel: "increases".to_string(),
            },
        ];
        let rendered = PlainFormatter.render_diagnostics(&diagnostics);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].join_lines().contains("rule_dropped_unknown_node"));
    }
}
