//! The `when`/`then` rule engine (spec §4.3).
//!
//! Rules are evaluated once, before propagation begins, against the
//! current context and the user's perturbations expressed as seed
//! directions. A rule whose `when` expression is true contributes its
//! `then` mapping to the effective perturbation set; user perturbations
//! always take precedence on conflict (spec §4.3).
//!
//! The `when` grammar is small and closed (booleans over context flags
//! and seed directions), so it is implemented as a hand-rolled
//! recursive-descent parser over a tagged-enum AST rather than pulling
//! in a parser-combinator crate — in the spirit of design note §9
//! ("implement as tagged variants with exhaustive case analysis, not
//! class hierarchies").

mod eval;
mod parser;

pub use eval::{effective_perturbations, EvalContext};
pub use parser::{parse_when, ParseError};

use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// Parsed form of a rule's `when` clause.
///
/// Grammar (spec §4.3):
/// ```text
/// expr    := or_expr
/// or_expr := and_expr ( "or" and_expr )*
/// and_expr:= unary ( "and" unary )*
/// unary   := "not" unary | atom
/// atom    := "true" | "false" | "ctx." IDENT | IDENT "." ("up" | "down") | "(" expr ")"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WhenExpr {
    Literal(bool),
    Context(String),
    SeedDirection { node: NodeId, up: bool },
    Not(Box<WhenExpr>),
    And(Box<WhenExpr>, Box<WhenExpr>),
    Or(Box<WhenExpr>, Box<WhenExpr>),
}
