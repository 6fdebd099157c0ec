//! Compiled expression AST (§4.11). Produced once at compile time (during
//! semantic validation / IR lowering) and walked many times at runtime —
//! there is no re-parsing on the hot path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

/// The context variables a compiled expression may start a property path
/// from (§4.11): `input`, `output`, `session`, `steps`, `config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextVar {
    Input,
    Output,
    Session,
    Steps,
    Config,
}

impl ContextVar {
    pub fn name(self) -> &'static str {
        match self {
            ContextVar::Input => "input",
            ContextVar::Output => "output",
            ContextVar::Session => "session",
            ContextVar::Steps => "steps",
            ContextVar::Config => "config",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "input" => Some(ContextVar::Input),
            "output" => Some(ContextVar::Output),
            "session" => Some(ContextVar::Session),
            "steps" => Some(ContextVar::Steps),
            "config" => Some(ContextVar::Config),
            _ => None,
        }
    }
}

/// A node of the compiled, closed-interpreter expression AST. No function
/// definitions, no I/O, no loops — every node is a pure, terminating
/// reduction over a context snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    NullLit,
    BoolLit(bool),
    NumberLit(f64),
    StringLit(String),
    ListLit(Vec<Expr>),
    Var(ContextVar),
    /// Bare identifier that is not one of the five context variables — kept
    /// so a loop variable bound by an enclosing `for each` still resolves.
    Ident(String),
    Property(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// `x in y`: substring containment when `y` evaluates to a string,
    /// membership when `y` evaluates to a list.
    In(Box<Expr>, Box<Expr>),
    /// `x matches "regex"` — `y` must be a string literal, checked at
    /// compile time so invalid patterns are a compile error, not a runtime
    /// surprise (§4.11, "reject syntactically invalid expressions").
    Matches(Box<Expr>, String),
    Len(Box<Expr>),
}
