//! Runtime context a compiled expression is evaluated against (§4.11):
//! `input`, `output`, `session`, `steps`, `config`, plus loop variables
//! bound by an enclosing `for each`.

use crate::ast::ContextVar;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Context {
    input: Value,
    output: Value,
    session: Value,
    steps: Value,
    config: Value,
    /// Loop variables bound by an enclosing `for each <var> in <expr>`,
    /// pushed/popped by the runtime control-flow interpreter (out of scope
    /// here; this crate only evaluates one expression at a time).
    locals: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, value: Value) -> Self {
        self.input = value;
        self
    }

    pub fn with_output(mut self, value: Value) -> Self {
        self.output = value;
        self
    }

    pub fn with_session(mut self, value: Value) -> Self {
        self.session = value;
        self
    }

    pub fn with_steps(mut self, value: Value) -> Self {
        self.steps = value;
        self
    }

    pub fn with_config(mut self, value: Value) -> Self {
        self.config = value;
        self
    }

    pub fn bind_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub(crate) fn lookup_var(&self, var: ContextVar) -> &Value {
        match var {
            ContextVar::Input => &self.input,
            ContextVar::Output => &self.output,
            ContextVar::Session => &self.session,
            ContextVar::Steps => &self.steps,
            ContextVar::Config => &self.config,
        }
    }

    pub(crate) fn lookup_ident(&self, name: &str) -> Value {
        self.locals.get(name).cloned().unwrap_or(Value::Missing)
    }
}
