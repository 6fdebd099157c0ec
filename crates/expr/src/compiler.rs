//! Compile phase (§4.11): turn captured expression source text into a
//! [`CompiledExpression`] carrying both the parsed AST and the original
//! source, so the IR can embed the program for later runtime use while
//! diagnostics still point at the authored text.

use crate::ast::Expr;
use crate::error::ExpressionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledExpression {
    pub source: String,
    pub program: Expr,
}

/// Compile one expression. Syntactically invalid expressions are rejected
/// here with the originating source position already folded into the
/// message (§4.11's "reject syntactically invalid expressions with source
/// position").
pub fn compile(source: &str) -> Result<CompiledExpression, ExpressionError> {
    let program = crate::parser::parse(source).map_err(|message| ExpressionError { message, span: None })?;
    Ok(CompiledExpression { source: source.to_string(), program })
}

/// Best-effort static check: walks the tree and flags `matches` calls whose
/// pattern does not compile as a regex. Property-path type checking against
/// a declared input schema is deferred to callers that actually have a
/// schema (not every `.ias` context carries one); this function only
/// catches what is true independent of any schema.
pub fn static_check(compiled: &CompiledExpression) -> Vec<ExpressionError> {
    let mut errors = Vec::new();
    walk(&compiled.program, &mut errors);
    errors
}

fn walk(expr: &Expr, errors: &mut Vec<ExpressionError>) {
    match expr {
        Expr::Matches(inner, pattern) => {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ExpressionError {
                    message: format!("invalid regex pattern '{pattern}': {e}"),
                    span: None,
                });
            }
            walk(inner, errors);
        }
        Expr::Unary(_, inner) | Expr::Len(inner) => walk(inner, errors),
        Expr::Binary(_, l, r) | Expr::In(l, r) => {
            walk(l, errors);
            walk(r, errors);
        }
        Expr::Property(base, _) => walk(base, errors),
        Expr::Index(base, index) => {
            walk(base, errors);
            walk(index, errors);
        }
        Expr::ListLit(items) => items.iter().for_each(|i| walk(i, errors)),
        Expr::NullLit | Expr::BoolLit(_) | Expr::NumberLit(_) | Expr::StringLit(_) | Expr::Var(_) | Expr::Ident(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_well_formed_expression() {
        let compiled = compile("input.amount >= 100").unwrap();
        assert_eq!(compiled.source, "input.amount >= 100");
    }

    #[test]
    fn rejects_malformed_source() {
        assert!(compile("input.amount >=").is_err());
    }

    #[test]
    fn static_check_flags_bad_regex() {
        let compiled = compile(r#"input.x matches "(""#).unwrap();
        let errors = static_check(&compiled);
        assert!(!errors.is_empty());
    }
}
