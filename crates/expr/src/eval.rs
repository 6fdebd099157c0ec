//! Tree-walking evaluator (§4.11 runtime phase). Pure and deterministic
//! given a [`Context`] snapshot: no I/O, no mutation beyond local `let`-free
//! reduction, and every node terminates because the AST has no loops or
//! recursion back into itself.

use crate::ast::{BinOp, Expr, UnOp};
use crate::context::Context;
use crate::value::Value;
use regex::Regex;

pub fn eval(expr: &Expr, ctx: &Context) -> Value {
    match expr {
        Expr::NullLit => Value::Null,
        Expr::BoolLit(b) => Value::Bool(*b),
        Expr::NumberLit(n) => Value::Number(*n),
        Expr::StringLit(s) => Value::String(s.clone()),
        Expr::ListLit(items) => Value::List(items.iter().map(|e| eval(e, ctx)).collect()),
        Expr::Var(var) => ctx.lookup_var(*var).clone(),
        Expr::Ident(name) => ctx.lookup_ident(name),
        Expr::Property(base, name) => eval(base, ctx).get_property(name),
        Expr::Index(base, index) => {
            let idx = eval(index, ctx);
            eval(base, ctx).get_index(&idx)
        }
        Expr::Unary(op, operand) => eval_unary(*op, eval(operand, ctx)),
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, ctx),
        Expr::In(needle, haystack) => eval_in(eval(needle, ctx), eval(haystack, ctx)),
        Expr::Matches(subject, pattern) => eval_matches(eval(subject, ctx), pattern),
        Expr::Len(inner) => eval(inner, ctx).len(),
    }
}

fn eval_unary(op: UnOp, value: Value) -> Value {
    match (op, value) {
        (UnOp::Not, v) => Value::Bool(!v.is_truthy()),
        (UnOp::Neg, Value::Number(n)) => Value::Number(-n),
        (UnOp::Neg, _) => Value::Missing,
    }
}

/// `&&`/`||` short-circuit (no side effects to avoid, but still skips the
/// unevaluated branch to keep cost proportional to the taken path).
fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, ctx: &Context) -> Value {
    match op {
        BinOp::And => {
            let l = eval(lhs, ctx);
            if !l.is_truthy() {
                return Value::Bool(false);
            }
            Value::Bool(eval(rhs, ctx).is_truthy())
        }
        BinOp::Or => {
            let l = eval(lhs, ctx);
            if l.is_truthy() {
                return Value::Bool(true);
            }
            Value::Bool(eval(rhs, ctx).is_truthy())
        }
        _ => eval_binary_strict(op, eval(lhs, ctx), eval(rhs, ctx)),
    }
}

fn eval_binary_strict(op: BinOp, l: Value, r: Value) -> Value {
    use BinOp::*;
    // Comparisons involving `missing` are always false (§4.11), no
    // exception for `!=`.
    if matches!(op, Eq | Ne | Lt | Gt | Le | Ge) && (l.is_missing() || r.is_missing()) {
        return Value::Bool(false);
    }
    match op {
        Add => numeric_or_concat(l, r, |a, b| a + b),
        Sub => arith(l, r, |a, b| a - b),
        Mul => arith(l, r, |a, b| a * b),
        Div => arith(l, r, |a, b| a / b),
        Mod => arith(l, r, |a, b| a % b),
        Eq => Value::Bool(values_equal(&l, &r)),
        Ne => Value::Bool(!values_equal(&l, &r)),
        Lt => compare(l, r, |o| o.is_lt()),
        Gt => compare(l, r, |o| o.is_gt()),
        Le => compare(l, r, |o| o.is_le()),
        Ge => compare(l, r, |o| o.is_ge()),
        And | Or => unreachable!("short-circuited above"),
    }
}

fn arith(l: Value, r: Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Value::Number(f(a, b)),
        _ => Value::Missing,
    }
}

fn numeric_or_concat(l: Value, r: Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Value::Number(f(a, b)),
        (Value::String(a), Value::String(b)) => Value::String(a + &b),
        _ => Value::Missing,
    }
}

fn compare(l: Value, r: Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => {
            a.partial_cmp(&b).map(accept).map(Value::Bool).unwrap_or(Value::Bool(false))
        }
        (Value::String(a), Value::String(b)) => Value::Bool(accept(a.cmp(&b))),
        _ => Value::Bool(false),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| values_equal(v, bv)))
        }
        _ => false,
    }
}

fn eval_in(needle: Value, haystack: Value) -> Value {
    match haystack {
        Value::List(items) => Value::Bool(items.iter().any(|v| values_equal(v, &needle))),
        Value::String(s) => match needle {
            Value::String(n) => Value::Bool(s.contains(&n)),
            _ => Value::Bool(false),
        },
        Value::Map(map) => match needle {
            Value::String(key) => Value::Bool(map.contains_key(&key)),
            _ => Value::Bool(false),
        },
        _ => Value::Bool(false),
    }
}

fn eval_matches(subject: Value, pattern: &str) -> Value {
    let Value::String(s) = subject else { return Value::Bool(false) };
    match Regex::new(pattern) {
        Ok(re) => Value::Bool(re.is_match(&s)),
        Err(_) => Value::Bool(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse as parse_expr;
    use serde_json::json;

    fn ctx_with_input(value: serde_json::Value) -> Context {
        Context::new().with_input(Value::from_json(&value))
    }

    #[test]
    fn missing_property_compares_false() {
        let ctx = ctx_with_input(json!({}));
        let expr = parse_expr("input.amount > 10").unwrap();
        assert_eq!(eval(&expr, &ctx), Value::Bool(false));
    }

    #[test]
    fn short_circuits_and() {
        let ctx = ctx_with_input(json!({}));
        let expr = parse_expr("input.missing.deep && true").unwrap();
        assert_eq!(eval(&expr, &ctx), Value::Bool(false));
    }

    #[test]
    fn membership_over_list() {
        let ctx = ctx_with_input(json!({"tags": ["a", "b"]}));
        let expr = parse_expr(r#""a" in input.tags"#).unwrap();
        assert_eq!(eval(&expr, &ctx), Value::Bool(true));
    }

    #[test]
    fn string_containment() {
        let ctx = ctx_with_input(json!({"message": "hello world"}));
        let expr = parse_expr(r#""world" in input.message"#).unwrap();
        assert_eq!(eval(&expr, &ctx), Value::Bool(true));
    }

    #[test]
    fn regex_matches() {
        let ctx = ctx_with_input(json!({"email": "a@b.com"}));
        let expr = parse_expr(r#"input.email matches "^[^@]+@[^@]+$""#).unwrap();
        assert_eq!(eval(&expr, &ctx), Value::Bool(true));
    }

    #[test]
    fn len_over_list_and_string() {
        let ctx = ctx_with_input(json!({"items": [1, 2, 3], "name": "abc"}));
        assert_eq!(eval(&parse_expr("len(input.items)").unwrap(), &ctx), Value::Number(3.0));
        assert_eq!(eval(&parse_expr("len(input.name)").unwrap(), &ctx), Value::Number(3.0));
    }
}
