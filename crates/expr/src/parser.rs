//! Recursive-descent (precedence-climbing) parser turning the expression
//! token stream into an [`ast::Expr`]. Mirrors the
//! foldl-based precedence ladder that `agentspec-lang`'s own expression
//! grammar uses for operators: each precedence tier is `foldl_with` over
//! the tier below it, from `*`/`/`/`%` up through `||`.

use crate::ast::{BinOp, ContextVar, Expr, UnOp};
use crate::lexer::{self, Token};
use chumsky::input::{Input as _, MappedInput};
use chumsky::prelude::*;

type Span = SimpleSpan<usize>;
type SpannedToken<'src> = (Token<'src>, Span);
type ParserInput<'tokens, 'src> = MappedInput<'tokens, Token<'src>, Span, &'tokens [SpannedToken<'src>]>;
type Err<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

fn ident<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, &'src str, Err<'tokens, 'src>> + Clone {
    select! { Token::Ident(s) => s }
}

fn var_or_ident(name: &str) -> Expr {
    match ContextVar::parse(name) {
        Some(v) => Expr::Var(v),
        None => Expr::Ident(name.to_string()),
    }
}

fn expr_parser<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Expr, Err<'tokens, 'src>> + Clone {
    recursive(|expr| {
        let property_key = choice((ident(), select! { Token::In => "in", Token::Matches => "matches" }));

        let atom = choice((
            select! { Token::StringLit(s) => Expr::StringLit(s.to_string()) },
            select! { Token::NumberLit(n) => Expr::NumberLit(n) },
            just(Token::True).to(Expr::BoolLit(true)),
            just(Token::False).to(Expr::BoolLit(false)),
            just(Token::Null).to(Expr::NullLit),
            just(Token::Ident("len"))
                .ignore_then(expr.clone().delimited_by(just(Token::LParen), just(Token::RParen)))
                .map(|inner| Expr::Len(Box::new(inner))),
            ident().map(var_or_ident),
            expr.clone().delimited_by(just(Token::LParen), just(Token::RParen)),
            expr.clone()
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Expr::ListLit),
        ));

        #[derive(Clone)]
        enum Postfix {
            Prop(String),
            Index(Expr),
        }
        let postfix_op = choice((
            just(Token::Dot).ignore_then(property_key).map(|s| Postfix::Prop(s.to_string())),
            expr.clone().delimited_by(just(Token::LBracket), just(Token::RBracket)).map(Postfix::Index),
        ));
        let postfix = atom.foldl(postfix_op.repeated(), |base, op| match op {
            Postfix::Prop(name) => Expr::Property(Box::new(base), name),
            Postfix::Index(idx) => Expr::Index(Box::new(base), Box::new(idx)),
        });

        let unary_op = choice((just(Token::Bang).to(UnOp::Not), just(Token::Minus).to(UnOp::Neg)));
        let unary = unary_op.repeated().foldr(postfix, |op, operand| Expr::Unary(op, Box::new(operand)));

        let mul_op = choice((
            just(Token::Star).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
            just(Token::Percent).to(BinOp::Mod),
        ));
        let product = unary.clone().foldl(mul_op.then(unary).repeated(), |l, (op, r)| {
            Expr::Binary(op, Box::new(l), Box::new(r))
        });

        let add_op = choice((just(Token::Plus).to(BinOp::Add), just(Token::Minus).to(BinOp::Sub)));
        let sum = product.clone().foldl(add_op.then(product).repeated(), |l, (op, r)| {
            Expr::Binary(op, Box::new(l), Box::new(r))
        });

        let rel_op = choice((
            just(Token::Lt).to(BinOp::Lt),
            just(Token::Gt).to(BinOp::Gt),
            just(Token::Le).to(BinOp::Le),
            just(Token::Ge).to(BinOp::Ge),
        ));
        let relational = sum.clone().foldl(rel_op.then(sum).repeated(), |l, (op, r)| {
            Expr::Binary(op, Box::new(l), Box::new(r))
        });

        let eq_op = choice((just(Token::EqEq).to(BinOp::Eq), just(Token::NotEq).to(BinOp::Ne)));
        let equality = relational.clone().foldl(eq_op.then(relational).repeated(), |l, (op, r)| {
            Expr::Binary(op, Box::new(l), Box::new(r))
        });

        #[derive(Clone)]
        enum InOrMatch {
            In(Expr),
            Matches(String),
        }
        let in_or_matches = choice((
            just(Token::In).ignore_then(equality.clone()).map(InOrMatch::In),
            just(Token::Matches)
                .ignore_then(select! { Token::StringLit(s) => s.to_string() })
                .map(InOrMatch::Matches),
        ));
        let membership = equality.clone().foldl(in_or_matches.repeated(), |l, op| match op {
            InOrMatch::In(r) => Expr::In(Box::new(l), Box::new(r)),
            InOrMatch::Matches(pattern) => Expr::Matches(Box::new(l), pattern),
        });

        let and_expr = membership
            .clone()
            .foldl(just(Token::AndAnd).ignore_then(membership).repeated(), |l, r| {
                Expr::Binary(BinOp::And, Box::new(l), Box::new(r))
            });

        and_expr.clone().foldl(just(Token::OrOr).ignore_then(and_expr).repeated(), |l, r| {
            Expr::Binary(BinOp::Or, Box::new(l), Box::new(r))
        })
    })
}

/// Parse guard-expression source text into a compiled [`Expr`]. Returns a
/// human-readable error message with a 1-based `(line, col)` prefix on
/// failure, matching the rest of the compiler's diagnostic shape (§7).
pub fn parse(source: &str) -> Result<Expr, String> {
    let tokens = lexer::lexer().parse(source).into_result().map_err(|errs| {
        errs.first().map(|e| format!("invalid token in expression: {e}")).unwrap_or_else(|| "lex error".to_string())
    })?;
    let eoi = Span::new((), source.len()..source.len());
    let stream = tokens.as_slice().map(eoi, |(t, s)| (t, s));
    expr_parser().then_ignore(end()).parse(stream).into_result().map_err(|errs| {
        errs.first()
            .map(|e| format!("{}:{}: {e}", e.span().start, e.span().end))
            .unwrap_or_else(|| "parse error".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_property_path_comparison() {
        let e = parse("input.amount >= 100").unwrap();
        assert!(matches!(e, Expr::Binary(BinOp::Ge, _, _)));
    }

    #[test]
    fn parses_membership_and_len() {
        let e = parse(r#"len(session.history) > 0 && "x" in input.tags"#).unwrap();
        assert!(matches!(e, Expr::Binary(BinOp::And, _, _)));
    }

    #[test]
    fn parses_matches_with_string_pattern() {
        let e = parse(r#"input.email matches "^[^@]+@[^@]+$""#).unwrap();
        assert!(matches!(e, Expr::Matches(_, _)));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("input.x )").is_err());
    }
}
