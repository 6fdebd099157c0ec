//! Shared building blocks used by every resource-body parser: attribute
//! values, generic `key value` lines, `kind "name"` references, and
//! brace-delimited bodies.

use super::primitives::*;
use crate::ast::{Attribute, Reference, Spanned, Value};
use crate::lexer::Token;
use chumsky::prelude::*;

/// A scalar or list literal, e.g. the right-hand side of `retries 3` or
/// `tags ["a", "b"]`.
pub fn value_parser<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Value>, Err<'tokens, 'src>> + Clone {
    recursive(|value| {
        let scalar = choice((
            string_lit().map(Value::String),
            number_lit().map(Value::Number),
            bool_lit().map(Value::Bool),
        ));
        let list = value
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Value::List);
        choice((list, scalar)).map_with(|v, e| Spanned::new(v, to_ast_span(e.span())))
    })
}

/// A bare `key value` attribute line, used for both known scalar attributes
/// and the catch-all `attributes: Vec<Attribute>` fields every resource body
/// keeps around for forward-compatible passthrough.
pub fn attribute_line<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Attribute, Err<'tokens, 'src>> + Clone {
    spanned_ident().then(value_parser()).map(|(key, value)| Attribute { key, value })
}

/// Matches a specific identifier by text, without consuming it as a generic
/// `Ident` elsewhere (e.g. the `http`/`inline`/`mcp` tool-spec selectors,
/// which are not reserved keywords).
pub fn ident_eq<'tokens, 'src: 'tokens>(
    word: &'static str,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), Err<'tokens, 'src>> + Clone {
    ident().filter(move |s: &&str| *s == word).ignored()
}

/// `<tok> "<name>"`, e.g. `skill "search"` inside a `uses` line. The caller
/// supplies the leading keyword token and the reference's `kind` tag.
pub fn reference_after<'tokens, 'src: 'tokens>(
    tok: Token<'src>,
    kind: &'static str,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Reference, Err<'tokens, 'src>> + Clone {
    just(tok).ignore_then(spanned_string()).map_with(move |name, e| Reference {
        kind: kind.to_string(),
        name,
        span: to_ast_span(e.span()),
    })
}

/// Wraps `inner` in `{ ... }`, tolerating blank lines and comments just
/// inside the braces.
pub fn braced<'tokens, 'src: 'tokens, O: 'tokens>(
    inner: impl Parser<'tokens, ParserInput<'tokens, 'src>, O, Err<'tokens, 'src>> + Clone,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, O, Err<'tokens, 'src>> + Clone {
    just(Token::LBrace)
        .ignore_then(skip_noise())
        .ignore_then(inner)
        .then_ignore(skip_noise())
        .then_ignore(just(Token::RBrace))
}

/// Repeats `line` separated by the blank-line/comment noise between entries,
/// collecting every match into a `Vec`.
pub fn lines<'tokens, 'src: 'tokens, O: 'tokens>(
    line: impl Parser<'tokens, ParserInput<'tokens, 'src>, O, Err<'tokens, 'src>> + Clone,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Vec<O>, Err<'tokens, 'src>> + Clone {
    skip_noise().ignore_then(line.then_ignore(skip_noise())).repeated().collect()
}
