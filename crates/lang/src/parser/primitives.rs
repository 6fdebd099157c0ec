//! Primitive token parsers shared across resource-body parsers.

use crate::ast::{Span as AstSpan, Spanned};
use crate::lexer::Token;
use chumsky::input::MappedInput;
use chumsky::prelude::*;

pub type Span = SimpleSpan<usize>;
pub type SpannedToken<'src> = (Token<'src>, Span);
pub type ParserInput<'tokens, 'src> =
    MappedInput<'tokens, Token<'src>, Span, &'tokens [SpannedToken<'src>]>;
pub type Err<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

pub fn to_ast_span(span: Span) -> AstSpan {
    span.start..span.end
}

pub fn ident<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, &'src str, Err<'tokens, 'src>> + Clone {
    select! { Token::Ident(s) => s }
}

pub fn spanned_ident<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<String>, Err<'tokens, 'src>> + Clone {
    ident().map_with(|s, e| Spanned::new(s.to_string(), to_ast_span(e.span())))
}

pub fn string_lit<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, &'src str, Err<'tokens, 'src>> + Clone {
    select! { Token::StringLit(s) => s }
}

pub fn spanned_string<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<String>, Err<'tokens, 'src>> + Clone {
    string_lit().map_with(|s, e| Spanned::new(s.to_string(), to_ast_span(e.span())))
}

pub fn number_lit<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, f64, Err<'tokens, 'src>> + Clone {
    select! { Token::NumberLit(n) => n }
}

pub fn bool_lit<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, bool, Err<'tokens, 'src>> + Clone {
    select! { Token::True => true, Token::False => false }
}

/// Skip blank-line noise (newlines and comments) between entries.
pub fn skip_noise<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), Err<'tokens, 'src>> + Clone {
    choice((just(Token::Newline).ignored(), select! { Token::Comment(_) => () })).repeated().ignored()
}
