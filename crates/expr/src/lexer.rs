//! Lexer for the guard-expression sublanguage (§4.11): a small grammar
//! embedded as a captured string inside `when`, `if`, `for each … in`, and
//! validation-rule lines of IntentLang. Intentionally much smaller than
//! [`agentspec_lang::lexer`] — no block structure, no comments.

use chumsky::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum Token<'src> {
    Ident(&'src str),
    StringLit(&'src str),
    NumberLit(f64),
    True,
    False,
    Null,
    In,
    Matches,

    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Bang,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{s}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::NumberLit(n) => write!(f, "{n}"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::In => write!(f, "in"),
            Token::Matches => write!(f, "matches"),
            Token::Dot => write!(f, "."),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Bang => write!(f, "!"),
        }
    }
}

pub type Span = SimpleSpan<usize>;
pub type Spanned<T> = (T, Span);

pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char, Span>>> {
    let escape = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        just('"').to('"'),
        just('\\').to('\\'),
    )));
    let string_lit = just('"')
        .ignore_then(choice((escape, none_of("\"\\"))).repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit);

    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Token::NumberLit(s.parse().unwrap_or(0.0)));

    let keyword_or_ident = text::ident().map(|s: &str| match s {
        "true" => Token::True,
        "false" => Token::False,
        "null" | "missing" => Token::Null,
        "in" => Token::In,
        "matches" => Token::Matches,
        other => Token::Ident(other),
    });

    let two_char = choice((
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
    ));

    let one_char = choice((
        just('.').to(Token::Dot),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('!').to(Token::Bang),
    ));

    let token = choice((string_lit, number, two_char, one_char, keyword_or_ident));
    let ws = one_of(" \t\r\n").repeated();

    token.map_with(|tok, e| (tok, e.span())).padded_by(ws).repeated().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_property_path_and_comparison() {
        let tokens: Vec<_> =
            lexer().parse("input.amount >= 100 && output.status != \"failed\"").into_result().unwrap();
        let toks: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            toks,
            vec![
                Token::Ident("input"),
                Token::Dot,
                Token::Ident("amount"),
                Token::Ge,
                Token::NumberLit(100.0),
                Token::AndAnd,
                Token::Ident("output"),
                Token::Dot,
                Token::Ident("status"),
                Token::NotEq,
                Token::StringLit("failed"),
            ]
        );
    }
}
