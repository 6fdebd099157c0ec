//! Lexer for IntentLang source code.
//!
//! Tokenizes `.ias` source into a flat token stream with source spans.
//! IntentLang is brace-delimited (not indentation-sensitive): blocks are
//! `keyword "name" [modifiers] { attribute_line* }`. Comments run from `#`
//! or `//` to end of line; there are no block comments.

use chumsky::prelude::*;

/// A token in IntentLang.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Package,
    Version,
    Lang,
    Import,
    As,
    Prompt,
    Skill,
    Agent,
    Tool,
    Deploy,
    Pipeline,
    Type,
    Server,
    Client,
    Secret,
    Environment,
    Policy,
    Plugin,
    Uses,
    Connects,
    To,
    Exposes,
    Target,
    Default,
    Config,
    Validate,
    Eval,
    Rule,
    Case,
    When,
    On,
    Input,
    Use,
    With,
    Delegate,
    Respond,
    For,
    Each,
    In,
    If,
    Else,
    Required,
    Store,
    Env,
    Command,
    Deny,
    Require,
    Allow,
    Enum,
    List,
    Step,
    DependsOn,
    Parallel,
    Struct,
    Override,
    Attribute,
    Field,
    Param,

    // Literals
    True,
    False,
    Ident(&'src str),
    StringLit(&'src str),
    NumberLit(f64),

    // Punctuation
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Dot,      // .
    At,       // @

    Comment(&'src str),
    Newline,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Package => write!(f, "package"),
            Token::Version => write!(f, "version"),
            Token::Lang => write!(f, "lang"),
            Token::Import => write!(f, "import"),
            Token::As => write!(f, "as"),
            Token::Prompt => write!(f, "prompt"),
            Token::Skill => write!(f, "skill"),
            Token::Agent => write!(f, "agent"),
            Token::Tool => write!(f, "tool"),
            Token::Deploy => write!(f, "deploy"),
            Token::Pipeline => write!(f, "pipeline"),
            Token::Type => write!(f, "type"),
            Token::Server => write!(f, "server"),
            Token::Client => write!(f, "client"),
            Token::Secret => write!(f, "secret"),
            Token::Environment => write!(f, "environment"),
            Token::Policy => write!(f, "policy"),
            Token::Plugin => write!(f, "plugin"),
            Token::Uses => write!(f, "uses"),
            Token::Connects => write!(f, "connects"),
            Token::To => write!(f, "to"),
            Token::Exposes => write!(f, "exposes"),
            Token::Target => write!(f, "target"),
            Token::Default => write!(f, "default"),
            Token::Config => write!(f, "config"),
            Token::Validate => write!(f, "validate"),
            Token::Eval => write!(f, "eval"),
            Token::Rule => write!(f, "rule"),
            Token::Case => write!(f, "case"),
            Token::When => write!(f, "when"),
            Token::On => write!(f, "on"),
            Token::Input => write!(f, "input"),
            Token::Use => write!(f, "use"),
            Token::With => write!(f, "with"),
            Token::Delegate => write!(f, "delegate"),
            Token::Respond => write!(f, "respond"),
            Token::For => write!(f, "for"),
            Token::Each => write!(f, "each"),
            Token::In => write!(f, "in"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Required => write!(f, "required"),
            Token::Store => write!(f, "store"),
            Token::Env => write!(f, "env"),
            Token::Command => write!(f, "command"),
            Token::Deny => write!(f, "deny"),
            Token::Require => write!(f, "require"),
            Token::Allow => write!(f, "allow"),
            Token::Enum => write!(f, "enum"),
            Token::List => write!(f, "list"),
            Token::Step => write!(f, "step"),
            Token::DependsOn => write!(f, "depends_on"),
            Token::Parallel => write!(f, "parallel"),
            Token::Struct => write!(f, "struct"),
            Token::Override => write!(f, "override"),
            Token::Attribute => write!(f, "attribute"),
            Token::Field => write!(f, "field"),
            Token::Param => write!(f, "param"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::StringLit(s) => write!(f, "\"{}\"", s),
            Token::NumberLit(n) => write!(f, "{}", n),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::At => write!(f, "@"),
            Token::Comment(s) => write!(f, "# {}", s),
            Token::Newline => write!(f, "\\n"),
        }
    }
}

/// Span type for tokens.
pub type Span = SimpleSpan<usize>;

/// A token with its span.
pub type Spanned<T> = (T, Span);

/// Create the lexer parser.
///
/// Strings support the escape set `\n \t \" \\`; an unrecognized escape is a
/// lex error carrying the offending position.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char, Span>>> {
    let line_comment_hash = just('#').ignore_then(none_of('\n').repeated().to_slice());
    let line_comment_slash = just("//").ignore_then(none_of('\n').repeated().to_slice());
    let comment = line_comment_hash.or(line_comment_slash).map(Token::Comment);

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

    let number = just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Token::NumberLit(s.parse().unwrap_or(0.0)));

    let keyword = choice((
        choice((
            text::keyword("package").to(Token::Package),
            text::keyword("version").to(Token::Version),
            text::keyword("lang").to(Token::Lang),
            text::keyword("import").to(Token::Import),
            text::keyword("as").to(Token::As),
            text::keyword("prompt").to(Token::Prompt),
            text::keyword("skill").to(Token::Skill),
            text::keyword("agent").to(Token::Agent),
            text::keyword("tool").to(Token::Tool),
            text::keyword("deploy").to(Token::Deploy),
            text::keyword("pipeline").to(Token::Pipeline),
            text::keyword("type").to(Token::Type),
            text::keyword("server").to(Token::Server),
            text::keyword("client").to(Token::Client),
            text::keyword("secret").to(Token::Secret),
            text::keyword("environment").to(Token::Environment),
            text::keyword("policy").to(Token::Policy),
            text::keyword("plugin").to(Token::Plugin),
            text::keyword("uses").to(Token::Uses),
            text::keyword("connects").to(Token::Connects),
            text::keyword("to").to(Token::To),
            text::keyword("exposes").to(Token::Exposes),
            text::keyword("target").to(Token::Target),
            text::keyword("default").to(Token::Default),
        )),
        choice((
            text::keyword("config").to(Token::Config),
            text::keyword("validate").to(Token::Validate),
            text::keyword("eval").to(Token::Eval),
            text::keyword("rule").to(Token::Rule),
            text::keyword("case").to(Token::Case),
            text::keyword("when").to(Token::When),
            text::keyword("on").to(Token::On),
            text::keyword("input").to(Token::Input),
            text::keyword("use").to(Token::Use),
            text::keyword("with").to(Token::With),
            text::keyword("delegate").to(Token::Delegate),
            text::keyword("respond").to(Token::Respond),
            text::keyword("for").to(Token::For),
            text::keyword("each").to(Token::Each),
            text::keyword("in").to(Token::In),
            text::keyword("if").to(Token::If),
            text::keyword("else").to(Token::Else),
            text::keyword("required").to(Token::Required),
            text::keyword("store").to(Token::Store),
            text::keyword("env").to(Token::Env),
            text::keyword("command").to(Token::Command),
            text::keyword("deny").to(Token::Deny),
            text::keyword("require").to(Token::Require),
        )),
        choice((
            text::keyword("allow").to(Token::Allow),
            text::keyword("enum").to(Token::Enum),
            text::keyword("list").to(Token::List),
            text::keyword("step").to(Token::Step),
            text::keyword("depends_on").to(Token::DependsOn),
            text::keyword("parallel").to(Token::Parallel),
            text::keyword("struct").to(Token::Struct),
            text::keyword("override").to(Token::Override),
            text::keyword("attribute").to(Token::Attribute),
            text::keyword("field").to(Token::Field),
            text::keyword("param").to(Token::Param),
            text::keyword("true").to(Token::True),
            text::keyword("false").to(Token::False),
        )),
    ));

    let punctuation = choice((
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just('.').to(Token::Dot),
        just('@').to(Token::At),
    ));

    let ident = text::ident().map(Token::Ident);
    let newline = just('\n').to(Token::Newline);

    let token = choice((comment, string_lit, number, keyword, punctuation, ident, newline));

    let horizontal_ws = one_of(" \t\r").repeated();

    token.map_with(|tok, e| (tok, e.span())).padded_by(horizontal_ws).repeated().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let input = r#"package "demo" version "0.1.0""#;
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Package,
                Token::StringLit("demo"),
                Token::Version,
                Token::StringLit("0.1.0"),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let input = r#""line1\nline2\"quoted\"""#;
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::StringLit("line1\nline2\"quoted\"")]);
    }

    #[test]
    fn test_comments_both_styles() {
        let input = "# hash comment\n// slash comment\n";
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Comment(" hash comment"),
                Token::Newline,
                Token::Comment(" slash comment"),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_negative_number() {
        let input = "-3.5";
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::NumberLit(-3.5)]);
    }

    #[test]
    fn test_reference_tokens() {
        let input = "@variables.order_id";
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::At, Token::Ident("variables"), Token::Dot, Token::Ident("order_id")]
        );
    }

    #[test]
    fn test_block_skeleton() {
        let input = "agent \"bot\" {\n  model \"m\"\n}";
        let result = lexer().parse(input).into_result();
        assert!(result.is_ok());
        let tokens: Vec<_> = result.unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Agent,
                Token::StringLit("bot"),
                Token::LBrace,
                Token::Newline,
                Token::Ident("model"),
                Token::StringLit("m"),
                Token::Newline,
                Token::RBrace,
            ]
        );
    }
}
