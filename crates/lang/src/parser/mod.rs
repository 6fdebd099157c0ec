//! Parser for IntentLang source code.
//!
//! Two phases: [`crate::lexer`] turns source into a token stream, then this
//! module's chumsky combinators turn the token stream into an [`IntentFile`].
//! A resource block is always `keyword "name" [modifiers] { ... }`; each
//! resource kind gets its own body parser in [`agent`], [`tool`], or
//! [`simple`].
//!
//! Error recovery synchronizes to the next top-level keyword (or `import`)
//! on a syntax error, so one malformed resource doesn't swallow the rest of
//! the file — every error found in one pass is collected, not just the
//! first.

pub mod agent;
pub mod body;
pub mod primitives;
pub mod simple;
pub mod tool;

use crate::ast::{IntentFile, Resource, ResourceKind, Spanned};
use crate::error::ParseErrorInfo;
use crate::lexer::{self, Token};
use chumsky::input::Input as _;
use chumsky::prelude::*;
use chumsky::recovery::skip_then_retry_until;
use primitives::*;

enum TopLevel {
    Import(crate::ast::Import),
    Resource(Resource),
}

fn resource<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Resource, Err<'tokens, 'src>> + Clone {
    macro_rules! kind {
        ($tok:expr, $parser:expr, $variant:ident) => {
            just($tok).ignore_then(spanned_string()).then($parser).map(|(name, def)| (name, ResourceKind::$variant(def)))
        };
    }

    let agent = kind!(Token::Agent, agent::agent_def(), Agent);
    let prompt = kind!(Token::Prompt, simple::prompt_def(), Prompt);
    let skill = kind!(Token::Skill, tool::skill_def(), Skill);
    let tool_res = kind!(Token::Tool, tool::tool_def(), Tool);
    let mcp_server = kind!(Token::Server, tool::mcp_server_def(), MCPServer);
    let mcp_client = kind!(Token::Client, tool::mcp_client_def(), MCPClient);
    let secret = kind!(Token::Secret, simple::secret_def(), Secret);
    let policy = kind!(Token::Policy, simple::policy_def(), Policy);
    let environment = kind!(Token::Environment, simple::environment_def(), Environment);
    let pipeline = kind!(Token::Pipeline, simple::pipeline_def(), Pipeline);
    let binding = kind!(Token::Deploy, simple::binding_def(), Binding);
    let plugin = kind!(Token::Plugin, simple::plugin_def(), Plugin);
    let type_res = kind!(Token::Type, simple::type_def(), Type);

    choice((
        agent, prompt, skill, tool_res, mcp_server, mcp_client, secret, policy, environment,
        pipeline, binding, plugin, type_res,
    ))
    .map_with(|(name, kind), e| Resource { name, kind, span: to_ast_span(e.span()) })
}

fn recovery_tokens<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), Err<'tokens, 'src>> + Clone {
    choice((
        just(Token::Import).ignored(),
        just(Token::Agent).ignored(),
        just(Token::Prompt).ignored(),
        just(Token::Skill).ignored(),
        just(Token::Tool).ignored(),
        just(Token::Server).ignored(),
        just(Token::Client).ignored(),
        just(Token::Secret).ignored(),
        just(Token::Policy).ignored(),
        just(Token::Environment).ignored(),
        just(Token::Pipeline).ignored(),
        just(Token::Deploy).ignored(),
        just(Token::Plugin).ignored(),
        just(Token::Type).ignored(),
    ))
}

fn intent_file_parser<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, IntentFile, Err<'tokens, 'src>> + Clone {
    let top = skip_noise().ignore_then(choice((
        simple::import().map(TopLevel::Import),
        resource().map(TopLevel::Resource),
    )));

    skip_noise()
        .ignore_then(simple::package_header())
        .then(
            top.recover_with(skip_then_retry_until(any().ignored(), recovery_tokens()))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(skip_noise())
        .then_ignore(end())
        .map(|(package, items)| {
            let mut file = IntentFile { package: Some(package), imports: Vec::new(), resources: Vec::new() };
            for item in items {
                match item {
                    TopLevel::Import(i) => file.imports.push(i),
                    TopLevel::Resource(r) => file.resources.push(r),
                }
            }
            file
        })
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    crate::error::line_col(source, offset)
}

/// Parse IntentLang source. Returns `Ok` only if parsing succeeds with no
/// errors; use [`parse_with_errors`] to get a partial AST alongside every
/// diagnostic found in one pass.
pub fn parse(source: &str) -> Result<IntentFile, Vec<String>> {
    let (result, errors) = parse_with_errors(source);
    if !errors.is_empty() {
        return Err(errors);
    }
    result.ok_or_else(|| vec!["unknown parse error".to_string()])
}

/// Parse IntentLang source, returning a partial AST (if recovery produced
/// one) and every error collected across the whole file.
pub fn parse_with_errors(source: &str) -> (Option<IntentFile>, Vec<String>) {
    let tokens = lexer::lexer().parse(source);
    let Some(tokens) = tokens.into_output() else {
        return (None, vec!["lex error: invalid token stream".to_string()]);
    };
    let eoi = SimpleSpan::new((), source.len()..source.len());
    let stream = tokens.as_slice().map(eoi, |(t, s)| (t, s));
    let (result, errs) = intent_file_parser().parse(stream).into_output_errors();

    let errors = errs
        .iter()
        .map(|e| {
            let (line, col) = offset_to_line_col(source, e.span().start);
            let expected: Vec<String> = e.expected().map(|t| format!("{t}")).collect();
            let found = e.found().map(|t| format!("{t}"));
            let mut msg = format!("{line}:{col}: ");
            match &found {
                Some(f) => msg.push_str(&format!("found '{f}'")),
                None => msg.push_str("found end of input"),
            }
            if !expected.is_empty() {
                msg.push_str(&format!(", expected one of: {}", expected.join(", ")));
            }
            msg
        })
        .collect();

    (result, errors)
}

/// Same as [`parse`] but carrying structured [`ParseErrorInfo`] (span,
/// expected set, found token) instead of pre-rendered strings, for
/// `--format json` and the LSP-shaped diagnostics surface.
pub fn parse_with_structured_errors(source: &str) -> Result<IntentFile, Vec<ParseErrorInfo>> {
    let (result, errors) = parse_with_structured_errors_all(source);
    if !errors.is_empty() {
        return Err(errors);
    }
    result.ok_or_else(|| {
        vec![ParseErrorInfo { message: "unknown parse error".to_string(), span: None, expected: vec![], found: None }]
    })
}

pub fn parse_with_structured_errors_all(source: &str) -> (Option<IntentFile>, Vec<ParseErrorInfo>) {
    let tokens = lexer::lexer().parse(source);
    let Some(tokens) = tokens.into_output() else {
        return (
            None,
            vec![ParseErrorInfo {
                message: "invalid token stream".to_string(),
                span: None,
                expected: vec![],
                found: None,
            }],
        );
    };
    let eoi = SimpleSpan::new((), source.len()..source.len());
    let stream = tokens.as_slice().map(eoi, |(t, s)| (t, s));
    let (result, errs) = intent_file_parser().parse(stream).into_output_errors();

    let errors = errs
        .iter()
        .map(|e| ParseErrorInfo {
            message: format!("parse error at {:?}", e.reason()),
            span: Some(e.span().start..e.span().end),
            expected: e.expected().map(|t| format!("{t}")).collect(),
            found: e.found().map(|t| format!("{t}")),
        })
        .collect();

    (result, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_package_header() {
        let source = r#"package "demo" version "0.1.0" lang "2.0""#;
        let file = parse(source).expect("parse");
        let pkg = file.package.unwrap();
        assert_eq!(pkg.name.node, "demo");
        assert_eq!(pkg.version.node, "0.1.0");
        assert_eq!(pkg.lang_version.node, "2.0");
        assert!(file.resources.is_empty());
    }

    #[test]
    fn parses_s1_happy_path() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

prompt "greet" {
  content "Hello"
}

skill "search" {
  tool command {
    binary "search"
  }
}

agent "bot" {
  model "m"
  uses prompt "greet"
  uses skill "search"
}

deploy "local" target "process" {
  default true
}
"#;
        let file = parse(source).expect("parse");
        assert_eq!(file.resources.len(), 4);
        let tags: Vec<_> = file.resources.iter().map(|r| r.kind.tag()).collect();
        assert_eq!(tags, vec!["Prompt", "Skill", "Agent", "Binding"]);
    }

    #[test]
    fn recovers_after_bad_resource_and_keeps_parsing() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

prompt "broken" {
  this is not valid {{{
}

prompt "ok" {
  content "fine"
}
"#;
        let (file, errors) = parse_with_errors(source);
        assert!(!errors.is_empty());
        let file = file.expect("partial AST despite errors");
        assert!(file.resources.iter().any(|r| r.name.node == "ok"));
    }

    #[test]
    fn import_with_version_and_alias() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"
import "shared/prompts" version "1.2.0" as shared
"#;
        let file = parse(source).expect("parse");
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].path.node, "shared/prompts");
        assert_eq!(file.imports[0].version.as_ref().unwrap().node, "1.2.0");
        assert_eq!(file.imports[0].alias.as_ref().unwrap().node, "shared");
        assert!(!file.imports[0].is_local());
    }
}
