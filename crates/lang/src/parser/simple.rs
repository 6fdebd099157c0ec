//! Parsers for the resource bodies that don't need a recursive grammar:
//! package header, import, prompt, secret, policy, environment, pipeline,
//! binding, plugin and type.

use super::body::*;
use super::primitives::*;
use crate::ast::*;
use crate::lexer::Token;
use chumsky::prelude::*;

pub fn package_header<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PackageHeader, Err<'tokens, 'src>> + Clone {
    just(Token::Package)
        .ignore_then(spanned_string())
        .then_ignore(just(Token::Version))
        .then(spanned_string())
        .then_ignore(just(Token::Lang))
        .then(spanned_string())
        .map_with(|((name, version), lang_version), e| PackageHeader {
            name,
            version,
            lang_version,
            span: to_ast_span(e.span()),
        })
}

pub fn import<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Import, Err<'tokens, 'src>> + Clone {
    just(Token::Import)
        .ignore_then(spanned_string())
        .then(just(Token::Version).ignore_then(spanned_string()).or_not())
        .then(just(Token::As).ignore_then(spanned_ident()).or_not())
        .map_with(|((path, version), alias), e| Import {
            path,
            version,
            alias,
            span: to_ast_span(e.span()),
        })
}

pub fn prompt_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PromptDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Content(Spanned<String>),
        Attr(Attribute),
    }
    let content_line = ident_eq("content").ignore_then(spanned_string()).map(Line::Content);
    let line = choice((content_line, attribute_line().map(Line::Attr)));
    braced(lines(line)).map(|items| {
        let mut content = None;
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Content(c) => content = Some(c),
                Line::Attr(a) => attributes.push(a),
            }
        }
        PromptDef { content: content.unwrap_or_else(|| Spanned::new(String::new(), 0..0)), attributes }
    })
}

pub fn secret_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, SecretDef, Err<'tokens, 'src>> + Clone {
    let source = choice((
        just(Token::Env)
            .ignore_then(spanned_string())
            .map(|var_name| SecretSource::Env { var_name }),
        just(Token::Store)
            .ignore_then(spanned_string())
            .map(|store_name| SecretSource::Store { store_name }),
    ))
    .map_with(|s, e| Spanned::new(s, to_ast_span(e.span())));
    braced(source).map(|source| SecretDef { source })
}

fn policy_action<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PolicyAction, Err<'tokens, 'src>> + Clone {
    choice((
        just(Token::Deny).to(PolicyAction::Deny),
        just(Token::Require).to(PolicyAction::Require),
        just(Token::Allow).to(PolicyAction::Allow),
    ))
}

fn policy_subject_type<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PolicySubjectType, Err<'tokens, 'src>> + Clone
{
    choice((
        just(Token::Skill).to(PolicySubjectType::Skill),
        just(Token::Secret).to(PolicySubjectType::Secret),
        ident_eq("model").to(PolicySubjectType::Model),
        ident_eq("pinned_imports").to(PolicySubjectType::PinnedImports),
        ident_eq("signed_packages").to(PolicySubjectType::SignedPackages),
    ))
}

fn policy_rule<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PolicyRule, Err<'tokens, 'src>> + Clone {
    just(Token::Rule)
        .ignore_then(policy_action())
        .then(policy_subject_type())
        .then(spanned_string().or_not())
        .map_with(|((action, subject_type), subject_name), e| PolicyRule {
            action,
            subject_type,
            subject_name,
            span: to_ast_span(e.span()),
        })
}

pub fn policy_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PolicyDef, Err<'tokens, 'src>> + Clone {
    braced(lines(policy_rule())).map(|rules| PolicyDef { rules })
}

/// The thirteen resource-kind keywords, as plain text, so `override <kind>`
/// can target any of them even though each is its own reserved token rather
/// than a generic `Ident`.
fn resource_kind_word<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, &'src str, Err<'tokens, 'src>> + Clone {
    choice((
        just(Token::Agent).to("agent"),
        just(Token::Prompt).to("prompt"),
        just(Token::Skill).to("skill"),
        just(Token::Tool).to("tool"),
        just(Token::Server).to("server"),
        just(Token::Client).to("client"),
        just(Token::Secret).to("secret"),
        just(Token::Policy).to("policy"),
        just(Token::Environment).to("environment"),
        just(Token::Pipeline).to("pipeline"),
        just(Token::Deploy).to("deploy"),
        just(Token::Plugin).to("plugin"),
        just(Token::Type).to("type"),
    ))
}

fn overlay_entry<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, OverlayEntry, Err<'tokens, 'src>> + Clone {
    just(Token::Override)
        .ignore_then(choice((ident(), resource_kind_word())))
        .then(spanned_string())
        .then_ignore(just(Token::Attribute))
        .then(spanned_string())
        .then(value_parser())
        .map_with(|(((kind, target_name), attribute), value), e| OverlayEntry {
            target_kind: kind.to_string(),
            target_name,
            attribute,
            value,
            span: to_ast_span(e.span()),
        })
}

pub fn environment_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, EnvironmentDef, Err<'tokens, 'src>> + Clone {
    braced(lines(overlay_entry())).map(|overrides| EnvironmentDef { overrides })
}

fn pipeline_step<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PipelineStep, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Agent(Reference),
        DependsOn(Spanned<String>),
        Parallel(bool),
    }
    let line = choice((
        reference_after(Token::Agent, "Agent").map(Line::Agent),
        just(Token::DependsOn).ignore_then(spanned_string()).map(Line::DependsOn),
        just(Token::Parallel).ignore_then(bool_lit()).map(Line::Parallel),
    ));
    just(Token::Step)
        .ignore_then(spanned_string())
        .then(braced(lines(line)))
        .map_with(|(name, items), e| {
            let mut agent = None;
            let mut depends_on = Vec::new();
            let mut parallel = false;
            for item in items {
                match item {
                    Line::Agent(a) => agent = Some(a),
                    Line::DependsOn(s) => depends_on.push(s),
                    Line::Parallel(p) => parallel = p,
                }
            }
            let span = to_ast_span(e.span());
            let agent = agent.unwrap_or_else(|| Reference {
                kind: "Agent".to_string(),
                name: Spanned::new(String::new(), span.clone()),
                span: span.clone(),
            });
            PipelineStep { name, agent, depends_on, parallel, span }
        })
}

pub fn pipeline_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PipelineDef, Err<'tokens, 'src>> + Clone {
    braced(lines(pipeline_step())).map(|steps| PipelineDef { steps })
}

pub fn binding_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, BindingDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Default(bool),
        Attr(Attribute),
    }
    let line = choice((
        ident_eq("default").ignore_then(bool_lit()).map(Line::Default),
        attribute_line().map(Line::Attr),
    ));
    just(Token::Target)
        .ignore_then(spanned_string())
        .then(braced(lines(line)))
        .map(|(target, items)| {
            let mut default = false;
            let mut attributes = Vec::new();
            for item in items {
                match item {
                    Line::Default(d) => default = d,
                    Line::Attr(a) => attributes.push(a),
                }
            }
            BindingDef { target, default, attributes }
        })
}

pub fn plugin_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, PluginDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Version(Spanned<String>),
        Attr(Attribute),
    }
    let line = choice((
        just(Token::Version).ignore_then(spanned_string()).map(Line::Version),
        attribute_line().map(Line::Attr),
    ));
    braced(lines(line)).map(|items| {
        let mut version = None;
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Version(v) => version = Some(v),
                Line::Attr(a) => attributes.push(a),
            }
        }
        PluginDef { version: version.unwrap_or_else(|| Spanned::new(String::new(), 0..0)), attributes }
    })
}

fn param_type<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ParamType, Err<'tokens, 'src>> + Clone {
    choice((
        ident_eq("string").to(ParamType::String),
        ident_eq("int").to(ParamType::Int),
        ident_eq("float").to(ParamType::Float),
        ident_eq("bool").to(ParamType::Bool),
    ))
}

fn spanned_param_type<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<ParamType>, Err<'tokens, 'src>> + Clone
{
    param_type().map_with(|t, e| Spanned::new(t, to_ast_span(e.span())))
}

pub fn type_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, TypeDef, Err<'tokens, 'src>> + Clone {
    let field = just(Token::Field)
        .ignore_then(spanned_string())
        .then(spanned_param_type())
        .map(|(name, ty)| (name, ty));
    let struct_def =
        just(Token::Struct).ignore_then(braced(lines(field))).map(|fields| TypeDef::Struct { fields });

    let case = just(Token::Case).ignore_then(spanned_string());
    let enum_def =
        just(Token::Enum).ignore_then(braced(lines(case))).map(|variants| TypeDef::Enum { variants });

    let list_def = just(Token::List).ignore_then(spanned_param_type()).map(|element| TypeDef::List { element });

    choice((struct_def, enum_def, list_def))
}
