//! Parser for the `Agent` resource body: config params, validation rules,
//! and the `on input { ... }` control-flow tree.

use super::body::*;
use super::primitives::*;
use crate::ast::*;
use crate::lexer::Token;
use chumsky::prelude::*;
use indexmap::IndexMap;

fn param_type<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ParamType, Err<'tokens, 'src>> + Clone {
    choice((
        ident_eq("string").to(ParamType::String),
        ident_eq("int").to(ParamType::Int),
        ident_eq("float").to(ParamType::Float),
        ident_eq("bool").to(ParamType::Bool),
    ))
}

#[derive(Clone)]
enum ParamFlag {
    Required,
    Secret,
    Default(Spanned<Value>),
}

fn config_param<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<ConfigParam>, Err<'tokens, 'src>> + Clone
{
    let flag = choice((
        just(Token::Required).to(ParamFlag::Required),
        ident_eq("secret").to(ParamFlag::Secret),
        ident_eq("default").ignore_then(value_parser()).map(ParamFlag::Default),
    ));
    just(Token::Param)
        .ignore_then(spanned_string())
        .then_ignore(just(Token::Type))
        .then(param_type().map_with(|t, e| Spanned::new(t, to_ast_span(e.span()))))
        .then(flag.repeated().collect::<Vec<_>>())
        .map_with(|((name, ty), flags), e| {
            let mut required = false;
            let mut secret = false;
            let mut default = None;
            for flag in flags {
                match flag {
                    ParamFlag::Required => required = true,
                    ParamFlag::Secret => secret = true,
                    ParamFlag::Default(v) => default = Some(v),
                }
            }
            Spanned::new(
                ConfigParam { name, ty, required, default, secret, span: to_ast_span(e.span()) },
                to_ast_span(e.span()),
            )
        })
}

fn config_block<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Vec<Spanned<ConfigParam>>, Err<'tokens, 'src>> + Clone
{
    just(Token::Config).ignore_then(braced(lines(config_param())))
}

#[derive(Clone)]
enum RuleLine {
    Severity(Severity),
    Message(Spanned<String>),
    When(Spanned<String>),
    MaxRetries(u32),
}

fn validation_rule<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<ValidationRule>, Err<'tokens, 'src>> + Clone
{
    let line = choice((
        ident_eq("severity")
            .ignore_then(choice((ident_eq("error").to(Severity::Error), ident_eq("warning").to(Severity::Warning))))
            .map(RuleLine::Severity),
        ident_eq("message").ignore_then(spanned_string()).map(RuleLine::Message),
        just(Token::When).ignore_then(spanned_string()).map(RuleLine::When),
        ident_eq("max_retries").ignore_then(number_lit()).map(|n| RuleLine::MaxRetries(n as u32)),
    ));
    just(Token::Rule)
        .ignore_then(spanned_string())
        .then(braced(lines(line)))
        .map_with(|(name, items), e| {
            let mut severity = Severity::Error;
            let mut message = Spanned::new(String::new(), 0..0);
            let mut when_expression = Spanned::new(String::new(), 0..0);
            let mut max_retries = None;
            for item in items {
                match item {
                    RuleLine::Severity(s) => severity = s,
                    RuleLine::Message(m) => message = m,
                    RuleLine::When(w) => when_expression = w,
                    RuleLine::MaxRetries(n) => max_retries = Some(n),
                }
            }
            Spanned::new(
                ValidationRule {
                    name,
                    severity,
                    message,
                    when_expression,
                    max_retries,
                    span: to_ast_span(e.span()),
                },
                to_ast_span(e.span()),
            )
        })
}

fn validate_block<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Vec<Spanned<ValidationRule>>, Err<'tokens, 'src>> + Clone
{
    just(Token::Validate).ignore_then(braced(lines(validation_rule())))
}

fn with_args<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, IndexMap<String, Spanned<String>>, Err<'tokens, 'src>> + Clone
{
    let entry = ident().then_ignore(just(Token::Colon)).then(spanned_string());
    just(Token::With)
        .ignore_then(braced(
            entry.separated_by(just(Token::Comma)).allow_trailing().collect::<Vec<_>>(),
        ))
        .or_not()
        .map(|entries| {
            entries
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect()
        })
}

pub fn statement<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Statement>, Err<'tokens, 'src>> + Clone {
    recursive(|statement| {
        let block = braced(lines(statement.clone()));

        let if_stmt = just(Token::If)
            .ignore_then(spanned_string())
            .then(block.clone())
            .then(
                just(Token::Else)
                    .ignore_then(just(Token::If))
                    .ignore_then(spanned_string())
                    .then(block.clone())
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then(just(Token::Else).ignore_then(block.clone()).or_not())
            .map(|(((cond, then_branch), elifs), else_branch)| Statement::If {
                cond,
                then_branch,
                elifs,
                else_branch: else_branch.unwrap_or_default(),
            });

        let for_each = just(Token::For)
            .ignore_then(just(Token::Each))
            .ignore_then(spanned_ident())
            .then_ignore(just(Token::In))
            .then(spanned_string())
            .then(block.clone())
            .map(|((var, collection), body)| Statement::ForEach { var, collection, body });

        let use_skill = just(Token::Use)
            .ignore_then(just(Token::Skill))
            .ignore_then(spanned_string())
            .then(with_args())
            .map(|(name, args)| Statement::UseSkill { name, args });

        let delegate_to = just(Token::Delegate)
            .ignore_then(just(Token::To))
            .ignore_then(spanned_string())
            .map(|agent| Statement::DelegateTo { agent });

        let respond =
            just(Token::Respond).ignore_then(spanned_string()).map(|literal| Statement::Respond { literal });

        choice((if_stmt, for_each, use_skill, delegate_to, respond))
            .map_with(|s, e| Spanned::new(s, to_ast_span(e.span())))
    })
}

pub fn agent_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, AgentDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Model(Spanned<String>),
        UsesPrompt(Reference),
        UsesSkill(Reference),
        Config(Vec<Spanned<ConfigParam>>),
        Validate(Vec<Spanned<ValidationRule>>),
        OnInput(Vec<Spanned<Statement>>),
        Attr(Attribute),
    }
    let uses_line = just(Token::Uses).ignore_then(choice((
        reference_after(Token::Prompt, "Prompt").map(Line::UsesPrompt),
        reference_after(Token::Skill, "Skill").map(Line::UsesSkill),
    )));
    let on_input = just(Token::On).ignore_then(just(Token::Input)).ignore_then(braced(lines(statement())));
    let line = choice((
        ident_eq("model").ignore_then(spanned_string()).map(Line::Model),
        uses_line,
        config_block().map(Line::Config),
        validate_block().map(Line::Validate),
        on_input.map(Line::OnInput),
        attribute_line().map(Line::Attr),
    ));
    braced(lines(line)).map(|items| {
        let mut model = None;
        let mut uses_prompts = Vec::new();
        let mut uses_skills = Vec::new();
        let mut config_params = Vec::new();
        let mut validation_rules = Vec::new();
        let mut on_input = Vec::new();
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Model(m) => model = Some(m),
                Line::UsesPrompt(r) => uses_prompts.push(r),
                Line::UsesSkill(r) => uses_skills.push(r),
                Line::Config(mut c) => config_params.append(&mut c),
                Line::Validate(mut v) => validation_rules.append(&mut v),
                Line::OnInput(mut s) => on_input.append(&mut s),
                Line::Attr(a) => attributes.push(a),
            }
        }
        AgentDef { model, uses_prompts, uses_skills, config_params, validation_rules, on_input, attributes }
    })
}
