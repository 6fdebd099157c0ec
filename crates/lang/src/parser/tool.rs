//! Parsers for `Tool`, `Skill`, and the `Transport` shared by MCP-flavored
//! tools, servers and clients.

use super::body::*;
use super::primitives::*;
use crate::ast::*;
use crate::lexer::Token;
use chumsky::prelude::*;

#[derive(Clone)]
enum UrlAuthLine {
    Url(Spanned<String>),
    Auth(Spanned<String>),
}

fn url_auth_lines<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (Option<Spanned<String>>, Option<Spanned<String>>), Err<'tokens, 'src>>
       + Clone {
    let line = choice((
        ident_eq("url").ignore_then(spanned_string()).map(UrlAuthLine::Url),
        ident_eq("auth").ignore_then(spanned_string()).map(UrlAuthLine::Auth),
    ));
    lines(line).map(|items| {
        let mut url = None;
        let mut auth = None;
        for item in items {
            match item {
                UrlAuthLine::Url(u) => url = Some(u),
                UrlAuthLine::Auth(a) => auth = Some(a),
            }
        }
        (url, auth)
    })
}

pub fn transport<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Transport, Err<'tokens, 'src>> + Clone {
    let stdio = ident_eq("stdio")
        .ignore_then(braced(just(Token::Command).ignore_then(spanned_string()).or_not()))
        .map(|command| Transport::Stdio { command });
    let sse = ident_eq("sse")
        .ignore_then(braced(url_auth_lines()))
        .map(|(url, auth)| Transport::Sse { url, auth });
    let streamable_http = ident_eq("streamable_http")
        .ignore_then(braced(url_auth_lines()))
        .map(|(url, auth)| Transport::StreamableHttp { url, auth });
    choice((stdio, sse, streamable_http))
}

pub fn spanned_transport<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<Transport>, Err<'tokens, 'src>> + Clone
{
    transport().map_with(|t, e| Spanned::new(t, to_ast_span(e.span())))
}

pub fn tool_spec<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ToolSpec, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum ArgLine {
        Binary(Spanned<String>),
        Args(Vec<Spanned<Value>>),
    }
    let command = just(Token::Command)
        .ignore_then(braced(lines(choice((
            ident_eq("binary").ignore_then(spanned_string()).map(ArgLine::Binary),
            ident_eq("args")
                .ignore_then(value_parser())
                .map(|v| match v.node {
                    Value::List(items) => ArgLine::Args(items),
                    other => ArgLine::Args(vec![Spanned::new(other, v.span)]),
                }),
        )))))
        .map(|items| {
            let mut binary = None;
            let mut args = Vec::new();
            for item in items {
                match item {
                    ArgLine::Binary(b) => binary = Some(b),
                    ArgLine::Args(a) => args = a,
                }
            }
            ToolSpec::Command { binary: binary.unwrap_or_else(|| Spanned::new(String::new(), 0..0)), args }
        });

    #[derive(Clone)]
    enum HttpLine {
        Url(Spanned<String>),
        Method(Spanned<String>),
    }
    let http = ident_eq("http")
        .ignore_then(braced(lines(choice((
            ident_eq("url").ignore_then(spanned_string()).map(HttpLine::Url),
            ident_eq("method").ignore_then(spanned_string()).map(HttpLine::Method),
        )))))
        .map(|items| {
            let mut url = None;
            let mut method = None;
            for item in items {
                match item {
                    HttpLine::Url(u) => url = Some(u),
                    HttpLine::Method(m) => method = Some(m),
                }
            }
            ToolSpec::Http { url: url.unwrap_or_else(|| Spanned::new(String::new(), 0..0)), method }
        });

    let inline = ident_eq("inline")
        .ignore_then(braced(ident_eq("body").ignore_then(spanned_string())))
        .map(|body| ToolSpec::Inline { body });

    let mcp =
        ident_eq("mcp").ignore_then(braced(spanned_transport())).map(|transport| ToolSpec::Mcp { transport });

    choice((command, http, inline, mcp))
}

pub fn spanned_tool_spec<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Spanned<ToolSpec>, Err<'tokens, 'src>> + Clone
{
    tool_spec().map_with(|s, e| Spanned::new(s, to_ast_span(e.span())))
}

pub fn skill_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, SkillDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        InlineTool(Spanned<ToolSpec>),
        UsesTool(Reference),
        Attr(Attribute),
    }
    let inline_tool_line = just(Token::Tool).ignore_then(spanned_tool_spec()).map(Line::InlineTool);
    let uses_tool_line =
        just(Token::Uses).ignore_then(reference_after(Token::Tool, "Tool")).map(Line::UsesTool);
    let line = choice((uses_tool_line, inline_tool_line, attribute_line().map(Line::Attr)));
    braced(lines(line)).map(|items| {
        let mut inline_tool = None;
        let mut uses_tool = None;
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::InlineTool(t) => inline_tool = Some(t),
                Line::UsesTool(r) => uses_tool = Some(r),
                Line::Attr(a) => attributes.push(a),
            }
        }
        SkillDef { inline_tool, uses_tool, attributes }
    })
}

pub fn tool_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ToolDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Spec(Spanned<ToolSpec>),
        Attr(Attribute),
    }
    let line = choice((spanned_tool_spec().map(Line::Spec), attribute_line().map(Line::Attr)));
    braced(lines(line)).map(|items| {
        let mut spec = None;
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Spec(s) => spec = Some(s),
                Line::Attr(a) => attributes.push(a),
            }
        }
        let spec = spec.unwrap_or_else(|| {
            Spanned::new(ToolSpec::Inline { body: Spanned::new(String::new(), 0..0) }, 0..0)
        });
        ToolDef { spec, attributes }
    })
}

pub fn mcp_server_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, MCPServerDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Transport(Spanned<Transport>),
        Exposes(Reference),
        Attr(Attribute),
    }
    let line = choice((
        spanned_transport().map(Line::Transport),
        just(Token::Exposes).ignore_then(reference_after(Token::Skill, "Skill")).map(Line::Exposes),
        attribute_line().map(Line::Attr),
    ));
    braced(lines(line)).map(|items| {
        let mut transport = None;
        let mut exposes_skills = Vec::new();
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Transport(t) => transport = Some(t),
                Line::Exposes(r) => exposes_skills.push(r),
                Line::Attr(a) => attributes.push(a),
            }
        }
        let transport = transport.unwrap_or_else(|| Spanned::new(Transport::Stdio { command: None }, 0..0));
        MCPServerDef { transport, exposes_skills, attributes }
    })
}

pub fn mcp_client_def<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, MCPClientDef, Err<'tokens, 'src>> + Clone {
    #[derive(Clone)]
    enum Line {
        Connects(Reference),
        Attr(Attribute),
    }
    let line = choice((
        just(Token::Connects)
            .ignore_then(just(Token::To))
            .ignore_then(reference_after(Token::Server, "MCPServer"))
            .map(Line::Connects),
        attribute_line().map(Line::Attr),
    ));
    braced(lines(line)).map(|items| {
        let mut connects_to_servers = Vec::new();
        let mut attributes = Vec::new();
        for item in items {
            match item {
                Line::Connects(r) => connects_to_servers.push(r),
                Line::Attr(a) => attributes.push(a),
            }
        }
        MCPClientDef { connects_to_servers, attributes }
    })
}
