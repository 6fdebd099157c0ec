//! Unified diagnostic rendering (§7): every stage's error type is reduced
//! to one `Diag` shape so `--format text`/`--format json` don't need a
//! separate renderer per compiler phase.

use agentspec_lang::error::{line_col, ParseErrorInfo, ValidationError};
use agentspec_lang::Diagnostic;
use agentspec_semantic::SemanticError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Diag {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub code: String,
    pub message: String,
    pub hint: Option<String>,
}

impl Diag {
    pub fn to_text(&self) -> String {
        let mut out = format!("{}:{}:{}: error: {}\n", self.file, self.line, self.col, self.message);
        if let Some(hint) = &self.hint {
            out.push_str(&format!("  hint: {hint}\n"));
        }
        out
    }
}

pub fn from_parse_errors(file: &str, source: &str, errors: &[ParseErrorInfo]) -> Vec<Diag> {
    errors
        .iter()
        .map(|e| {
            let (line, col) = e.span.as_ref().map(|s| line_col(source, s.start)).unwrap_or((1, 1));
            Diag { file: file.to_string(), line, col, code: "ParseError".to_string(), message: e.to_string(), hint: None }
        })
        .collect()
}

pub fn from_validation_errors(file: &str, source: &str, errors: &[ValidationError]) -> Vec<Diag> {
    errors
        .iter()
        .map(|e| {
            let (line, col) = e.span().map(|s| line_col(source, s.start)).unwrap_or((1, 1));
            Diag { file: file.to_string(), line, col, code: e.code().to_string(), message: e.message(), hint: e.hint() }
        })
        .collect()
}

pub fn from_semantic_errors(file: &str, source: &str, errors: &[SemanticError]) -> Vec<Diag> {
    errors
        .iter()
        .map(|e| {
            let span = semantic_span(e);
            let (line, col) = span.map(|s| line_col(source, s.start)).unwrap_or((1, 1));
            Diag { file: file.to_string(), line, col, code: e.code().to_string(), message: e.to_string(), hint: e.hint() }
        })
        .collect()
}

fn semantic_span(error: &SemanticError) -> Option<agentspec_lang::ast::Span> {
    match error {
        SemanticError::Reference { span, .. } => span.clone(),
        SemanticError::Duplicate { second_span, .. } => second_span.clone(),
        SemanticError::SecretLiteral { span, .. } => span.clone(),
        SemanticError::Policy { span, .. } => span.clone(),
        SemanticError::Import { .. } => None,
    }
}

pub fn render_text(diags: &[Diag]) -> String {
    diags.iter().map(Diag::to_text).collect::<Vec<_>>().join("")
}

pub fn render_json(diags: &[Diag]) -> String {
    serde_json::to_string_pretty(diags).unwrap_or_else(|_| "[]".to_string())
}
