//! Error types and pretty error reporting for IntentLang.
//!
//! Mirrors the error taxonomy of the front-end compiler (`LexError`,
//! `ParseError`, `StructuralError`): every diagnostic carries a byte span
//! into the originating source and an optional actionable hint, and can be
//! rendered either as colorful terminal output (via `ariadne`) or as plain
//! `file:line:col: error: message` / `--format json` text.

use ariadne::{Color, Label, Report, ReportKind, Source};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// The main error type for IntentLang compiler front-end operations.
#[derive(Debug)]
pub enum AgentSpecError {
    Lex(ParseErrorInfo),
    Parse(ParseErrorInfo),
    Structural(ValidationError),
}

impl fmt::Display for AgentSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSpecError::Lex(e) => write!(f, "Lex error: {}", e),
            AgentSpecError::Parse(e) => write!(f, "Parse error: {}", e),
            AgentSpecError::Structural(e) => write!(f, "Structural error: {}", e),
        }
    }
}

impl std::error::Error for AgentSpecError {}

/// Information about a lex or parse error.
#[derive(Debug, Clone, Serialize)]
pub struct ParseErrorInfo {
    pub message: String,
    pub span: Option<Range<usize>>,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl fmt::Display for ParseErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref found) = self.found {
            write!(f, ", found '{}'", found)?;
        }
        if !self.expected.is_empty() {
            write!(f, ", expected one of: {}", self.expected.join(", "))?;
        }
        Ok(())
    }
}

/// A structural/semantic validation diagnostic with `file:line:col: error:
/// message` plus `hint:` rendering (§7).
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    pub span: Option<Range<usize>>,
    pub hint: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref hint) = self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Implemented by every crate's error type, so the CLI's renderer never has
/// to match on concrete error enums.
pub trait Diagnostic {
    fn code(&self) -> &'static str;
    fn message(&self) -> String;
    fn span(&self) -> Option<Range<usize>>;
    fn hint(&self) -> Option<String>;
}

impl Diagnostic for ValidationError {
    fn code(&self) -> &'static str {
        self.code
    }
    fn message(&self) -> String {
        self.message.clone()
    }
    fn span(&self) -> Option<Range<usize>> {
        self.span.clone()
    }
    fn hint(&self) -> Option<String> {
        self.hint.clone()
    }
}

/// Convert a byte offset to a 1-based (line, column) within `source`.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut col = 1;
    for ch in source[..offset].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Render a diagnostic as `<file>:<line>:<col>: error: <message>` plus an
/// indented `hint:` line, as required by §7's user-visible behavior.
pub fn render_text(file: &str, source: &str, diag: &dyn Diagnostic) -> String {
    let (line, col) = diag.span().map(|s| line_col(source, s.start)).unwrap_or((1, 1));
    let mut out = format!("{}:{}:{}: error: {}\n", file, line, col, diag.message());
    if let Some(hint) = diag.hint() {
        out.push_str(&format!("  hint: {}\n", hint));
    }
    out
}

/// Error reporter that uses ariadne for pretty terminal error output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self { source_name: source_name.into(), source }
    }

    pub fn report_parse_error(&self, error: &ParseErrorInfo) {
        let span = error.span.clone().unwrap_or(0..0);
        let mut report = Report::build(ReportKind::Error, &self.source_name, span.start)
            .with_message(&error.message);

        let mut label = Label::new((&self.source_name, span.clone())).with_color(Color::Red);
        if let Some(ref found) = error.found {
            label = label.with_message(format!("found '{}'", found));
        }
        report = report.with_label(label);

        if !error.expected.is_empty() {
            report = report.with_note(format!("expected one of: {}", error.expected.join(", ")));
        }

        report.finish().eprint((&self.source_name, Source::from(self.source))).ok();
    }

    pub fn report_validation_error(&self, error: &ValidationError) {
        let span = error.span.clone().unwrap_or(0..0);
        let mut report = Report::build(ReportKind::Error, &self.source_name, span.start)
            .with_message(&error.message)
            .with_label(
                Label::new((&self.source_name, span)).with_color(Color::Yellow).with_message("here"),
            );

        if let Some(ref hint) = error.hint {
            report = report.with_help(hint);
        }

        report.finish().eprint((&self.source_name, Source::from(self.source))).ok();
    }
}

pub type Result<T> = std::result::Result<T, AgentSpecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let src = "abc\ndef\nghi";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 4), (2, 1));
        assert_eq!(line_col(src, 9), (3, 2));
    }

    #[test]
    fn render_text_includes_hint() {
        let diag = ValidationError {
            code: "ReferenceError",
            message: "skill \"serch\" not found".to_string(),
            span: Some(10..15),
            hint: Some("did you mean \"search\"?".to_string()),
        };
        let text = render_text("demo.ias", "0123456789\nabcde", &diag);
        assert!(text.contains("demo.ias:1:11: error:"));
        assert!(text.contains("hint: did you mean"));
    }
}
