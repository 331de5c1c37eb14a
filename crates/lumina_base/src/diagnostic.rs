//! Diagnostics shared across every compiler phase (spec §3 Diagnostic, §7).

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        write!(f, "{}", s)
    }
}

/// A location in a specific source file, used once a diagnostic escapes a
/// single-document context (e.g. `relatedInformation`, cross-file errors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub uri: String,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    pub location: FileLocation,
    pub message: String,
}

/// `{ severity, message, code, source, location, relatedInformation? }`
/// (spec §3). `source` is always `"lumina"` today but is kept as a field so
/// downstream tools (the LSP) can merge diagnostics from other sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub code: String,
    pub source: String,
    pub span: Span,
    pub line: usize,
    pub column: usize,
    pub related_information: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>, span: Span, line: usize, column: usize) -> Self {
        Self {
            severity,
            message: message.into(),
            code: code.into(),
            source: "lumina".to_string(),
            span,
            line,
            column,
            related_information: Vec::new(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, span: Span, line: usize, column: usize) -> Self {
        Self::new(Severity::Error, code, message, span, line, column)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, span: Span, line: usize, column: usize) -> Self {
        Self::new(Severity::Warning, code, message, span, line, column)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Renders file, 1-based line/column, severity, code, message, and a
    /// source-line snippet with a caret under the span (spec §7). `color`
    /// enables ANSI styling (the caller decides based on `stderr.is_tty()`).
    pub fn render(&self, file: &str, source: &str, color: bool) -> String {
        let line_text = source.lines().nth(self.line.saturating_sub(1)).unwrap_or("");
        let width = (self.span.len()).max(1);
        let caret = format!("{}{}", " ".repeat(self.column.saturating_sub(1)), "^".repeat(width));
        let header = format!("{}:{}:{}: {}[{}]: {}", file, self.line, self.column, self.severity, self.code, self.message);
        if color {
            let styled_header = match self.severity {
                Severity::Error => format!("\x1b[1m\x1b[31m{}\x1b[0m", header),
                Severity::Warning => format!("\x1b[1m\x1b[33m{}\x1b[0m", header),
                _ => header,
            };
            format!("{}\n  {}\n  \x1b[36m{}\x1b[0m", styled_header, line_text, caret)
        } else {
            format!("{}\n  {}\n  {}", header, line_text, caret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_caret_under_span() {
        let d = Diagnostic::error("LUM-001", "type mismatch", Span::new(4, 5), 1, 5);
        let rendered = d.render("main.lm", "let x = 1", false);
        assert!(rendered.contains("main.lm:1:5"));
        assert!(rendered.contains("^"));
    }

    #[test]
    fn is_error_only_for_error_severity() {
        let e = Diagnostic::error("X", "m", Span::new(0, 1), 1, 1);
        let w = Diagnostic::warning("Y", "m", Span::new(0, 1), 1, 1);
        assert!(e.is_error());
        assert!(!w.is_error());
    }
}
