//! A minimal positioned error, for call sites below the diagnostic layer
//! that don't have a `code` or `severity` to assign yet (spec §3, §7).
//!
//! The lexer and early parser stages fail in just one way — "unexpected
//! input at this position" — so they return `SpannedError` rather than
//! building a full [`Diagnostic`] themselves; whatever calls them converts
//! it into one (always as an error-severity `"syntax-error"`) once it knows
//! the broader context. Stages that already distinguish error codes and
//! severities (the semantic analyzer, the inference engine) build
//! `Diagnostic`s directly instead of going through this type.
//!
//! # Example
//!
//! ```
//! use lumina_base::{Diagnostic, Result, Span, SpannedError};
//!
//! fn parse_number(s: &str) -> Result<i32> {
//!     s.parse().map_err(|_| SpannedError::new(format!("invalid number: '{}'", s), Span::new(0, s.len()), 1, 1))
//! }
//!
//! let err = parse_number("abc").unwrap_err();
//! let diagnostic: Diagnostic = err.into();
//! assert_eq!(diagnostic.code, "syntax-error");
//! ```

use crate::diagnostic::{Diagnostic, Severity};
use crate::span::Span;
use std::fmt;

/// An error tied to one line/column position and byte span.
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub message: String,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl SpannedError {
    pub fn new(message: impl Into<String>, span: Span, line: usize, column: usize) -> Self {
        Self { message: message.into(), span, line, column }
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SpannedError {}

impl From<SpannedError> for Diagnostic {
    fn from(err: SpannedError) -> Self {
        Diagnostic::new(Severity::Error, "syntax-error", err.message, err.span, err.line, err.column)
    }
}

/// Alias for `std::result::Result<T, SpannedError>`.
pub type Result<T> = std::result::Result<T, SpannedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_and_column() {
        let err = SpannedError::new("unexpected token", Span::new(5, 10), 3, 8);
        assert_eq!(err.to_string(), "3:8: unexpected token");
    }

    #[test]
    fn converts_into_an_error_severity_diagnostic() {
        let err = SpannedError::new("unexpected token", Span::new(5, 10), 3, 8);
        let diagnostic: Diagnostic = err.into();
        assert_eq!(diagnostic.code, "syntax-error");
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.line, 3);
        assert_eq!(diagnostic.span, Span::new(5, 10));
    }
}
