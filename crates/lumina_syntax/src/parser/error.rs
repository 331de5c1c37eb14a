//! Structured parse errors (spec §4.2: "throws a structured parse error",
//! never a raw exception the caller must catch by string-matching).

use crate::token::{SourceLocation, TokenKind};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
    pub found: TokenKind,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.location.start.line, self.location.start.column, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for lumina_base::SpannedError {
    fn from(err: ParseError) -> Self {
        let span = err.location.span();
        lumina_base::SpannedError::new(err.message, span, err.location.start.line, err.location.start.column)
    }
}
