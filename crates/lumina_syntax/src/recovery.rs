//! Panic-mode error recovery (spec §4.3).
//!
//! Wraps [`Parser`] so that a malformed top-level statement never aborts the
//! whole parse: the failing statement is skipped up to the next
//! synchronization point (a statement-starting keyword, or the token after a
//! `;`/`}`) and parsing resumes. The wrapper never panics and always returns
//! a (possibly partial) [`Program`] alongside the diagnostics collected along
//! the way.

use crate::ast::Program;
use crate::parser::{ParseError, Parser};
use crate::token::{Keyword, OperatorKind, TokenKind};
use lumina_base::{Diagnostic, SpannedError};

/// Statement-starting keywords that a synchronization pass may resume at.
const SYNC_KEYWORDS: &[Keyword] = &[
    Keyword::Fn,
    Keyword::Struct,
    Keyword::Enum,
    Keyword::Type,
    Keyword::Trait,
    Keyword::Impl,
    Keyword::Let,
    Keyword::Return,
    Keyword::If,
    Keyword::While,
    Keyword::For,
    Keyword::Match,
    Keyword::Import,
    Keyword::Pub,
];

pub struct RecoveringParseResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
    /// True if at least one statement was dropped and recovery kicked in.
    pub recovered: bool,
}

/// Parses `source` to completion, never returning `Err`: on a syntax error
/// the offending statement is discarded and a `syntax-error` diagnostic is
/// emitted in its place, then parsing resumes at the next synchronization
/// point. A source that is nothing but garbage still yields an (empty)
/// `Program` plus one diagnostic per failed resynchronization attempt.
pub fn parse_with_recovery(source: &str) -> RecoveringParseResult {
    let mut parser = Parser::new(source);
    let mut body = Vec::new();
    let mut diagnostics = Vec::new();
    let mut recovered = false;

    loop {
        if is_at_end(&parser) {
            break;
        }
        let before = parser.cursor();
        match parser.parse_stmt() {
            Ok(stmt) => body.push(stmt),
            Err(err) => {
                diagnostics.push(to_diagnostic(&err));
                recovered = true;
                if parser.cursor() == before {
                    // The statement parser made no progress; force it so
                    // synchronization can't spin forever on the same token.
                    parser.seek(before + 1);
                }
                synchronize(&mut parser);
            }
        }
    }

    diagnostics.extend(parser.take_lints());
    RecoveringParseResult { program: Program { body }, diagnostics, recovered }
}

fn is_at_end(parser: &Parser) -> bool {
    matches!(parser.peek_token().kind, TokenKind::Eof)
}

/// Advances past tokens until a sync keyword, the token after a `;`, or the
/// token after an unmatched `}`, giving the next `parse_stmt` call a
/// plausible statement boundary to start from.
fn synchronize(parser: &mut Parser) {
    loop {
        let tok = parser.peek_token().clone();
        if tok.is_eof() {
            return;
        }
        if let TokenKind::Keyword(k) = &tok.kind {
            if SYNC_KEYWORDS.contains(k) {
                return;
            }
        }
        let is_semicolon = matches!(tok.kind, TokenKind::Operator(OperatorKind::Semicolon));
        let is_rbrace = matches!(tok.kind, TokenKind::Operator(OperatorKind::RBrace));
        parser.seek(parser.cursor() + 1);
        if is_semicolon || is_rbrace {
            return;
        }
    }
}

fn to_diagnostic(err: &ParseError) -> Diagnostic {
    SpannedError::from(err.clone()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_program_recovers_nothing() {
        let result = parse_with_recovery("fn main() -> i32 { 0 }");
        assert!(!result.recovered);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.program.body.len(), 1);
    }

    #[test]
    fn malformed_statement_is_skipped_and_parsing_resumes() {
        let src = "fn a() -> i32 { 1 }\nfn ( broken\nfn b() -> i32 { 2 }";
        let result = parse_with_recovery(src);
        assert!(result.recovered);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "syntax-error");
        // both well-formed functions on either side of the garbage survive.
        assert_eq!(result.program.body.len(), 2);
    }

    #[test]
    fn never_panics_on_pure_garbage() {
        let result = parse_with_recovery("@ @ @ ) ) )");
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn missing_semicolon_surfaces_as_a_warning_lint() {
        let result = parse_with_recovery("fn f() -> i32 { let x = 1 return x; }");
        assert!(result.diagnostics.iter().any(|d| d.code == "MISSING_SEMICOLON" && !d.is_error()));
    }
}
