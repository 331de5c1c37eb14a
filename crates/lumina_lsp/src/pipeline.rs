//! Runs lex → parse (with recovery) → semantic analysis → inference over a
//! single document's text, for the editor service (spec §4.11).
//!
//! Grounded on the teacher's own `pipeline::analyze` (a self-contained
//! lex/parse/analyze pass owned by the LSP crate, not the project crate) —
//! the editor service here is a thin stateless layer, per spec §4.11's
//! header, over exactly the same phases `lumina-cli` drives.

use std::collections::HashMap;
use std::collections::HashSet;

use lumina_base::Diagnostic;
use lumina_infer::{analyze, CallSignature, InferEngine, SemanticOptions, Subst, Type};
use lumina_syntax::ast::{NodeId, Program};
use lumina_syntax::lexer::{Lexer, LexerOptions};
use lumina_syntax::recovery::parse_with_recovery;
use lumina_syntax::token::Token;

use crate::index::SymbolIndex;

/// Result of running the full analysis pipeline on a document's text.
pub struct AnalysisResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
    pub hm_expr_types: HashMap<NodeId, Type>,
    pub inferred_calls: HashMap<NodeId, CallSignature>,
    pub subst: Subst,
    pub index: SymbolIndex,
    /// Every token including whitespace/comments, for semantic highlighting
    /// and token-context-aware completion — the parser's own token stream
    /// (fed through `ignore_kinds`) drops both.
    pub tokens: Vec<Token>,
}

/// Analyzes `source`, tolerating syntax errors via panic-mode recovery so
/// the editor surface always has a best-effort AST to serve hover/
/// completion/etc. against, per spec §4.11's "stateless helpers over a
/// project context" posture.
pub fn analyze_document(source: &str) -> AnalysisResult {
    let recovered = parse_with_recovery(source);
    let program = recovered.program;
    let mut diagnostics = recovered.diagnostics;

    let no_externs = HashSet::new();
    let no_imports = HashSet::new();
    let semantic = analyze(&program, &SemanticOptions { extern_symbols: &no_externs, imported_names: &no_imports });
    diagnostics.extend(semantic.diagnostics);

    let infer = InferEngine::new().infer_program(&program);
    diagnostics.extend(infer.diagnostics);

    let index = SymbolIndex::build(&program);

    let mut lexer = Lexer::new(LexerOptions { ignore_kinds: Default::default(), ..LexerOptions::default() });
    let tokens = lexer.tokenize_all(source);

    AnalysisResult {
        program,
        diagnostics,
        hm_expr_types: infer.hm_expr_types,
        inferred_calls: infer.inferred_calls,
        subst: infer.subst,
        index,
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzes_a_well_formed_document() {
        let result = analyze_document("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        assert!(!result.diagnostics.iter().any(Diagnostic::is_error));
        assert!(result.index.definition_for("add").is_some());
    }

    #[test]
    fn recovers_from_a_syntax_error() {
        let result = analyze_document("fn add(a: i32, b: i32) -> i32 { return a +");
        assert!(!result.diagnostics.is_empty());
    }
}
