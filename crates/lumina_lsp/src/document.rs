use tower_lsp::lsp_types::Diagnostic;

use lumina_syntax::ast::{NodeId, Program};
use lumina_syntax::token::Token;
use lumina_infer::{CallSignature, Subst, Type};

use std::collections::HashMap;

use crate::diagnostics;
use crate::index::SymbolIndex;
use crate::line_index::LineIndex;
use crate::pipeline;

/// Per-document state: source text, analysis results, and cached
/// diagnostics, rebuilt in full on every change (spec §4.11 — the editor
/// surface has no incremental re-analysis of its own; that lives in
/// `lumina-project` for the multi-file case).
pub struct DocumentState {
    pub source: String,
    pub version: i32,
    pub line_index: LineIndex,

    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
    pub index: SymbolIndex,
    pub hm_expr_types: HashMap<NodeId, Type>,
    pub inferred_calls: HashMap<NodeId, CallSignature>,
    pub subst: Subst,
    pub tokens: Vec<Token>,
}

impl DocumentState {
    pub fn new(source: String, version: i32) -> Self {
        let line_index = LineIndex::new(&source);
        let analysis = pipeline::analyze_document(&source);
        let diagnostics = diagnostics::convert(&analysis.diagnostics, &line_index);

        DocumentState {
            source,
            version,
            line_index,
            program: analysis.program,
            diagnostics,
            index: analysis.index,
            hm_expr_types: analysis.hm_expr_types,
            inferred_calls: analysis.inferred_calls,
            subst: analysis.subst,
            tokens: analysis.tokens,
        }
    }

    /// Re-run the pipeline over new text, replacing every analysis field.
    pub fn update(&mut self, source: String, version: i32) {
        self.line_index = LineIndex::new(&source);
        self.source = source;
        self.version = version;

        let analysis = pipeline::analyze_document(&self.source);
        self.diagnostics = diagnostics::convert(&analysis.diagnostics, &self.line_index);
        self.program = analysis.program;
        self.index = analysis.index;
        self.hm_expr_types = analysis.hm_expr_types;
        self.inferred_calls = analysis.inferred_calls;
        self.subst = analysis.subst;
        self.tokens = analysis.tokens;
    }

    /// Converts an LSP `Position` to a byte offset in `source`.
    pub fn offset(&self, position: tower_lsp::lsp_types::Position) -> usize {
        self.line_index.offset(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_parses_source() {
        let doc = DocumentState::new("fn f() -> i32 { return 1; }".to_string(), 1);
        assert_eq!(doc.version, 1);
        assert!(doc.diagnostics.is_empty(), "valid source should have no diagnostics: {:?}", doc.diagnostics);
        assert!(doc.index.definition_for("f").is_some());
    }

    #[test]
    fn update_replaces_analysis() {
        let mut doc = DocumentState::new("fn f() -> i32 { let x = 1; return x; }".to_string(), 1);
        assert!(doc.index.definition_for("x").is_some());
        assert!(doc.index.definition_for("y").is_none());

        doc.update("fn f() -> i32 { let y = 1; return y; }".to_string(), 2);
        assert_eq!(doc.version, 2);
        assert!(doc.index.definition_for("y").is_some());
    }

    #[test]
    fn empty_document() {
        let doc = DocumentState::new(String::new(), 0);
        assert_eq!(doc.version, 0);
        assert_eq!(doc.source, "");
    }

    #[test]
    fn update_changes_diagnostics_on_error() {
        let mut doc = DocumentState::new("fn f() -> i32 { return 1; }".to_string(), 1);
        assert!(doc.diagnostics.is_empty());
        doc.update("fn f() -> i32 { return nope; }".to_string(), 2);
        assert!(!doc.diagnostics.is_empty(), "unknown identifier should produce a diagnostic");
    }
}
