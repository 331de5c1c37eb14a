//! Inlay type hints (spec §4.11): annotate `let` bindings that have no
//! explicit type with their inferred type. Grounded on the teacher's
//! range-filtered walk over definitions; lumina has no ownership/VarState
//! concept so only the type-hint half of the teacher's module survives.

use tower_lsp::lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Range};

use lumina_infer::format_type;
use lumina_syntax::ast::{FnDecl, Program, Stmt};

use crate::document::DocumentState;

pub fn inlay_hints(doc: &DocumentState, range: Range) -> Vec<InlayHint> {
    let mut hints = Vec::new();
    walk_program(&doc.program, doc, range, &mut hints);
    hints
}

fn walk_program(program: &Program, doc: &DocumentState, range: Range, hints: &mut Vec<InlayHint>) {
    for stmt in &program.body {
        walk_stmt(stmt, doc, range, hints);
    }
}

fn walk_fn(f: &FnDecl, doc: &DocumentState, range: Range, hints: &mut Vec<InlayHint>) {
    for stmt in &f.body {
        walk_stmt(stmt, doc, range, hints);
    }
}

fn walk_stmt(stmt: &Stmt, doc: &DocumentState, range: Range, hints: &mut Vec<InlayHint>) {
    match stmt {
        Stmt::FnDecl(f) => walk_fn(f, doc, range, hints),
        Stmt::ImplDecl(d) => {
            for m in &d.methods {
                walk_fn(m, doc, range, hints);
            }
        }
        Stmt::Let { ty: None, value, location, .. } => {
            if let Some(ty) = doc.hm_expr_types.get(&value.id()) {
                push_type_hint(doc, location, ty, range, hints);
            }
        }
        Stmt::If { then_block, else_block, .. } => {
            for s in then_block {
                walk_stmt(s, doc, range, hints);
            }
            if let Some(eb) = else_block {
                for s in eb {
                    walk_stmt(s, doc, range, hints);
                }
            }
        }
        Stmt::While { body, .. } | Stmt::WhileLet { body, .. } | Stmt::For { body, .. } => {
            for s in body {
                walk_stmt(s, doc, range, hints);
            }
        }
        Stmt::Block { stmts, .. } => {
            for s in stmts {
                walk_stmt(s, doc, range, hints);
            }
        }
        _ => {}
    }
}

fn push_type_hint(doc: &DocumentState, location: &Option<lumina_syntax::token::SourceLocation>, ty: &lumina_infer::Type, range: Range, hints: &mut Vec<InlayHint>) {
    let Some(loc) = location else { return };
    let pos = doc.line_index.position(loc.span().end);
    if !in_range(pos, range) {
        return;
    }
    let rendered = format_type(ty, &doc.subst);
    hints.push(InlayHint {
        position: pos,
        label: InlayHintLabel::String(format!(": {}", rendered)),
        kind: Some(InlayHintKind::TYPE),
        text_edits: None,
        tooltip: None,
        padding_left: Some(false),
        padding_right: Some(true),
        data: None,
    });
}

fn in_range(pos: tower_lsp::lsp_types::Position, range: Range) -> bool {
    range == Range::default() || (pos.line >= range.start.line && pos.line <= range.end.line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    #[test]
    fn inlay_hint_for_untyped_let() {
        let doc = make_doc("fn f() -> i32 { let x = 5; return x; }");
        let hints = inlay_hints(&doc, Range::default());
        assert!(!hints.is_empty(), "expected an inlay hint for an untyped let binding");
    }

    #[test]
    fn no_hint_for_explicitly_typed_let() {
        let doc = make_doc("fn f() -> i32 { let x: i32 = 5; return x; }");
        let hints = inlay_hints(&doc, Range::default());
        assert!(hints.is_empty(), "explicitly typed bindings should not get an inlay hint");
    }

    #[test]
    fn empty_document_has_no_hints() {
        let doc = make_doc("");
        assert!(inlay_hints(&doc, Range::default()).is_empty());
    }

    #[test]
    fn hints_respect_range_filter() {
        let doc = make_doc("fn f() -> i32 { let x = 5; let y = 10; return x + y; }");
        let all = inlay_hints(&doc, Range::default());
        let restricted = inlay_hints(
            &doc,
            Range { start: tower_lsp::lsp_types::Position { line: 99, character: 0 }, end: tower_lsp::lsp_types::Position { line: 99, character: 0 } },
        );
        assert!(restricted.len() <= all.len());
    }
}
