//! Hover: type information and declaration signatures under the cursor
//! (spec §4.11). Grounded on the teacher's token-driven hover dispatch,
//! re-keyed off the AST/inference results lumina actually produces: prefer
//! an `inferredCalls` signature when the cursor sits on a callee,
//! otherwise fall back to the identifier's `hmExprTypes` entry, and fall
//! further back to the declaration's source-derived detail string.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};

use lumina_infer::format_type;

use crate::document::DocumentState;
use crate::index::DefKind;

pub fn hover(doc: &DocumentState, position: Position) -> Option<Hover> {
    let offset = doc.line_index.offset(position);

    if let Some(r) = doc.index.reference_at(offset) {
        let value = if let Some(call_id) = r.call_node_id {
            doc.inferred_calls.get(&call_id).map(|sig| {
                let params: Vec<String> = sig.args.iter().map(|t| format_type(t, &doc.subst)).collect();
                format!("```\nfn {}({}) -> {}\n```", r.name, params.join(", "), format_type(&sig.return_type, &doc.subst))
            })
        } else {
            None
        };
        let value = value.or_else(|| {
            r.node_id.and_then(|id| doc.hm_expr_types.get(&id)).map(|ty| format!("```\n{}: {}\n```", r.name, format_type(ty, &doc.subst)))
        });
        let value = value.or_else(|| doc.index.definition_for(&r.name).map(|d| format!("```\n{}\n```", d.detail)));

        if let Some(value) = value {
            let range = Range { start: doc.line_index.position(r.span.start), end: doc.line_index.position(r.span.end) };
            return Some(Hover { contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value }), range: Some(range) });
        }
    }

    let def = doc.index.definition_at(offset)?;
    let mut value = format!("```\n{}\n```", def.detail);
    if def.kind == DefKind::Variable && !def.detail.is_empty() {
        value = format!("```\nlet {}: {}\n```", def.name, def.detail);
    }
    let range = Range { start: doc.line_index.position(def.span.start), end: doc.line_index.position(def.span.end) };
    Some(Hover { contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value }), range: Some(range) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    #[test]
    fn hover_on_variable_shows_inferred_type() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        let result = hover(&doc, pos);
        assert!(result.is_some(), "expected hover info for 'x'");
        let h = result.unwrap();
        match &h.contents {
            HoverContents::Markup(m) => assert!(m.value.contains("i32"), "hover should show inferred type: {}", m.value),
            _ => panic!("expected markup content"),
        }
    }

    #[test]
    fn hover_on_call_shows_signature() {
        let doc = make_doc("fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }");
        let offset = doc.source.rfind("add(").unwrap();
        let pos = doc.line_index.position(offset);
        let result = hover(&doc, pos);
        assert!(result.is_some());
        let h = result.unwrap();
        match &h.contents {
            HoverContents::Markup(m) => {
                assert!(m.value.contains("fn add"), "hover should show call signature: {}", m.value);
            }
            _ => panic!("expected markup content"),
        }
    }

    #[test]
    fn hover_on_function_declaration_shows_detail() {
        let doc = make_doc("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        let offset = doc.source.find("add").unwrap();
        let pos = doc.line_index.position(offset);
        let result = hover(&doc, pos);
        assert!(result.is_some());
        let h = result.unwrap();
        match &h.contents {
            HoverContents::Markup(m) => assert!(m.value.contains("fn add")),
            _ => panic!("expected markup content"),
        }
    }

    #[test]
    fn hover_on_whitespace_returns_none() {
        let doc = make_doc("fn f() -> i32 { return 1; }");
        let pos = Position { line: 0, character: 100 };
        assert!(hover(&doc, pos).is_none());
    }
}
