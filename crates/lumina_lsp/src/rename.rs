//! Rename (spec §4.11), grounded on the teacher's
//! validate-then-collect-definition-and-reference-edits strategy.

use std::collections::HashMap;

use tower_lsp::lsp_types::{Position, Range, TextEdit, Url, WorkspaceEdit};

use lumina_syntax::token::TokenKind;

use crate::document::DocumentState;

pub fn validate_new_name(new_name: &str) -> Option<String> {
    if new_name.is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if new_name.chars().any(|c| c.is_whitespace()) {
        return Some("Name cannot contain whitespace".to_string());
    }
    let first = new_name.chars().next().unwrap();
    if !first.is_alphabetic() && first != '_' {
        return Some("Name must start with a letter or underscore".to_string());
    }
    if !new_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Some("Name must be alphanumeric or underscore".to_string());
    }
    if is_reserved_keyword(new_name) {
        return Some(format!("'{}' is a reserved keyword", new_name));
    }
    None
}

fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "let", "if", "else", "while", "for", "match", "return", "fn", "struct", "enum", "trait", "impl", "type", "is", "true", "false", "self", "Self", "const", "mut",
    ];
    RESERVED.contains(&name)
}

pub fn rename(doc: &DocumentState, position: Position, new_name: String, uri: &Url) -> Option<WorkspaceEdit> {
    if validate_new_name(&new_name).is_some() {
        return None;
    }

    let offset = doc.line_index.offset(position);
    let old_name = doc.index.name_at(offset)?.to_string();

    let mut edits = Vec::new();

    if let Some(def) = doc.index.definition_for(&old_name) {
        if !def.span.is_empty() {
            edits.push(TextEdit {
                range: Range { start: doc.line_index.position(def.span.start), end: doc.line_index.position(def.span.end) },
                new_text: new_name.clone(),
            });
        }
    }

    for reference in doc.index.references_for(&old_name) {
        edits.push(TextEdit {
            range: Range { start: doc.line_index.position(reference.span.start), end: doc.line_index.position(reference.span.end) },
            new_text: new_name.clone(),
        });
    }

    if edits.is_empty() {
        return None;
    }

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    Some(WorkspaceEdit { changes: Some(changes), ..Default::default() })
}

pub fn prepare_rename(doc: &DocumentState, position: Position) -> Option<(Range, String)> {
    let offset = doc.line_index.offset(position);
    let token = doc.tokens.iter().find(|t| offset >= t.offset && offset < t.end_offset)?;

    if !matches!(token.kind, TokenKind::Identifier) {
        return None;
    }

    Some((Range { start: doc.line_index.position(token.offset), end: doc.line_index.position(token.end_offset) }, token.lexeme.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    fn test_uri() -> Url {
        Url::parse("file:///test.lum").unwrap()
    }

    #[test]
    fn rename_variable_produces_edits() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        let result = rename(&doc, pos, "y".to_string(), &test_uri());
        let ws_edit = result.expect("expected rename edits");
        let edits = ws_edit.changes.unwrap().remove(&test_uri()).unwrap();
        assert!(edits.len() >= 2);
        for edit in &edits {
            assert_eq!(edit.new_text, "y");
        }
    }

    #[test]
    fn rename_unknown_position_returns_none() {
        let doc = make_doc("fn f() -> i32 { return 1; }");
        let pos = Position { line: 0, character: 200 };
        assert!(rename(&doc, pos, "y".to_string(), &test_uri()).is_none());
    }

    #[test]
    fn rename_rejects_empty_name() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        assert!(rename(&doc, pos, "".to_string(), &test_uri()).is_none());
    }

    #[test]
    fn rename_rejects_reserved_keyword() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        assert!(rename(&doc, pos, "let".to_string(), &test_uri()).is_none());
    }

    #[test]
    fn rename_rejects_numeric_start() {
        assert!(validate_new_name("3abc").is_some());
    }

    #[test]
    fn prepare_rename_for_identifier() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        let (_, text) = prepare_rename(&doc, pos).expect("expected prepare_rename result");
        assert_eq!(text, "x");
    }

    #[test]
    fn prepare_rename_rejects_keyword() {
        let doc = make_doc("fn f() -> i32 { return 1; }");
        let offset = doc.source.find("fn").unwrap();
        let pos = doc.line_index.position(offset);
        assert!(prepare_rename(&doc, pos).is_none());
    }

    #[test]
    fn rename_accepts_valid_name() {
        assert!(validate_new_name("myVar").is_none());
        assert!(validate_new_name("_private").is_none());
    }
}
