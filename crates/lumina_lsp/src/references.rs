//! Find all references (spec §4.11), grounded on the teacher's
//! token-under-cursor → symbol-index lookup.

use tower_lsp::lsp_types::{Location, Position, Range, Url};

use crate::document::DocumentState;

pub fn find_references(doc: &DocumentState, position: Position, uri: &Url, include_declaration: bool) -> Vec<Location> {
    let offset = doc.line_index.offset(position);
    let Some(name) = doc.index.name_at(offset) else { return Vec::new() };
    let name = name.to_string();

    let mut locations = Vec::new();

    if include_declaration {
        if let Some(def) = doc.index.definition_for(&name) {
            if !def.span.is_empty() {
                locations.push(Location {
                    uri: uri.clone(),
                    range: Range { start: doc.line_index.position(def.span.start), end: doc.line_index.position(def.span.end) },
                });
            }
        }
    }

    for r in doc.index.references_for(&name) {
        locations.push(Location {
            uri: uri.clone(),
            range: Range { start: doc.line_index.position(r.span.start), end: doc.line_index.position(r.span.end) },
        });
    }

    locations
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
    fn find_references_includes_usages() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x + x; }");
        let offset = doc.source.find('x').unwrap();
        let pos = doc.line_index.position(offset);
        let refs = find_references(&doc, pos, &test_uri(), false);
        assert_eq!(refs.len(), 2, "expected 2 usages of 'x'");
    }

    #[test]
    fn find_references_with_declaration_adds_one() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.find('x').unwrap();
        let pos = doc.line_index.position(offset);
        let without = find_references(&doc, pos, &test_uri(), false);
        let with = find_references(&doc, pos, &test_uri(), true);
        assert_eq!(with.len(), without.len() + 1);
    }

    #[test]
    fn find_references_unknown_position_returns_empty() {
        let doc = make_doc("fn f() -> i32 { return 1; }");
        let pos = Position { line: 0, character: 200 };
        assert!(find_references(&doc, pos, &test_uri(), true).is_empty());
    }

    #[test]
    fn find_references_correct_uri() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.find('x').unwrap();
        let pos = doc.line_index.position(offset);
        let refs = find_references(&doc, pos, &test_uri(), true);
        for r in &refs {
            assert_eq!(r.uri, test_uri());
        }
    }
}
