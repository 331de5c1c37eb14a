//! Go to definition (spec §4.11), grounded on the teacher's
//! token-under-cursor → symbol-index lookup.

use tower_lsp::lsp_types::{GotoDefinitionResponse, Location, Position, Range, Url};

use crate::document::DocumentState;

pub fn goto_definition(doc: &DocumentState, position: Position, uri: &Url) -> Option<GotoDefinitionResponse> {
    let offset = doc.line_index.offset(position);
    let name = doc.index.name_at(offset)?;
    let def = doc.index.definition_for(name)?;

    if def.span.is_empty() {
        return None;
    }

    let location = Location {
        uri: uri.clone(),
        range: Range { start: doc.line_index.position(def.span.start), end: doc.line_index.position(def.span.end) },
    };
    Some(GotoDefinitionResponse::Scalar(location))
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
    fn goto_definition_of_variable() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("x;").unwrap();
        let pos = doc.line_index.position(offset);
        let result = goto_definition(&doc, pos, &test_uri());
        assert!(result.is_some(), "expected a definition for 'x'");
        match result.unwrap() {
            GotoDefinitionResponse::Scalar(loc) => assert_eq!(loc.uri, test_uri()),
            _ => panic!("unexpected response type"),
        }
    }

    #[test]
    fn goto_definition_out_of_range_returns_none() {
        let doc = make_doc("fn f() -> i32 { return 1; }");
        let pos = Position { line: 0, character: 200 };
        assert!(goto_definition(&doc, pos, &test_uri()).is_none());
    }

    #[test]
    fn goto_definition_of_function_call() {
        let doc = make_doc("fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }");
        let offset = doc.source.rfind("add(").unwrap();
        let pos = doc.line_index.position(offset);
        let result = goto_definition(&doc, pos, &test_uri());
        match result.unwrap() {
            GotoDefinitionResponse::Scalar(loc) => assert_eq!(loc.range.start.line, 0),
            _ => panic!("unexpected response type"),
        }
    }
}
