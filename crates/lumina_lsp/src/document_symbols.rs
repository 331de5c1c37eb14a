//! Document symbols / outline view (spec §4.11), grounded on the
//! teacher's definition-to-`DocumentSymbol` mapping; nesting here walks
//! the AST directly (functions own their params and locals) rather than
//! reconstructing containment from a flat index.

#![allow(deprecated)] // `DocumentSymbol::deprecated` has no non-deprecated replacement in tower-lsp 0.20.

use tower_lsp::lsp_types::{DocumentSymbol, Range, SymbolKind};

use lumina_syntax::ast::{FnDecl, Program, Stmt};

use crate::document::DocumentState;
use crate::line_index::LineIndex;

pub fn document_symbols(doc: &DocumentState) -> Vec<DocumentSymbol> {
    program_symbols(&doc.program, &doc.line_index)
}

fn program_symbols(program: &Program, line_index: &LineIndex) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::new();
    for stmt in &program.body {
        if let Stmt::ImplDecl(d) = stmt {
            symbols.extend(d.methods.iter().map(|m| fn_symbol(m, line_index)));
            continue;
        }
        if let Some(sym) = top_level_symbol(stmt, line_index) {
            symbols.push(sym);
        }
    }
    symbols
}

fn top_level_symbol(stmt: &Stmt, line_index: &LineIndex) -> Option<DocumentSymbol> {
    match stmt {
        Stmt::FnDecl(f) => Some(fn_symbol(f, line_index)),
        Stmt::StructDecl(d) => {
            let range = span_range(&d.location, line_index);
            let children: Vec<DocumentSymbol> = d
                .fields
                .iter()
                .map(|field| leaf_symbol(&field.name, SymbolKind::FIELD, range))
                .collect();
            Some(DocumentSymbol {
                name: d.name.clone(),
                detail: None,
                kind: SymbolKind::STRUCT,
                tags: None,
                deprecated: None,
                range,
                selection_range: range,
                children: if children.is_empty() { None } else { Some(children) },
            })
        }
        Stmt::EnumDecl(d) => {
            let range = span_range(&d.location, line_index);
            let children: Vec<DocumentSymbol> = d
                .variants
                .iter()
                .map(|v| leaf_symbol(&v.name, SymbolKind::ENUM_MEMBER, range))
                .collect();
            Some(DocumentSymbol {
                name: d.name.clone(),
                detail: None,
                kind: SymbolKind::ENUM,
                tags: None,
                deprecated: None,
                range,
                selection_range: range,
                children: if children.is_empty() { None } else { Some(children) },
            })
        }
        Stmt::TraitDecl(d) => {
            let range = span_range(&d.location, line_index);
            Some(DocumentSymbol { name: d.name.clone(), detail: None, kind: SymbolKind::INTERFACE, tags: None, deprecated: None, range, selection_range: range, children: None })
        }
        Stmt::TypeDecl(d) => {
            let range = span_range(&d.location, line_index);
            Some(DocumentSymbol { name: d.name.clone(), detail: None, kind: SymbolKind::CLASS, tags: None, deprecated: None, range, selection_range: range, children: None })
        }
        // Handled directly in `program_symbols`, which has access to the real line index.
        Stmt::ImplDecl(_) => None,
        _ => None,
    }
}

fn fn_symbol(f: &FnDecl, line_index: &LineIndex) -> DocumentSymbol {
    let range = span_range(&f.location, line_index);
    let children: Vec<DocumentSymbol> = f.params.iter().map(|p| leaf_symbol(&p.name, SymbolKind::VARIABLE, range)).collect();
    DocumentSymbol {
        name: f.name.clone(),
        detail: None,
        kind: SymbolKind::FUNCTION,
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children: if children.is_empty() { None } else { Some(children) },
    }
}

fn leaf_symbol(name: &str, kind: SymbolKind, range: Range) -> DocumentSymbol {
    DocumentSymbol { name: name.to_string(), detail: None, kind, tags: None, deprecated: None, range, selection_range: range, children: None }
}

fn span_range(location: &Option<lumina_syntax::token::SourceLocation>, line_index: &LineIndex) -> Range {
    let span = location.as_ref().map(|l| l.span()).unwrap_or_default();
    Range { start: line_index.position(span.start), end: line_index.position(span.end) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    #[test]
    fn includes_top_level_function() {
        let doc = make_doc("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        let symbols = document_symbols(&doc);
        assert!(symbols.iter().any(|s| s.name == "add" && s.kind == SymbolKind::FUNCTION));
    }

    #[test]
    fn function_params_are_nested() {
        let doc = make_doc("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        let symbols = document_symbols(&doc);
        let add = symbols.iter().find(|s| s.name == "add").unwrap();
        let children = add.children.as_ref().expect("expected nested params");
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"a") && names.contains(&"b"));
    }

    #[test]
    fn struct_fields_are_nested() {
        let doc = make_doc("struct Point { x: i32, y: i32 }");
        let symbols = document_symbols(&doc);
        let point = symbols.iter().find(|s| s.name == "Point").unwrap();
        assert_eq!(point.kind, SymbolKind::STRUCT);
        let children = point.children.as_ref().unwrap();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn empty_document_has_no_symbols() {
        let doc = make_doc("");
        assert!(document_symbols(&doc).is_empty());
    }
}
