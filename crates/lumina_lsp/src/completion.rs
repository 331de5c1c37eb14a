//! Completion: context-aware suggestions keyed off the token preceding the
//! cursor (spec §4.11), directly grounded on the teacher's
//! previous-token-dispatch strategy — only the token vocabulary and the
//! completion sets behind each branch are lumina's own.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, CompletionResponse, InsertTextFormat, Position};

use lumina_syntax::token::{Keyword, OperatorKind, TokenKind};

use crate::document::DocumentState;
use crate::index::DefKind;

pub fn completions(doc: &DocumentState, position: Position) -> Option<CompletionResponse> {
    let offset = doc.line_index.offset(position);

    let prev = doc.tokens.iter().rev().find(|t| t.end_offset <= offset);

    let mut items = Vec::new();
    match prev.map(|t| &t.kind) {
        Some(TokenKind::Operator(OperatorKind::Semicolon)) | Some(TokenKind::Newline) | None => {
            add_statement_keywords(&mut items);
            add_identifier_completions(doc, &mut items);
        }
        Some(TokenKind::Operator(OperatorKind::Colon)) => {
            add_type_completions(&mut items);
        }
        Some(TokenKind::Operator(OperatorKind::Dot)) => {
            add_field_completions(doc, &mut items);
        }
        Some(TokenKind::Keyword(Keyword::Match)) | Some(TokenKind::Keyword(Keyword::Is)) => {
            add_variant_completions(doc, &mut items);
        }
        _ => {
            add_identifier_completions(doc, &mut items);
        }
    }

    if items.is_empty() {
        add_identifier_completions(doc, &mut items);
        add_statement_keywords(&mut items);
    }

    Some(CompletionResponse::Array(items))
}

fn add_statement_keywords(items: &mut Vec<CompletionItem>) {
    let keywords = [
        ("let", "Declare a variable", "let ${1:name} = ${2:value};"),
        ("if", "Conditional branch", "if ${1:cond} {\n\t${2}\n}"),
        ("while", "Loop while condition holds", "while ${1:cond} {\n\t${2}\n}"),
        ("for", "Iterate over a range or collection", "for ${1:item} in ${2:iter} {\n\t${3}\n}"),
        ("match", "Pattern match", "match ${1:scrutinee} {\n\t${2}\n}"),
        ("return", "Return a value", "return ${1:value};"),
        ("fn", "Declare a function", "fn ${1:name}(${2:params}) -> ${3:ReturnType} {\n\t${4}\n}"),
        ("struct", "Declare a struct", "struct ${1:Name} {\n\t${2}\n}"),
        ("enum", "Declare an enum", "enum ${1:Name} {\n\t${2}\n}"),
    ];
    for (label, detail, snippet) in keywords {
        items.push(CompletionItem {
            label: label.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some(detail.to_string()),
            insert_text: Some(snippet.to_string()),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            ..Default::default()
        });
    }
}

fn add_type_completions(items: &mut Vec<CompletionItem>) {
    let primitives = ["i32", "i64", "f64", "bool", "str", "void"];
    for prim in primitives {
        items.push(CompletionItem {
            label: prim.to_string(),
            kind: Some(CompletionItemKind::TYPE_PARAMETER),
            detail: Some("primitive type".to_string()),
            ..Default::default()
        });
    }
}

fn add_field_completions(doc: &DocumentState, items: &mut Vec<CompletionItem>) {
    for def in &doc.index.definitions {
        if def.kind == DefKind::Struct {
            items.push(CompletionItem {
                label: def.name.clone(),
                kind: Some(CompletionItemKind::FIELD),
                detail: Some(def.detail.clone()),
                ..Default::default()
            });
        }
    }
}

fn add_variant_completions(doc: &DocumentState, items: &mut Vec<CompletionItem>) {
    for def in &doc.index.definitions {
        if def.kind == DefKind::Enum {
            items.push(CompletionItem {
                label: def.name.clone(),
                kind: Some(CompletionItemKind::ENUM_MEMBER),
                detail: Some(def.detail.clone()),
                ..Default::default()
            });
        }
    }
}

fn add_identifier_completions(doc: &DocumentState, items: &mut Vec<CompletionItem>) {
    for def in &doc.index.definitions {
        let kind = match def.kind {
            DefKind::Function => CompletionItemKind::FUNCTION,
            DefKind::Struct => CompletionItemKind::CLASS,
            DefKind::Enum => CompletionItemKind::ENUM,
            DefKind::TypeAlias => CompletionItemKind::CLASS,
            DefKind::Trait => CompletionItemKind::INTERFACE,
            DefKind::Variable => CompletionItemKind::VARIABLE,
            DefKind::Param => CompletionItemKind::VARIABLE,
        };
        items.push(CompletionItem {
            label: def.name.clone(),
            kind: Some(kind),
            detail: if def.detail.is_empty() { None } else { Some(def.detail.clone()) },
            ..Default::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    #[test]
    fn completion_after_semicolon_includes_keywords() {
        let doc = make_doc("fn f() -> i32 { let x = 1; ");
        let offset = doc.source.len();
        let pos = doc.line_index.position(offset);
        let result = completions(&doc, pos);
        if let Some(CompletionResponse::Array(items)) = result {
            let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
            assert!(labels.contains(&"let") || labels.contains(&"return"), "{:?}", labels);
        } else {
            panic!("expected completions");
        }
    }

    #[test]
    fn completion_includes_variables_in_scope() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        let offset = doc.source.rfind("return").unwrap();
        let pos = doc.line_index.position(offset);
        let result = completions(&doc, pos);
        if let Some(CompletionResponse::Array(items)) = result {
            let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
            assert!(labels.contains(&"x"), "{:?}", labels);
        } else {
            panic!("expected completions");
        }
    }

    #[test]
    fn completion_after_colon_offers_primitive_types() {
        let doc = make_doc("fn f(a: ");
        let offset = doc.source.len();
        let pos = doc.line_index.position(offset);
        let result = completions(&doc, pos);
        if let Some(CompletionResponse::Array(items)) = result {
            let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
            assert!(labels.contains(&"i32"), "{:?}", labels);
        } else {
            panic!("expected completions");
        }
    }

    #[test]
    fn completion_on_empty_document_does_not_panic() {
        let doc = make_doc("");
        let pos = Position { line: 0, character: 0 };
        let _ = completions(&doc, pos);
    }
}
