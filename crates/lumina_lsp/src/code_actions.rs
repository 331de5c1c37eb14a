//! Diagnostic-driven quick fixes (spec §4.11), grounded on the teacher's
//! per-diagnostic-code dispatch and its Levenshtein-based `find_similar`
//! helper (ported here since lumina has no natural-language suggestion
//! module to import it from).

use std::collections::HashMap;

use tower_lsp::lsp_types::{CodeAction, CodeActionKind, CodeActionOrCommand, NumberOrString, Range, TextEdit, Url, WorkspaceEdit};

use lumina_base::Span;

use crate::document::DocumentState;

pub fn code_actions(doc: &DocumentState, range: Range, uri: &Url) -> Vec<CodeActionOrCommand> {
    let mut actions = Vec::new();
    let is_default_range = range == Range::default();

    for diagnostic in &doc.diagnostics {
        if !is_default_range && !ranges_overlap(&diagnostic.range, &range) {
            continue;
        }
        let code = diagnostic.code.as_ref().and_then(|c| match c {
            NumberOrString::String(s) => Some(s.as_str()),
            NumberOrString::Number(_) => None,
        });

        match code {
            Some("UNUSED_BINDING") => push_unused_binding_actions(doc, diagnostic, uri, &mut actions),
            Some("UNKNOWN_IDENTIFIER") => push_unknown_identifier_action(doc, diagnostic, uri, &mut actions),
            Some("MISSING_SEMICOLON") => push_missing_semicolon_action(diagnostic, uri, &mut actions),
            Some("TYPE-HOLE-UNRESOLVED") => push_type_hole_action(diagnostic, uri, &mut actions),
            _ => {}
        }
    }

    actions
}

fn push_unused_binding_actions(doc: &DocumentState, diagnostic: &tower_lsp::lsp_types::Diagnostic, uri: &Url, actions: &mut Vec<CodeActionOrCommand>) {
    let Some(name) = extract_backtick_name(&diagnostic.message) else { return };
    let start = doc.line_index.offset(diagnostic.range.start);
    let end = doc.line_index.offset(diagnostic.range.end);
    let Some(stmt_text) = doc.source.get(start..end) else { return };

    if let Some(rel) = stmt_text.find(name.as_str()) {
        let name_start = start + rel;
        let name_end = name_start + name.len();
        let edit_range = Range { start: doc.line_index.position(name_start), end: doc.line_index.position(name_end) };
        actions.push(quickfix(
            format!("Prefix '{}' with _", name),
            diagnostic.clone(),
            uri,
            edit_range,
            format!("_{}", name),
        ));
    }

    actions.push(quickfix(format!("Remove unused `let {}`", name), diagnostic.clone(), uri, diagnostic.range, String::new()));
}

fn push_unknown_identifier_action(doc: &DocumentState, diagnostic: &tower_lsp::lsp_types::Diagnostic, uri: &Url, actions: &mut Vec<CodeActionOrCommand>) {
    let span = Span::new(doc.line_index.offset(diagnostic.range.start), doc.line_index.offset(diagnostic.range.end));
    if span.is_empty() {
        // Placeholder-positioned diagnostic; no safe range to edit.
        return;
    }
    let Some(name) = extract_backtick_name(&diagnostic.message) else { return };
    let candidates: Vec<&str> = doc.index.definitions.iter().map(|d| d.name.as_str()).collect();
    if let Some(suggestion) = find_similar(&name, &candidates, 2) {
        actions.push(quickfix(
            format!("Did you mean '{}'?", suggestion),
            diagnostic.clone(),
            uri,
            diagnostic.range,
            suggestion.to_string(),
        ));
    }
}

fn push_missing_semicolon_action(diagnostic: &tower_lsp::lsp_types::Diagnostic, uri: &Url, actions: &mut Vec<CodeActionOrCommand>) {
    actions.push(quickfix("Insert missing `;`".to_string(), diagnostic.clone(), uri, diagnostic.range, ";".to_string()));
}

fn push_type_hole_action(diagnostic: &tower_lsp::lsp_types::Diagnostic, uri: &Url, actions: &mut Vec<CodeActionOrCommand>) {
    let Some(suggested) = extract_backtick_name(&diagnostic.message) else { return };
    actions.push(quickfix(format!("Replace `_` with `{}`", suggested), diagnostic.clone(), uri, diagnostic.range, suggested));
}

fn quickfix(title: String, diagnostic: tower_lsp::lsp_types::Diagnostic, uri: &Url, range: Range, new_text: String) -> CodeActionOrCommand {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![TextEdit { range, new_text }]);
    CodeActionOrCommand::CodeAction(CodeAction {
        title,
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diagnostic]),
        edit: Some(WorkspaceEdit { changes: Some(changes), ..Default::default() }),
        ..Default::default()
    })
}

/// Pulls the first backtick-quoted identifier out of a diagnostic message
/// like `"unused binding `x`"`.
fn extract_backtick_name(message: &str) -> Option<String> {
    let start = message.find('`')? + 1;
    let rest = &message[start..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn ranges_overlap(a: &Range, b: &Range) -> bool {
    !(a.end.line < b.start.line
        || (a.end.line == b.start.line && a.end.character < b.start.character)
        || b.end.line < a.start.line
        || (b.end.line == a.start.line && b.end.character < a.start.character))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];
    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

fn find_similar<'a>(word: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let word_lower = word.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for &candidate in candidates {
        let dist = levenshtein(&word_lower, &candidate.to_lowercase());
        if dist <= max_distance {
            match best {
                None => best = Some((candidate, dist)),
                Some((_, d)) if dist < d => best = Some((candidate, dist)),
                _ => {}
            }
        }
    }
    best.map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position};

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    fn test_uri() -> Url {
        Url::parse("file:///test.lum").unwrap()
    }

    #[test]
    fn no_actions_for_valid_code() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return x; }");
        assert!(doc.diagnostics.is_empty());
        assert!(code_actions(&doc, Range::default(), &test_uri()).is_empty());
    }

    #[test]
    fn unused_binding_offers_prefix_and_remove() {
        let doc = make_doc("fn f() -> i32 { let x = 1; return 2; }");
        assert!(doc.diagnostics.iter().any(|d| d.code == Some(NumberOrString::String("UNUSED_BINDING".to_string()))));
        let actions = code_actions(&doc, Range::default(), &test_uri());
        let titles: Vec<String> = actions
            .iter()
            .map(|a| match a {
                CodeActionOrCommand::CodeAction(ca) => ca.title.clone(),
                _ => String::new(),
            })
            .collect();
        assert!(titles.iter().any(|t| t.contains("Prefix")), "{:?}", titles);
        assert!(titles.iter().any(|t| t.contains("Remove unused")), "{:?}", titles);
    }

    #[test]
    fn missing_semicolon_inserts_semicolon() {
        let diag = Diagnostic {
            range: Range { start: Position { line: 0, character: 5 }, end: Position { line: 0, character: 5 } },
            severity: Some(DiagnosticSeverity::WARNING),
            code: Some(NumberOrString::String("MISSING_SEMICOLON".to_string())),
            message: "missing `;`".to_string(),
            ..Default::default()
        };
        let mut doc = make_doc("fn f() {}");
        doc.diagnostics = vec![diag];
        let actions = code_actions(&doc, Range::default(), &test_uri());
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn type_hole_suggests_backtick_type() {
        let diag = Diagnostic {
            range: Range { start: Position { line: 0, character: 0 }, end: Position { line: 0, character: 1 } },
            severity: Some(DiagnosticSeverity::WARNING),
            code: Some(NumberOrString::String("TYPE-HOLE-UNRESOLVED".to_string())),
            message: "unresolved type hole, suggested `i32`".to_string(),
            ..Default::default()
        };
        let mut doc = make_doc("fn f() {}");
        doc.diagnostics = vec![diag];
        let actions = code_actions(&doc, Range::default(), &test_uri());
        let titles: Vec<String> = actions
            .iter()
            .map(|a| match a {
                CodeActionOrCommand::CodeAction(ca) => ca.title.clone(),
                _ => String::new(),
            })
            .collect();
        assert!(titles.iter().any(|t| t.contains("i32")), "{:?}", titles);
    }

    #[test]
    fn extract_backtick_name_basic() {
        assert_eq!(extract_backtick_name("unused binding `x`"), Some("x".to_string()));
        assert_eq!(extract_backtick_name("no backticks here"), None);
    }

    #[test]
    fn find_similar_typo() {
        assert_eq!(find_similar("cont", &["count", "other"], 2), Some("count"));
    }
}
