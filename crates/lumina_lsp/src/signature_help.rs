//! Signature help (spec §4.11): when the cursor sits inside a call's
//! argument list, show the callee's parameter list and highlight the
//! active parameter. Grounded on the teacher's backward-scan-for-call
//! strategy, re-keyed onto lumina's own paren/comma token vocabulary
//! (lumina has no "Call ... with ... and ..." phrase syntax, so the
//! call site is found by paren-depth tracking instead of a `Call` token).

use tower_lsp::lsp_types::{Documentation, ParameterInformation, ParameterLabel, Position, SignatureHelp, SignatureInformation};

use lumina_syntax::token::{OperatorKind, TokenKind};

use crate::document::DocumentState;
use crate::index::DefKind;

pub fn signature_help(doc: &DocumentState, position: Position) -> Option<SignatureHelp> {
    let offset = doc.line_index.offset(position);
    let (name_idx, open_idx) = find_enclosing_call(doc, offset)?;

    let func_name = &doc.tokens[name_idx].lexeme;
    let def = doc.index.definitions.iter().find(|d| d.name == *func_name && d.kind == DefKind::Function)?;
    let detail = &def.detail;

    let active_param = doc.tokens[open_idx..]
        .iter()
        .take_while(|t| t.offset < offset)
        .filter(|t| matches!(t.kind, TokenKind::Operator(OperatorKind::Comma)))
        .count();

    let params: Vec<ParameterInformation> = extract_params_from_signature(detail)
        .into_iter()
        .map(|(name, ty)| ParameterInformation {
            label: ParameterLabel::Simple(name.clone()),
            documentation: Some(Documentation::String(format!("{}: {}", name, ty))),
        })
        .collect();

    Some(SignatureHelp {
        signatures: vec![SignatureInformation {
            label: detail.clone(),
            documentation: None,
            parameters: if params.is_empty() { None } else { Some(params) },
            active_parameter: Some(active_param as u32),
        }],
        active_signature: Some(0),
        active_parameter: Some(active_param as u32),
    })
}

/// Scans backward from `offset` tracking paren depth to find the nearest
/// unclosed `(` before the cursor, then returns `(identifier_index,
/// open_paren_index)` for the call it opens, or `None` if the cursor
/// isn't inside any call's argument list.
fn find_enclosing_call(doc: &DocumentState, offset: usize) -> Option<(usize, usize)> {
    let mut depth = 0i32;
    for (idx, token) in doc.tokens.iter().enumerate().rev() {
        if token.offset >= offset {
            continue;
        }
        match token.kind {
            TokenKind::Operator(OperatorKind::RParen) => depth += 1,
            TokenKind::Operator(OperatorKind::LParen) => {
                if depth == 0 {
                    let name_idx = idx.checked_sub(1)?;
                    if matches!(doc.tokens[name_idx].kind, TokenKind::Identifier) {
                        return Some((name_idx, idx));
                    }
                    return None;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Parses `"fn name(a: Type1, b: Type2) -> Ret"` into `[(a, Type1), (b, Type2)]`.
fn extract_params_from_signature(detail: &str) -> Vec<(String, String)> {
    let Some(open) = detail.find('(') else { return vec![] };
    let Some(close) = detail.find(')') else { return vec![] };
    if close <= open + 1 {
        return vec![];
    }
    let params_str = &detail[open + 1..close];
    params_str
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let mut split = part.splitn(2, ':');
            let name = split.next()?.trim().to_string();
            let ty = split.next().map(|s| s.trim().to_string()).unwrap_or_else(|| "unknown".to_string());
            Some((name, ty))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(source: &str) -> DocumentState {
        DocumentState::new(source.to_string(), 1)
    }

    #[test]
    fn signature_help_returns_none_without_call() {
        let doc = make_doc("fn f() -> i32 { let x = 5; return x; }");
        let offset = doc.source.find('x').unwrap();
        let pos = doc.line_index.position(offset);
        assert!(signature_help(&doc, pos).is_none());
    }

    #[test]
    fn signature_help_no_crash_empty_doc() {
        let doc = make_doc("");
        let pos = Position { line: 0, character: 0 };
        assert!(signature_help(&doc, pos).is_none());
    }

    #[test]
    fn extract_params_basic() {
        let params = extract_params_from_signature("fn add(a: i32, b: i32) -> i32");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], ("a".to_string(), "i32".to_string()));
        assert_eq!(params[1], ("b".to_string(), "i32".to_string()));
    }

    #[test]
    fn extract_params_empty() {
        let params = extract_params_from_signature("fn noop() -> void");
        assert!(params.is_empty());
    }

    #[test]
    fn signature_help_returns_signature_for_call() {
        let source = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }";
        let doc = make_doc(source);
        let offset = doc.source.rfind("1, 2").unwrap();
        let pos = doc.line_index.position(offset);
        let result = signature_help(&doc, pos);
        let help = result.expect("expected signature help inside call");
        let sig = &help.signatures[0];
        let params = sig.parameters.as_ref().expect("expected parameters");
        let names: Vec<&str> = params
            .iter()
            .map(|p| match &p.label {
                ParameterLabel::Simple(s) => s.as_str(),
                _ => "",
            })
            .collect();
        assert!(names.contains(&"a") && names.contains(&"b"));
    }

    #[test]
    fn active_parameter_tracks_comma() {
        let source = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }";
        let doc = make_doc(source);
        let offset = doc.source.rfind('2').unwrap();
        let pos = doc.line_index.position(offset);
        let help = signature_help(&doc, pos).expect("expected signature help");
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn cursor_outside_parens_returns_none() {
        let source = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }";
        let doc = make_doc(source);
        let offset = doc.source.find("fn f").unwrap();
        let pos = doc.line_index.position(offset);
        assert!(signature_help(&doc, pos).is_none());
    }
}
