//! Converts compiler diagnostics into LSP diagnostics (spec §4.11).

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};

use lumina_base::{Diagnostic as CoreDiagnostic, Severity};

use crate::line_index::LineIndex;

/// Convert every compiler diagnostic for a document into its LSP form,
/// positioning each with `line_index` rather than trusting the compiler's
/// own (often placeholder) `line`/`column` fields.
pub fn convert(diagnostics: &[CoreDiagnostic], line_index: &LineIndex) -> Vec<Diagnostic> {
    diagnostics.iter().map(|d| convert_one(d, line_index)).collect()
}

fn convert_one(diagnostic: &CoreDiagnostic, line_index: &LineIndex) -> Diagnostic {
    let start = line_index.position(diagnostic.span.start);
    let end_offset = diagnostic.span.end.max(diagnostic.span.start + 1);
    let end = line_index.position(end_offset);

    Diagnostic {
        range: Range { start, end },
        severity: Some(severity(diagnostic.severity)),
        code: Some(NumberOrString::String(diagnostic.code.clone())),
        source: Some("lumina".to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

fn severity(s: Severity) -> DiagnosticSeverity {
    match s {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_base::Span;

    #[test]
    fn error_severity_maps_to_lsp_error() {
        let idx = LineIndex::new("let x = 1;");
        let d = CoreDiagnostic::error("UNKNOWN_IDENTIFIER", "unknown identifier `x`", Span::new(4, 5), 1, 5);
        let out = convert(&[d], &idx);
        assert_eq!(out[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(out[0].range.start.character, 4);
    }

    #[test]
    fn warning_severity_maps_to_lsp_warning() {
        let idx = LineIndex::new("let x = 1;");
        let d = CoreDiagnostic::warning("UNUSED_BINDING", "unused binding `x`", Span::new(4, 5), 1, 5);
        let out = convert(&[d], &idx);
        assert_eq!(out[0].severity, Some(DiagnosticSeverity::WARNING));
    }
}
