//! A single tracked source document and its analysis artifacts
//! (spec §3 Document, §4.10).

use std::collections::{HashMap, HashSet};

use lumina_base::Diagnostic;
use lumina_infer::{analyze, InferEngine, InferOutput, SemanticOptions};
use lumina_syntax::ast::{Program, Stmt};
use lumina_syntax::Parser;

use crate::signature::{body_hash, signature_of};

pub struct Document {
    pub uri: String,
    pub version: i64,
    pub text: String,
    pub program: Option<Program>,
    pub diagnostics: Vec<Diagnostic>,
    pub signatures: HashMap<String, String>,
    pub function_hashes: HashMap<String, u64>,
    /// Resolved-specifier -> imported names, built from the document's own
    /// `import` statements.
    pub import_specifiers: Vec<(String, Vec<String>)>,
    pub inferred_fn_returns: HashMap<String, lumina_infer::Type>,
}

pub struct ParseChange {
    pub signature_changed: bool,
    pub changed_symbols: HashSet<String>,
}

impl Document {
    pub fn new(uri: String, text: String, version: i64) -> Self {
        Document {
            uri,
            version,
            text,
            program: None,
            diagnostics: Vec::new(),
            signatures: HashMap::new(),
            function_hashes: HashMap::new(),
            import_specifiers: Vec::new(),
            inferred_fn_returns: HashMap::new(),
        }
    }

    /// Reparses the document's current text, recomputes signatures and
    /// function hashes, runs semantic analysis and inference, and reports
    /// which externally-visible names changed (spec §4.10 invariants 1-3).
    pub fn reparse(&mut self, extern_symbols: &HashSet<String>) -> ParseChange {
        self.diagnostics.clear();

        let mut parser = Parser::new(&self.text);
        let program = match parser.parse_program() {
            Ok(p) => p,
            Err(e) => {
                let span = e.location.span();
                self.diagnostics.push(Diagnostic::error("syntax-error", e.message.clone(), span, e.location.start.line, e.location.start.column));
                self.program = None;
                return ParseChange { signature_changed: !self.signatures.is_empty(), changed_symbols: HashSet::new() };
            }
        };

        self.import_specifiers = program
            .body
            .iter()
            .filter_map(|s| match s {
                Stmt::Import(d) => Some((d.specifier.clone(), d.names.clone())),
                _ => None,
            })
            .collect();

        let imported_names: HashSet<String> = self.import_specifiers.iter().flat_map(|(_, names)| names.iter().cloned()).collect();

        let semantic = analyze(&program, &SemanticOptions { extern_symbols, imported_names: &imported_names });
        self.diagnostics.extend(semantic.diagnostics);

        let infer: InferOutput = InferEngine::new().infer_program(&program);
        self.diagnostics.extend(infer.diagnostics);
        self.inferred_fn_returns = infer.inferred_fn_returns;

        let mut next_signatures = HashMap::new();
        let mut next_hashes = HashMap::new();
        for stmt in &program.body {
            if let Some((name, sig)) = signature_of(stmt) {
                next_signatures.insert(name, sig);
            }
            if let Stmt::FnDecl(f) = stmt {
                next_hashes.insert(f.name.clone(), body_hash(f));
            }
        }

        let changed_symbols: HashSet<String> = next_signatures
            .iter()
            .filter(|(name, sig)| self.signatures.get(*name) != Some(sig))
            .map(|(name, _)| name.clone())
            .chain(self.signatures.keys().filter(|name| !next_signatures.contains_key(*name)).cloned())
            .collect();

        let signature_changed = !changed_symbols.is_empty();

        self.signatures = next_signatures;
        self.function_hashes = next_hashes;
        self.program = Some(program);

        ParseChange { signature_changed, changed_symbols }
    }

    pub fn imported_names(&self) -> HashSet<String> {
        self.import_specifiers.iter().flat_map(|(_, names)| names.iter().cloned()).collect()
    }
}
