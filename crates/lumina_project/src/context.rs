//! The incremental multi-file project context (spec §4.10).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use lumina_base::Diagnostic;

use crate::document::{Document, ParseChange};
use crate::graph::DependencyGraph;
use crate::resolve::resolve_import;

pub struct AddOrUpdateResult {
    pub signature_changed: bool,
    pub changed_symbols: HashSet<String>,
}

/// Maintains tracked documents, their import graph, and the in-memory
/// prelude/standard module registry. Single-threaded cooperative per spec
/// §4.10/§5: every operation here runs to completion before the next is
/// invoked, and the host is responsible for debouncing rapid edits.
pub struct ProjectContext {
    documents: HashMap<String, Document>,
    graph: DependencyGraph,
    virtual_files: HashMap<String, String>,
    prelude_symbols: HashSet<String>,
    prelude_names: HashSet<String>,
    module_registry: HashSet<String>,
    file_extensions: Vec<String>,
}

impl Default for ProjectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectContext {
    pub fn new() -> Self {
        ProjectContext {
            documents: HashMap::new(),
            graph: DependencyGraph::new(),
            virtual_files: HashMap::new(),
            prelude_symbols: HashSet::new(),
            prelude_names: HashSet::new(),
            module_registry: HashSet::new(),
            file_extensions: vec![".lm".to_string(), ".lumina".to_string()],
        }
    }

    pub fn with_file_extensions(mut self, extensions: Vec<String>) -> Self {
        self.file_extensions = extensions;
        self
    }

    /// Registers an in-memory document (prelude, standard library, or test
    /// fixture) that participates in import resolution without touching
    /// disk.
    pub fn add_virtual_file(&mut self, specifier: String, text: String) {
        self.virtual_files.insert(specifier, text);
    }

    pub fn register_prelude_symbol(&mut self, name: String) {
        self.prelude_symbols.insert(name.clone());
        self.prelude_names.insert(name);
    }

    pub fn register_std_module(&mut self, name: String) {
        self.module_registry.insert(name);
    }

    /// `addOrUpdateDocument(uri, text, version)` (spec §4.10).
    pub fn add_or_update_document(&mut self, uri: String, text: String, version: i64) -> AddOrUpdateResult {
        let mut doc = self.documents.remove(&uri).unwrap_or_else(|| Document::new(uri.clone(), String::new(), 0));
        doc.text = text;
        doc.version = version;

        let change = self.reparse_document(&mut doc);

        self.documents.insert(uri.clone(), doc);

        if change.signature_changed {
            let dependents = self.graph.dependents_for_symbols(&uri, &change.changed_symbols);
            for dependent in dependents {
                if let Some(mut dep_doc) = self.documents.remove(&dependent) {
                    self.reparse_document(&mut dep_doc);
                    self.documents.insert(dependent, dep_doc);
                }
            }
        }

        AddOrUpdateResult { signature_changed: change.signature_changed, changed_symbols: change.changed_symbols }
    }

    fn reparse_document(&mut self, doc: &mut Document) -> ParseChange {
        let change = doc.reparse(&self.prelude_symbols);

        let importer_path = Path::new(&doc.uri);
        let mut edges = Vec::new();
        for (specifier, names) in &doc.import_specifiers {
            match resolve_import(specifier, importer_path, &self.file_extensions, &self.module_registry) {
                Ok(resolved) => edges.push((resolved, names.clone())),
                Err(e) => {
                    doc.diagnostics.push(Diagnostic::error(
                        "IMPORT_UNRESOLVED",
                        e.to_string(),
                        lumina_base::Span::default(),
                        0,
                        0,
                    ));
                }
            }
        }
        self.graph.set_imports(&doc.uri, edges);

        change
    }

    /// `removeDocument(uri)` (spec §4.10).
    pub fn remove_document(&mut self, uri: &str) {
        self.documents.remove(uri);
        self.graph.remove(uri);
    }

    /// `parseDocument(uri)` (spec §4.10): reparse the already-tracked
    /// document's current text without changing its version.
    pub fn parse_document(&mut self, uri: &str) -> Option<AddOrUpdateResult> {
        let mut doc = self.documents.remove(uri)?;
        let change = self.reparse_document(&mut doc);
        self.documents.insert(uri.to_string(), doc);
        Some(AddOrUpdateResult { signature_changed: change.signature_changed, changed_symbols: change.changed_symbols })
    }

    /// `getDiagnostics(uri?)` (spec §4.10).
    pub fn get_diagnostics(&self, uri: Option<&str>) -> Vec<&Diagnostic> {
        match uri {
            Some(uri) => self.documents.get(uri).map(|d| d.diagnostics.iter().collect()).unwrap_or_default(),
            None => self.documents.values().flat_map(|d| d.diagnostics.iter()).collect(),
        }
    }

    /// `getDependentsForSymbols(uri, names)` (spec §4.10).
    pub fn get_dependents_for_symbols(&self, uri: &str, names: &HashSet<String>) -> Vec<String> {
        self.graph.dependents_for_symbols(uri, names)
    }

    pub fn document(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Import-graph node/edge counts, surfaced by `--profile-cache`.
    pub fn graph_node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn graph_edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_a_function_body_without_signature_change_does_not_reparse_dependents() {
        let mut ctx = ProjectContext::new();
        ctx.add_or_update_document("/p/a.lm".to_string(), "fn helper() -> i32 { return 1; }".to_string(), 1);
        ctx.add_or_update_document(
            "/p/b.lm".to_string(),
            "import { helper } from \"./a\";\nfn main() -> i32 { return helper(); }".to_string(),
            1,
        );

        let result = ctx.add_or_update_document("/p/a.lm".to_string(), "fn helper() -> i32 { return 2; }".to_string(), 2);
        assert!(!result.signature_changed);
    }

    #[test]
    fn changing_a_return_type_is_reported_as_a_signature_change() {
        let mut ctx = ProjectContext::new();
        ctx.add_or_update_document("/p/a.lm".to_string(), "fn helper() -> i32 { return 1; }".to_string(), 1);
        let result = ctx.add_or_update_document("/p/a.lm".to_string(), "fn helper() -> bool { return true; }".to_string(), 2);
        assert!(result.signature_changed);
        assert!(result.changed_symbols.contains("helper"));
    }

    #[test]
    fn remove_document_clears_its_diagnostics() {
        let mut ctx = ProjectContext::new();
        ctx.add_or_update_document("/p/a.lm".to_string(), "fn f() -> i32 { return nope; }".to_string(), 1);
        assert!(!ctx.get_diagnostics(Some("/p/a.lm")).is_empty());
        ctx.remove_document("/p/a.lm");
        assert!(ctx.get_diagnostics(Some("/p/a.lm")).is_empty());
    }
}
