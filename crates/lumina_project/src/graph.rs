//! Import dependency graph keyed by canonical document URI (spec §4.10).

use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct DependencyGraph {
    /// importer uri -> set of uris it imports
    forward: HashMap<String, HashSet<String>>,
    /// imported uri -> set of importers that depend on it
    reverse: HashMap<String, HashSet<String>>,
    /// importer uri -> (imported uri -> names imported from it), used by
    /// `dependents_for_symbols` to filter which dependents actually care
    /// about a given changed symbol.
    imported_names: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all outgoing edges for `importer` with `edges`, keeping the
    /// reverse index consistent.
    pub fn set_imports(&mut self, importer: &str, edges: Vec<(String, Vec<String>)>) {
        self.clear_imports(importer);
        let mut forward = HashSet::new();
        let mut names = HashMap::new();
        for (target, imported) in edges {
            self.reverse.entry(target.clone()).or_default().insert(importer.to_string());
            forward.insert(target.clone());
            names.insert(target, imported.into_iter().collect());
        }
        self.forward.insert(importer.to_string(), forward);
        self.imported_names.insert(importer.to_string(), names);
    }

    pub fn clear_imports(&mut self, importer: &str) {
        if let Some(old) = self.forward.remove(importer) {
            for target in old {
                if let Some(importers) = self.reverse.get_mut(&target) {
                    importers.remove(importer);
                }
            }
        }
        self.imported_names.remove(importer);
    }

    /// Removes `uri` entirely: its outgoing edges and any edges pointing at
    /// it from other documents.
    pub fn remove(&mut self, uri: &str) {
        self.clear_imports(uri);
        self.reverse.remove(uri);
        for importers in self.reverse.values_mut() {
            importers.remove(uri);
        }
    }

    /// Number of documents that import at least one other document
    /// (`--profile-cache`'s graph node count).
    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    /// Total import edges across every tracked document.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|s| s.len()).sum()
    }

    pub fn dependents_of(&self, uri: &str) -> Vec<String> {
        self.reverse.get(uri).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }

    /// Dependents of `uri` whose imported-names set from `uri` intersects
    /// `changed_names` (spec §4.10 `getDependentsForSymbols`).
    pub fn dependents_for_symbols(&self, uri: &str, changed_names: &HashSet<String>) -> Vec<String> {
        self.dependents_of(uri)
            .into_iter()
            .filter(|importer| {
                self.imported_names
                    .get(importer)
                    .and_then(|m| m.get(uri))
                    .map(|names| names.intersection(changed_names).next().is_some())
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependents_are_tracked_through_reverse_edges() {
        let mut g = DependencyGraph::new();
        g.set_imports("a.lum", vec![("b.lum".to_string(), vec!["foo".to_string()])]);
        assert_eq!(g.dependents_of("b.lum"), vec!["a.lum".to_string()]);
    }

    #[test]
    fn dependents_for_symbols_filters_by_imported_name() {
        let mut g = DependencyGraph::new();
        g.set_imports("a.lum", vec![("b.lum".to_string(), vec!["foo".to_string()])]);
        g.set_imports("c.lum", vec![("b.lum".to_string(), vec!["bar".to_string()])]);
        let changed: HashSet<String> = ["foo".to_string()].into_iter().collect();
        assert_eq!(g.dependents_for_symbols("b.lum", &changed), vec!["a.lum".to_string()]);
    }

    #[test]
    fn reimport_replaces_stale_edges() {
        let mut g = DependencyGraph::new();
        g.set_imports("a.lum", vec![("b.lum".to_string(), vec!["foo".to_string()])]);
        g.set_imports("a.lum", vec![("c.lum".to_string(), vec!["foo".to_string()])]);
        assert!(g.dependents_of("b.lum").is_empty());
        assert_eq!(g.dependents_of("c.lum"), vec!["a.lum".to_string()]);
    }

    #[test]
    fn remove_clears_both_directions() {
        let mut g = DependencyGraph::new();
        g.set_imports("a.lum", vec![("b.lum".to_string(), vec!["foo".to_string()])]);
        g.remove("a.lum");
        assert!(g.dependents_of("b.lum").is_empty());
    }
}
