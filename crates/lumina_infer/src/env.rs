//! Lexically nested type environment used during inference (distinct from
//! the semantic analyzer's [`crate::symbols::SymbolTable`], which tracks
//! visibility/import resolution rather than inferred types).

use std::collections::HashMap;

use crate::types::TypeScheme;

pub struct TypeEnv {
    scopes: Vec<HashMap<String, TypeScheme>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn bind(&mut self, name: impl Into<String>, scheme: TypeScheme) {
        self.scopes.last_mut().expect("at least one scope").insert(name.into(), scheme);
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeScheme> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    /// Free variables of the environment, used by generalization to decide
    /// which of a `let`-bound value's free variables may be quantified.
    pub fn free_vars(&self) -> std::collections::HashSet<crate::types::VarId> {
        let mut out = std::collections::HashSet::new();
        for scope in &self.scopes {
            for scheme in scope.values() {
                for v in scheme.ty.free_vars() {
                    if !scheme.variables.contains(&v) {
                        out.insert(v);
                    }
                }
            }
        }
        out
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
