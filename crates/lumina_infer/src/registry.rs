//! ADT and trait registries, built from `EnumDecl`/`StructDecl`/`TraitDecl`/
//! `ImplDecl` (spec §4.5 step 1). Grounded on the teacher's `TypeRegistry`:
//! a flat name→definition map plus a variant→owner lookup, generalized here
//! from a fixed NLP type taxonomy to parsed `EnumDecl`/`StructDecl` nodes.

use std::collections::HashMap;

use lumina_syntax::ast::{EnumDecl, FieldDecl, StructDecl, TraitDecl, VariantDecl};

#[derive(Debug, Clone)]
pub struct VariantInfo {
    pub name: String,
    pub payload_arity: usize,
}

#[derive(Debug, Clone)]
pub enum TypeDef {
    Struct { type_params: Vec<String>, fields: Vec<FieldDecl> },
    Enum { type_params: Vec<String>, variants: Vec<VariantInfo> },
}

#[derive(Debug, Default)]
pub struct AdtRegistry {
    types: HashMap<String, TypeDef>,
    /// variant name -> owning enum name (variant names are unique project-wide).
    variant_owner: HashMap<String, String>,
}

impl AdtRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_enum(&mut self, decl: &EnumDecl) {
        let variants: Vec<VariantInfo> = decl
            .variants
            .iter()
            .map(|v: &VariantDecl| VariantInfo { name: v.name.clone(), payload_arity: v.payload.len() })
            .collect();
        for v in &variants {
            self.variant_owner.insert(v.name.clone(), decl.name.clone());
        }
        let type_params = decl.type_params.iter().map(|p| p.name.clone()).collect();
        self.types.insert(decl.name.clone(), TypeDef::Enum { type_params, variants });
    }

    pub fn register_struct(&mut self, decl: &StructDecl) {
        let type_params = decl.type_params.iter().map(|p| p.name.clone()).collect();
        self.types.insert(decl.name.clone(), TypeDef::Struct { type_params, fields: decl.fields.clone() });
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn enum_variants(&self, enum_name: &str) -> Option<&[VariantInfo]> {
        match self.types.get(enum_name)? {
            TypeDef::Enum { variants, .. } => Some(variants),
            _ => None,
        }
    }

    /// Resolves an unqualified variant name to its owning enum, for
    /// `EnumName.Variant(...)`-free constructor calls.
    pub fn find_variant_owner(&self, variant_name: &str) -> Option<&str> {
        self.variant_owner.get(variant_name).map(|s| s.as_str())
    }

    pub fn find_variant(&self, enum_name: &str, variant_name: &str) -> Option<&VariantInfo> {
        self.enum_variants(enum_name)?.iter().find(|v| v.name == variant_name)
    }
}

#[derive(Debug, Clone)]
pub struct TraitMethodArity {
    pub name: String,
    pub arity: usize,
}

#[derive(Debug, Default)]
pub struct TraitRegistry {
    traits: HashMap<String, Vec<TraitMethodArity>>,
    /// (trait, type) pairs with a registered `impl Trait for Type`.
    impls: std::collections::HashSet<(String, String)>,
}

impl TraitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_trait(&mut self, decl: &TraitDecl) {
        let methods = decl.methods.iter().map(|m| TraitMethodArity { name: m.name.clone(), arity: m.params.len() }).collect();
        self.traits.insert(decl.name.clone(), methods);
    }

    pub fn register_impl(&mut self, trait_name: &str, type_name: &str) {
        self.impls.insert((trait_name.to_string(), type_name.to_string()));
    }

    pub fn is_known_trait(&self, name: &str) -> bool {
        self.traits.contains_key(name)
    }

    /// Returns true if `Type` has a registered `impl Trait for Type`. Used
    /// to check `T: Trait` bounds once `T` is resolved to a concrete type
    /// at a call site (spec §4.5 "Trait bounds").
    pub fn type_satisfies(&self, trait_name: &str, type_name: &str) -> bool {
        self.impls.contains(&(trait_name.to_string(), type_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::ast::Visibility;

    fn enum_decl(name: &str, variants: &[(&str, usize)]) -> EnumDecl {
        EnumDecl {
            id: lumina_syntax::ast::NodeId(0),
            name: name.to_string(),
            type_params: Vec::new(),
            variants: variants
                .iter()
                .map(|(n, arity)| VariantDecl { name: n.to_string(), payload: vec![lumina_syntax_type_hole(); *arity] })
                .collect(),
            visibility: Visibility::Public,
            location: None,
        }
    }

    fn lumina_syntax_type_hole() -> lumina_syntax::ast::TypeExpr {
        lumina_syntax::ast::TypeExpr::Hole { id: lumina_syntax::ast::NodeId(0), location: None }
    }

    #[test]
    fn registers_enum_and_resolves_variant_owner() {
        let mut reg = AdtRegistry::new();
        reg.register_enum(&enum_decl("Option", &[("Some", 1), ("None", 0)]));
        assert!(reg.is_known("Option"));
        assert_eq!(reg.find_variant_owner("Some"), Some("Option"));
        assert_eq!(reg.find_variant("Option", "None").unwrap().payload_arity, 0);
    }

    #[test]
    fn trait_registry_tracks_impls() {
        let mut reg = TraitRegistry::new();
        reg.register_impl("Printable", "i32");
        assert!(reg.type_satisfies("Printable", "i32"));
        assert!(!reg.type_satisfies("Printable", "bool"));
    }
}
