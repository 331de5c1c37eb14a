//! Externally-visible signature extraction and function-body hashing
//! (spec §4.10 incremental invariants 1-2).
//!
//! Grounded on the teacher's `Manifest`/`DependencySpec` preference for a
//! small set of plain, serde-derived value types rather than a bespoke
//! diffing structure (`project/manifest.rs`): a signature is just a
//! `BTreeMap` serialized to a stable JSON string, so two signatures are
//! equal iff their canonical text is equal.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use lumina_syntax::ast::{FnDecl, Stmt, TypeExpr, Visibility};

/// The externally-visible shape of one declaration, as a stable string.
/// Two calls with an unchanged declaration always produce byte-identical
/// output; any change to the public surface changes it.
pub fn signature_of(stmt: &Stmt) -> Option<(String, String)> {
    match stmt {
        Stmt::FnDecl(f) => Some((f.name.clone(), fn_signature(f))),
        Stmt::StructDecl(d) => Some((d.name.clone(), format!("struct:{}:{:?}", d.name, d.visibility))),
        Stmt::EnumDecl(d) => Some((d.name.clone(), format!("enum:{}:{:?}", d.name, d.visibility))),
        Stmt::TypeDecl(d) => Some((d.name.clone(), format!("type:{}:{:?}", d.name, d.visibility))),
        _ => None,
    }
}

fn fn_signature(f: &FnDecl) -> String {
    let mut map = BTreeMap::new();
    map.insert("params".to_string(), format!("{:?}", f.params.iter().map(|p| type_repr(p.ty.as_ref())).collect::<Vec<_>>()));
    map.insert("returnType".to_string(), type_repr(f.return_type.as_ref()));
    map.insert("visibility".to_string(), visibility_repr(f.visibility).to_string());
    map.insert("extern".to_string(), f.is_extern.to_string());
    map.insert("externModule".to_string(), f.extern_module.clone().unwrap_or_default());
    map.insert("typeParams".to_string(), format!("{}", f.type_params.len()));
    serde_json::to_string(&map).unwrap_or_default()
}

fn visibility_repr(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Private => "private",
    }
}

fn type_repr(ty: Option<&TypeExpr>) -> String {
    match ty {
        Some(t) => format!("{:?}", t),
        None => "_".to_string(),
    }
}

/// A stable hash of a function's body, used to decide whether re-inferring
/// its body can be skipped on reparse (spec §4.10 invariant 2). Falls back
/// to hashing the `Debug` rendering of the body AST, which is stable across
/// runs in the same process since it carries no addresses or `HashMap`
/// iteration order.
pub fn body_hash(f: &FnDecl) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", f.body).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::Parser;

    fn fn_decl(src: &str) -> FnDecl {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().unwrap();
        match program.body.into_iter().next().unwrap() {
            Stmt::FnDecl(f) => f,
            _ => panic!("expected fn"),
        }
    }

    #[test]
    fn signature_unchanged_when_body_changes_but_shape_does_not() {
        let a = fn_decl("fn f(x: i32) -> i32 { return x + 1; }");
        let b = fn_decl("fn f(x: i32) -> i32 { return x + 2; }");
        assert_eq!(fn_signature(&a), fn_signature(&b));
        assert_ne!(body_hash(&a), body_hash(&b));
    }

    #[test]
    fn signature_changes_when_return_type_changes() {
        let a = fn_decl("fn f(x: i32) -> i32 { return x; }");
        let b = fn_decl("fn f(x: i32) -> bool { return true; }");
        assert_ne!(fn_signature(&a), fn_signature(&b));
    }
}
