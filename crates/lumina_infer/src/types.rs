//! The type algebra (spec §3 Type, TypeScheme, Subst).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub type VarId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(String),
    Variable(VarId),
    Function(Vec<Type>, Box<Type>),
    Adt(String, Vec<Type>),
    Promise(Box<Type>),
    Hole(VarId),
}

impl Type {
    pub fn unit() -> Type {
        Type::Primitive("void".to_string())
    }

    pub fn free_vars(&self) -> HashSet<VarId> {
        let mut out = HashSet::new();
        self.collect_free_vars(&mut out);
        out
    }

    fn collect_free_vars(&self, out: &mut HashSet<VarId>) {
        match self {
            Type::Variable(v) | Type::Hole(v) => {
                out.insert(*v);
            }
            Type::Function(params, ret) => {
                for p in params {
                    p.collect_free_vars(out);
                }
                ret.collect_free_vars(out);
            }
            Type::Adt(_, params) => {
                for p in params {
                    p.collect_free_vars(out);
                }
            }
            Type::Promise(inner) => inner.collect_free_vars(out),
            Type::Primitive(_) => {}
        }
    }
}

/// A generalized type: `forall vars. type` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScheme {
    pub variables: Vec<VarId>,
    pub ty: Type,
}

impl TypeScheme {
    pub fn monomorphic(ty: Type) -> Self {
        Self { variables: Vec::new(), ty }
    }
}

/// A confluent variable → type mapping. `prune` is idempotent by
/// construction: resolving a variable always walks to a fixed point before
/// returning (spec §3 invariant).
#[derive(Debug, Default, Clone)]
pub struct Subst {
    map: BTreeMap<VarId, Type>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: VarId, ty: Type) {
        self.map.insert(var, ty);
    }

    /// Resolves `ty` to a fixed point under the current substitution.
    pub fn prune(&self, ty: &Type) -> Type {
        match ty {
            Type::Variable(v) | Type::Hole(v) => match self.map.get(v) {
                Some(bound) => self.prune(bound),
                None => ty.clone(),
            },
            Type::Function(params, ret) => {
                Type::Function(params.iter().map(|p| self.prune(p)).collect(), Box::new(self.prune(ret)))
            }
            Type::Adt(name, params) => Type::Adt(name.clone(), params.iter().map(|p| self.prune(p)).collect()),
            Type::Promise(inner) => Type::Promise(Box::new(self.prune(inner))),
            Type::Primitive(_) => ty.clone(),
        }
    }
}

/// Deterministic printer: primitives by name, variables as `unknown(tN)`,
/// functions as `(a, b) -> r`, ADTs as `Name<p1, p2>` (spec §4.5).
pub fn format_type(ty: &Type, subst: &Subst) -> String {
    match subst.prune(ty) {
        Type::Primitive(name) => name,
        Type::Variable(v) | Type::Hole(v) => format!("unknown(t{})", v),
        Type::Function(params, ret) => {
            let args: Vec<String> = params.iter().map(|p| format_type(p, subst)).collect();
            format!("({}) -> {}", args.join(", "), format_type(&ret, subst))
        }
        Type::Adt(name, params) => {
            if params.is_empty() {
                name
            } else {
                let args: Vec<String> = params.iter().map(|p| format_type(p, subst)).collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
        Type::Promise(inner) => format!("Promise<{}>", format_type(&inner, subst)),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_type(self, &Subst::new()))
    }
}

pub struct VarGen {
    next: VarId,
}

impl VarGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn fresh(&mut self) -> Type {
        let id = self.next;
        self.next += 1;
        Type::Variable(id)
    }

    pub fn fresh_hole(&mut self) -> Type {
        let id = self.next;
        self.next += 1;
        Type::Hole(id)
    }
}

impl Default for VarGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_is_idempotent() {
        let mut subst = Subst::new();
        subst.bind(0, Type::Variable(1));
        subst.bind(1, Type::Primitive("i32".to_string()));
        let once = subst.prune(&Type::Variable(0));
        let twice = subst.prune(&once);
        assert_eq!(once, twice);
        assert_eq!(once, Type::Primitive("i32".to_string()));
    }

    #[test]
    fn formats_function_and_adt_types() {
        let subst = Subst::new();
        let f = Type::Function(vec![Type::Primitive("i32".to_string())], Box::new(Type::Primitive("bool".to_string())));
        assert_eq!(format_type(&f, &subst), "(i32) -> bool");
        let adt = Type::Adt("Option".to_string(), vec![Type::Primitive("i32".to_string())]);
        assert_eq!(format_type(&adt, &subst), "Option<i32>");
    }
}
