//! Unification over [`Type`] (spec §4.5).

use crate::types::{Subst, Type, VarId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifyError {
    pub left: Type,
    pub right: Type,
}

pub fn unify(a: &Type, b: &Type, subst: &mut Subst) -> Result<(), UnifyError> {
    let a = subst.prune(a);
    let b = subst.prune(b);
    match (&a, &b) {
        (Type::Variable(v), _) => bind(*v, &b, subst),
        (_, Type::Variable(v)) => bind(*v, &a, subst),
        (Type::Hole(v), _) => bind(*v, &b, subst),
        (_, Type::Hole(v)) => bind(*v, &a, subst),
        (Type::Primitive(x), Type::Primitive(y)) if x == y => Ok(()),
        (Type::Function(pa, ra), Type::Function(pb, rb)) => {
            if pa.len() != pb.len() {
                return Err(UnifyError { left: a.clone(), right: b.clone() });
            }
            for (x, y) in pa.iter().zip(pb.iter()) {
                unify(x, y, subst)?;
            }
            unify(ra, rb, subst)
        }
        (Type::Adt(na, pa), Type::Adt(nb, pb)) if na == nb && pa.len() == pb.len() => {
            for (x, y) in pa.iter().zip(pb.iter()) {
                unify(x, y, subst)?;
            }
            Ok(())
        }
        (Type::Promise(ia), Type::Promise(ib)) => unify(ia, ib, subst),
        _ => Err(UnifyError { left: a, right: b }),
    }
}

fn bind(var: VarId, ty: &Type, subst: &mut Subst) -> Result<(), UnifyError> {
    if let Type::Variable(other) = ty {
        if *other == var {
            return Ok(());
        }
    }
    if occurs(var, ty, subst) {
        return Err(UnifyError { left: Type::Variable(var), right: ty.clone() });
    }
    subst.bind(var, ty.clone());
    Ok(())
}

fn occurs(var: VarId, ty: &Type, subst: &Subst) -> bool {
    subst.prune(ty).free_vars().contains(&var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_variable_with_primitive() {
        let mut subst = Subst::new();
        unify(&Type::Variable(0), &Type::Primitive("i32".to_string()), &mut subst).unwrap();
        assert_eq!(subst.prune(&Type::Variable(0)), Type::Primitive("i32".to_string()));
    }

    #[test]
    fn rejects_mismatched_primitives() {
        let mut subst = Subst::new();
        let err = unify(&Type::Primitive("i32".to_string()), &Type::Primitive("bool".to_string()), &mut subst).unwrap_err();
        assert_eq!(err.left, Type::Primitive("i32".to_string()));
    }

    #[test]
    fn rejects_arity_mismatch_in_functions() {
        let mut subst = Subst::new();
        let a = Type::Function(vec![Type::Primitive("i32".to_string())], Box::new(Type::Primitive("i32".to_string())));
        let b = Type::Function(vec![], Box::new(Type::Primitive("i32".to_string())));
        assert!(unify(&a, &b, &mut subst).is_err());
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut subst = Subst::new();
        let recursive = Type::Function(vec![Type::Variable(0)], Box::new(Type::Primitive("i32".to_string())));
        assert!(unify(&Type::Variable(0), &recursive, &mut subst).is_err());
    }
}
