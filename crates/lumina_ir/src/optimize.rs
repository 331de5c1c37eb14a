//! The three-pass optimizer: constant folding, loop-safe constant
//! propagation, then dead-code elimination, in that fixed order (spec §4.7).

use std::collections::HashMap;

use crate::instr::{BinaryOp, Const, Instr, IrFunction, UnaryOp};

/// Runs the optimizer, or returns the IR unchanged when `no_optimize` is
/// set (the `noOptimize` debugging toggle).
pub fn optimize(func: &mut IrFunction, no_optimize: bool) {
    if no_optimize {
        return;
    }
    fold_constants(func);
    propagate_constants(func);
    eliminate_dead_code(func);
}

/// Pass 1: replaces an arithmetic/comparison instruction whose operands are
/// both literal constants (tracked purely through `Const` definitions
/// visible earlier in the same instruction stream) with a single `Const`.
fn fold_constants(func: &mut IrFunction) {
    let mut known: HashMap<crate::instr::Temp, Const> = HashMap::new();
    for instr in &mut func.body {
        if let Instr::Const { dest, value } = instr {
            known.insert(*dest, value.clone());
            continue;
        }
        if let Some(folded) = try_fold(instr, &known) {
            let dest = instr.defined_temp().expect("fold target always defines a temp");
            known.insert(dest, folded.clone());
            *instr = Instr::Const { dest, value: folded };
        }
    }
}

fn try_fold(instr: &Instr, known: &HashMap<crate::instr::Temp, Const>) -> Option<Const> {
    match instr {
        Instr::BinOp { op, lhs, rhs, .. } => fold_binop(*op, known.get(lhs)?, known.get(rhs)?),
        Instr::UnOp { op, operand, .. } => fold_unop(*op, known.get(operand)?),
        _ => None,
    }
}

fn fold_binop(op: BinaryOp, l: &Const, r: &Const) -> Option<Const> {
    use BinaryOp::*;
    match (l, r) {
        (Const::Int(a), Const::Int(b)) => match op {
            Add => Some(Const::Int(a.checked_add(*b)?)),
            Sub => Some(Const::Int(a.checked_sub(*b)?)),
            Mul => Some(Const::Int(a.checked_mul(*b)?)),
            Div if *b != 0 => Some(Const::Int(a / b)),
            Rem if *b != 0 => Some(Const::Int(a % b)),
            Eq => Some(Const::Bool(a == b)),
            NotEq => Some(Const::Bool(a != b)),
            Lt => Some(Const::Bool(a < b)),
            LtEq => Some(Const::Bool(a <= b)),
            Gt => Some(Const::Bool(a > b)),
            GtEq => Some(Const::Bool(a >= b)),
            _ => None,
        },
        (Const::Float(a), Const::Float(b)) => match op {
            Add => Some(Const::Float(a + b)),
            Sub => Some(Const::Float(a - b)),
            Mul => Some(Const::Float(a * b)),
            Div if *b != 0.0 => Some(Const::Float(a / b)),
            Eq => Some(Const::Bool(a == b)),
            NotEq => Some(Const::Bool(a != b)),
            Lt => Some(Const::Bool(a < b)),
            LtEq => Some(Const::Bool(a <= b)),
            Gt => Some(Const::Bool(a > b)),
            GtEq => Some(Const::Bool(a >= b)),
            _ => None,
        },
        (Const::Bool(a), Const::Bool(b)) => match op {
            And => Some(Const::Bool(*a && *b)),
            Or => Some(Const::Bool(*a || *b)),
            Eq => Some(Const::Bool(a == b)),
            NotEq => Some(Const::Bool(a != b)),
            _ => None,
        },
        (Const::Str(a), Const::Str(b)) => match op {
            Eq => Some(Const::Bool(a == b)),
            NotEq => Some(Const::Bool(a != b)),
            _ => None,
        },
        _ => None,
    }
}

fn fold_unop(op: UnaryOp, v: &Const) -> Option<Const> {
    match (op, v) {
        (UnaryOp::Neg, Const::Int(n)) => Some(Const::Int(-n)),
        (UnaryOp::Neg, Const::Float(f)) => Some(Const::Float(-f)),
        (UnaryOp::Not, Const::Bool(b)) => Some(Const::Bool(!b)),
        _ => None,
    }
}

/// Pass 2: substitutes a `Load` of a slot with that slot's most recent
/// constant `Store`, provided the slot is never written to from inside a
/// loop and no intervening `Store` has since invalidated it. This is the
/// one place the loop safety invariant is enforced: a loop-mutated slot is
/// never added to `slot_known`, so a load inside (or after) the loop can
/// never be folded to a value that predates the loop header.
fn propagate_constants(func: &mut IrFunction) {
    let mut known: HashMap<crate::instr::Temp, Const> = HashMap::new();
    let mut slot_known: HashMap<crate::instr::Slot, Const> = HashMap::new();

    for instr in &mut func.body {
        match instr {
            Instr::Const { dest, value } => {
                known.insert(*dest, value.clone());
            }
            Instr::Store { slot, value } => {
                if func.loop_mutated_slots.contains(slot) {
                    slot_known.remove(slot);
                } else if let Some(c) = known.get(value) {
                    slot_known.insert(*slot, c.clone());
                } else {
                    slot_known.remove(slot);
                }
            }
            Instr::Load { dest, slot } => {
                if let Some(c) = slot_known.get(slot) {
                    let c = c.clone();
                    known.insert(*dest, c.clone());
                    *instr = Instr::Const { dest: *dest, value: c };
                }
            }
            _ => {
                if let Some(folded) = try_fold(instr, &known) {
                    let dest = instr.defined_temp().expect("fold target always defines a temp");
                    known.insert(dest, folded.clone());
                    *instr = Instr::Const { dest, value: folded };
                }
            }
        }
    }
}

/// Pass 3: iterates to a fixpoint removing instructions whose defined
/// temp is never used and which have no side effect (spec §4.7 pass 3;
/// calls are never eliminated even with a discarded result).
fn eliminate_dead_code(func: &mut IrFunction) {
    loop {
        let mut used = std::collections::HashSet::new();
        for instr in &func.body {
            for t in instr.used_temps() {
                used.insert(t);
            }
        }
        let before = func.body.len();
        func.body.retain(|instr| match instr.defined_temp() {
            Some(t) => instr.has_side_effect() || used.contains(&t),
            None => true,
        });
        if func.body.len() == before {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Temp;
    use crate::lower::lower_fn;
    use lumina_syntax::Parser;

    fn ir_for(src: &str) -> IrFunction {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().unwrap();
        let Some(lumina_syntax::ast::Stmt::FnDecl(f)) = program.body.into_iter().next() else {
            panic!("expected a function declaration");
        };
        lower_fn(&f)
    }

    #[test]
    fn folds_constant_arithmetic() {
        let mut f = ir_for("fn k() -> i32 { return 2 + 3; }");
        optimize(&mut f, false);
        let consts: Vec<&Const> = f
            .body
            .iter()
            .filter_map(|i| match i {
                Instr::Const { value, .. } => Some(value),
                _ => None,
            })
            .collect();
        assert!(consts.contains(&&Const::Int(5)));
        assert!(!f.body.iter().any(|i| matches!(i, Instr::BinOp { .. })));
    }

    #[test]
    fn propagates_constant_through_non_loop_slot() {
        let mut f = ir_for("fn k() -> i32 { let mut x = 5; return x; }");
        optimize(&mut f, false);
        assert!(!f.body.iter().any(|i| matches!(i, Instr::Load { .. })));
    }

    #[test]
    fn never_propagates_a_loop_mutated_slot() {
        let mut f = ir_for("fn k() -> i32 { let mut x = 0; while x < 3 { x = x + 1; } return x; }");
        optimize(&mut f, false);
        assert!(f.body.iter().any(|i| matches!(i, Instr::Load { .. })));
    }

    #[test]
    fn dead_pure_instruction_is_removed() {
        let mut f = IrFunction {
            name: "k".into(),
            params: vec![],
            slot_names: vec![],
            loop_mutated_slots: Default::default(),
            body: vec![
                Instr::Const { dest: Temp(0), value: Const::Int(1) },
                Instr::Const { dest: Temp(1), value: Const::Int(2) },
                Instr::BinOp { dest: Temp(2), op: BinaryOp::Add, lhs: Temp(0), rhs: Temp(1) },
                Instr::Return(Some(Temp(1))),
            ],
        };
        optimize(&mut f, false);
        assert!(!f.body.iter().any(|i| matches!(i, Instr::BinOp { .. })));
    }

    #[test]
    fn call_is_never_eliminated_even_when_unused() {
        let mut f = IrFunction {
            name: "k".into(),
            params: vec![],
            slot_names: vec![],
            loop_mutated_slots: Default::default(),
            body: vec![
                Instr::Call { dest: Some(Temp(0)), callee: "log".into(), enum_name: None, args: vec![] },
                Instr::Return(None),
            ],
        };
        optimize(&mut f, false);
        assert!(f.body.iter().any(|i| matches!(i, Instr::Call { .. })));
    }

    #[test]
    fn no_optimize_toggle_leaves_ir_untouched() {
        let mut f = ir_for("fn k() -> i32 { return 2 + 3; }");
        let before = f.body.len();
        optimize(&mut f, true);
        assert_eq!(f.body.len(), before);
        assert!(f.body.iter().any(|i| matches!(i, Instr::BinOp { .. })));
    }
}
