//! Three-address IR instruction set (spec §4.7).
//!
//! Every sub-expression is linearized into a fresh, function-scoped
//! temporary; there is no expression nesting below this level. Mutable
//! (`let mut`) bindings live in [`Slot`]s read and written by [`Instr::Load`]
//! and [`Instr::Store`] rather than being SSA-renamed, which is what keeps
//! loop-mutated variables from being folded incorrectly by the optimizer
//! (see [`crate::lower`]).

use std::fmt;

pub use lumina_syntax::ast::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u32);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// A single three-address instruction.
///
/// `Project`/`ProjectField`/`Make*` model structural data (tuples, arrays,
/// structs, enum payloads) without collapsing them into opaque calls, so the
/// code generator can pattern over them directly rather than re-deriving
/// shape information the AST already had.
#[derive(Debug, Clone)]
pub enum Instr {
    Const { dest: Temp, value: Const },
    Load { dest: Temp, slot: Slot },
    Store { slot: Slot, value: Temp },
    Move { dest: Temp, src: Temp },
    BinOp { dest: Temp, op: BinaryOp, lhs: Temp, rhs: Temp },
    UnOp { dest: Temp, op: UnaryOp, operand: Temp },
    /// Positional projection: tuple element or enum variant payload slot.
    Project { dest: Temp, value: Temp, index: usize },
    ProjectField { dest: Temp, value: Temp, field: String },
    MakeTuple { dest: Temp, elems: Vec<Temp> },
    MakeArray { dest: Temp, elems: Vec<Temp> },
    MakeStruct { dest: Temp, name: String, fields: Vec<(String, Temp)> },
    MakeEnum { dest: Temp, enum_name: String, variant: String, args: Vec<Temp> },
    /// Boolean test used to drive a match's branch chain.
    TagEq { dest: Temp, value: Temp, enum_name: String, variant: String },
    Call { dest: Option<Temp>, callee: String, enum_name: Option<String>, args: Vec<Temp> },
    /// Merges values from multiple predecessor blocks; emitted only where an
    /// expression-position `match` joins its arms back into one value.
    Phi { dest: Temp, incoming: Vec<(BlockId, Temp)> },
    Label(BlockId),
    Jump(BlockId),
    Branch { cond: Temp, then_block: BlockId, else_block: BlockId },
    Return(Option<Temp>),
}

impl Instr {
    pub fn defined_temp(&self) -> Option<Temp> {
        match self {
            Instr::Const { dest, .. }
            | Instr::Load { dest, .. }
            | Instr::Move { dest, .. }
            | Instr::BinOp { dest, .. }
            | Instr::UnOp { dest, .. }
            | Instr::Project { dest, .. }
            | Instr::ProjectField { dest, .. }
            | Instr::MakeTuple { dest, .. }
            | Instr::MakeArray { dest, .. }
            | Instr::MakeStruct { dest, .. }
            | Instr::MakeEnum { dest, .. }
            | Instr::TagEq { dest, .. }
            | Instr::Phi { dest, .. } => Some(*dest),
            Instr::Call { dest, .. } => *dest,
            Instr::Store { .. } | Instr::Label(_) | Instr::Jump(_) | Instr::Branch { .. } | Instr::Return(_) => None,
        }
    }

    pub fn used_temps(&self) -> Vec<Temp> {
        match self {
            Instr::Const { .. } | Instr::Load { .. } | Instr::Label(_) | Instr::Jump(_) => vec![],
            Instr::Store { value, .. } => vec![*value],
            Instr::Move { src, .. } => vec![*src],
            Instr::BinOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instr::UnOp { operand, .. } => vec![*operand],
            Instr::Project { value, .. } | Instr::ProjectField { value, .. } | Instr::TagEq { value, .. } => vec![*value],
            Instr::MakeTuple { elems, .. } | Instr::MakeArray { elems, .. } => elems.clone(),
            Instr::MakeStruct { fields, .. } => fields.iter().map(|(_, t)| *t).collect(),
            Instr::MakeEnum { args, .. } => args.clone(),
            Instr::Call { args, .. } => args.clone(),
            Instr::Phi { incoming, .. } => incoming.iter().map(|(_, t)| *t).collect(),
            Instr::Branch { cond, .. } => vec![*cond],
            Instr::Return(v) => v.iter().copied().collect(),
        }
    }

    /// Call, Store and control-flow instructions survive dead-code
    /// elimination even with an unused (or absent) result (spec §4.7 pass 3).
    pub fn has_side_effect(&self) -> bool {
        matches!(
            self,
            Instr::Call { .. }
                | Instr::Store { .. }
                | Instr::Label(_)
                | Instr::Jump(_)
                | Instr::Branch { .. }
                | Instr::Return(_)
        )
    }
}

/// A single lowered function body: a flat instruction stream punctuated by
/// `Label`s rather than an explicit basic-block graph, mirroring how the
/// lowerer emits it.
#[derive(Debug, Clone, Default)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<Temp>,
    /// Slot index -> source variable name, for `let mut` bindings and any
    /// variable assigned to from inside a loop.
    pub slot_names: Vec<String>,
    pub body: Vec<Instr>,
    /// Slots written to from within a loop body; the optimizer must not
    /// treat a load from one of these as foldable to a constant that
    /// predates the loop header (spec §4.7 loop safety invariant).
    pub loop_mutated_slots: std::collections::HashSet<Slot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_and_store_report_side_effects() {
        let call = Instr::Call { dest: None, callee: "print".into(), enum_name: None, args: vec![Temp(0)] };
        assert!(call.has_side_effect());
        let store = Instr::Store { slot: Slot(0), value: Temp(1) };
        assert!(store.has_side_effect());
        let binop = Instr::BinOp { dest: Temp(2), op: BinaryOp::Add, lhs: Temp(0), rhs: Temp(1) };
        assert!(!binop.has_side_effect());
    }

    #[test]
    fn used_temps_covers_every_operand() {
        let phi = Instr::Phi { dest: Temp(3), incoming: vec![(BlockId(0), Temp(0)), (BlockId(1), Temp(1))] };
        assert_eq!(phi.used_temps(), vec![Temp(0), Temp(1)]);
    }
}
