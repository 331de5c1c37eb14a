//! # lumina-ir
//!
//! The three-address IR, AST-to-IR lowering with loop-mutation safety, and
//! the constant-folding/propagation/dead-code optimizer (spec §4.7).

pub mod instr;
pub mod lower;
pub mod optimize;

pub use instr::{BlockId, Const, Instr, IrFunction, Slot, Temp};
pub use lower::{lower_fn, lower_program};
pub use optimize::optimize;
