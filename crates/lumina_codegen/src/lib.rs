//! # lumina-codegen
//!
//! Monomorphization and the two code generators (spec §4.8, §4.9): a
//! target-language text emitter for the full supported language, and a
//! restricted stack-machine text emitter for the primitive-arithmetic
//! subset.

pub mod emit_stack;
pub mod emit_target;
pub mod monomorphize;

pub use emit_stack::{emit_stack_module, StackEmitOutput, STACK_IMPORTS};
pub use emit_target::{emit_program, EmitOptions, EmitOutput, SourceMapMode, RUNTIME_PRELUDE_NAMES};
pub use monomorphize::{monomorphize, MonomorphizationReport};
