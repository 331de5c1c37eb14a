//! # lumina-infer
//!
//! Hindley-Milner type inference, the ADT/trait registries, const-generic
//! evaluation, match exhaustiveness, and the semantic (symbol table) pass
//! (spec §4.4–§4.5).

pub mod const_eval;
pub mod env;
pub mod exhaustiveness;
pub mod infer;
pub mod registry;
pub mod symbols;
pub mod types;
pub mod unify;

pub use const_eval::{check_array_size, eval_const, ConstEvalError};
pub use exhaustiveness::{check_match_exhaustive, ExhaustivenessReport};
pub use infer::{CallSignature, InferEngine, InferOutput};
pub use registry::{AdtRegistry, TraitRegistry, TypeDef};
pub use symbols::{analyze, SemanticOptions, SemanticResult, Symbol, SymbolKind, SymbolTable};
pub use types::{format_type, Subst, Type, TypeScheme, VarGen};
pub use unify::{unify, UnifyError};
