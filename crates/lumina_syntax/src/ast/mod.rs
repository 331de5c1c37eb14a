//! The typed AST: discriminated nodes with stable IDs and source locations
//! (spec §3 AST node).

pub mod expr;
pub mod node_id;
pub mod pattern;
pub mod stmt;
pub mod type_expr;

pub use expr::{BinaryOp, Expr, MatchArm, StringSegment, UnaryOp};
pub use node_id::{NodeId, NodeIdAllocator};
pub use pattern::{Literal, Pattern};
pub use stmt::{
    AssignOp, EnumDecl, FieldDecl, FnDecl, ImplDecl, ImportDecl, Param, Program, Stmt, StructDecl,
    TraitDecl, TraitMethodSig, TypeDecl, TypeParam, VariantDecl, Visibility,
};
pub use type_expr::{ConstBinOp, ConstExpr, TypeExpr};
