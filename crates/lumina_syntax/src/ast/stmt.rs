//! Statement and top-level declaration AST nodes (spec §3).

use super::expr::Expr;
use super::node_id::NodeId;
use super::pattern::Pattern;
use super::type_expr::TypeExpr;
use crate::token::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    /// `T: Trait1 + Trait2` bounds (spec §4.5).
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub id: NodeId,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    /// Const-generic parameters, e.g. `const N: usize`.
    pub const_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub visibility: Visibility,
    pub is_async: bool,
    pub is_extern: bool,
    pub extern_module: Option<String>,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub id: NodeId,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<FieldDecl>,
    pub visibility: Visibility,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub name: String,
    /// Positional payload types; empty for a nullary (unit) variant.
    pub payload: Vec<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub id: NodeId,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub variants: Vec<VariantDecl>,
    pub visibility: Visibility,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: NodeId,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub target: TypeExpr,
    pub visibility: Visibility,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct TraitMethodSig {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct TraitDecl {
    pub id: NodeId,
    pub name: String,
    pub methods: Vec<TraitMethodSig>,
    pub visibility: Visibility,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct ImplDecl {
    pub id: NodeId,
    pub trait_name: Option<String>,
    pub type_name: String,
    pub methods: Vec<FnDecl>,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub id: NodeId,
    pub specifier: String,
    pub names: Vec<String>,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Import(ImportDecl),
    FnDecl(FnDecl),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),
    TypeDecl(TypeDecl),
    TraitDecl(TraitDecl),
    ImplDecl(ImplDecl),
    Let {
        id: NodeId,
        name: String,
        mutable: bool,
        ty: Option<TypeExpr>,
        value: Expr,
        location: Option<SourceLocation>,
    },
    /// `let (a, b) = pair;` destructuring binding.
    LetTuple {
        id: NodeId,
        names: Vec<String>,
        value: Expr,
        location: Option<SourceLocation>,
    },
    Return { id: NodeId, value: Option<Expr>, location: Option<SourceLocation> },
    If {
        id: NodeId,
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
        location: Option<SourceLocation>,
    },
    While { id: NodeId, cond: Expr, body: Vec<Stmt>, location: Option<SourceLocation> },
    WhileLet {
        id: NodeId,
        pattern: Pattern,
        scrutinee: Expr,
        body: Vec<Stmt>,
        location: Option<SourceLocation>,
    },
    For {
        id: NodeId,
        binding: String,
        iterable: Expr,
        body: Vec<Stmt>,
        location: Option<SourceLocation>,
    },
    MatchStmt { id: NodeId, scrutinee: Expr, arms: Vec<super::expr::MatchArm>, location: Option<SourceLocation> },
    Assign {
        id: NodeId,
        op: AssignOp,
        target: Expr,
        value: Expr,
        location: Option<SourceLocation>,
    },
    ExprStmt { id: NodeId, expr: Expr, location: Option<SourceLocation> },
    Block { id: NodeId, stmts: Vec<Stmt>, location: Option<SourceLocation> },
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Import(d) => d.id,
            Stmt::FnDecl(d) => d.id,
            Stmt::StructDecl(d) => d.id,
            Stmt::EnumDecl(d) => d.id,
            Stmt::TypeDecl(d) => d.id,
            Stmt::TraitDecl(d) => d.id,
            Stmt::ImplDecl(d) => d.id,
            Stmt::Let { id, .. }
            | Stmt::LetTuple { id, .. }
            | Stmt::Return { id, .. }
            | Stmt::If { id, .. }
            | Stmt::While { id, .. }
            | Stmt::WhileLet { id, .. }
            | Stmt::For { id, .. }
            | Stmt::MatchStmt { id, .. }
            | Stmt::Assign { id, .. }
            | Stmt::ExprStmt { id, .. }
            | Stmt::Block { id, .. } => *id,
        }
    }

    /// The name this statement hoists into the pre-pass, if any (spec §3
    /// Program AST invariant: "all declaration names... are hoisted").
    pub fn hoisted_name(&self) -> Option<&str> {
        match self {
            Stmt::FnDecl(d) => Some(&d.name),
            Stmt::StructDecl(d) => Some(&d.name),
            Stmt::EnumDecl(d) => Some(&d.name),
            Stmt::TypeDecl(d) => Some(&d.name),
            Stmt::TraitDecl(d) => Some(&d.name),
            _ => None,
        }
    }
}

/// `{ type: 'Program', body: [...] }` (spec §3).
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}
