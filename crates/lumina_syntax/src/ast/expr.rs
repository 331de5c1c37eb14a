//! Expression AST nodes (spec §3).

use super::node_id::NodeId;
use super::pattern::{Literal, Pattern};
use super::type_expr::TypeExpr;
use crate::token::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Rem,
    Eq, NotEq, Lt, LtEq, Gt, GtEq,
    And, Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A segment of an interpolated string, produced by splitting the lexer's
/// single opaque `InterpolatedString` token at the parser boundary (§4.1).
#[derive(Debug, Clone)]
pub enum StringSegment {
    Text(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Box<Expr>>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { id: NodeId, value: Literal, location: Option<SourceLocation> },
    InterpolatedString { id: NodeId, segments: Vec<StringSegment>, location: Option<SourceLocation> },
    Identifier { id: NodeId, name: String, location: Option<SourceLocation> },
    Binary { id: NodeId, op: BinaryOp, left: Box<Expr>, right: Box<Expr>, location: Option<SourceLocation> },
    Unary { id: NodeId, op: UnaryOp, operand: Box<Expr>, location: Option<SourceLocation> },
    /// A call. `enum_name` marks an enum-qualified constructor call
    /// (`EnumName.Variant(args)`); `type_args` carries explicit generic
    /// instantiation (`id::<i32>(x)`).
    Call {
        id: NodeId,
        callee: Box<Expr>,
        enum_name: Option<String>,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
        location: Option<SourceLocation>,
    },
    Member { id: NodeId, object: Box<Expr>, member: String, location: Option<SourceLocation> },
    StructLiteral {
        id: NodeId,
        name: String,
        fields: Vec<(String, Expr)>,
        location: Option<SourceLocation>,
    },
    ArrayLiteral { id: NodeId, elems: Vec<Expr>, location: Option<SourceLocation> },
    Index { id: NodeId, object: Box<Expr>, index: Box<Expr>, location: Option<SourceLocation> },
    Match { id: NodeId, scrutinee: Box<Expr>, arms: Vec<MatchArm>, location: Option<SourceLocation> },
    /// `expr is Pattern` boolean test.
    Is { id: NodeId, scrutinee: Box<Expr>, pattern: Pattern, location: Option<SourceLocation> },
    /// `expr?`
    Try { id: NodeId, inner: Box<Expr>, location: Option<SourceLocation> },
    Move { id: NodeId, inner: Box<Expr>, location: Option<SourceLocation> },
    Await { id: NodeId, inner: Box<Expr>, location: Option<SourceLocation> },
    Range { id: NodeId, start: Box<Expr>, end: Box<Expr>, inclusive: bool, location: Option<SourceLocation> },
    Lambda {
        id: NodeId,
        params: Vec<String>,
        body: Box<Expr>,
        location: Option<SourceLocation>,
    },
    Tuple { id: NodeId, elems: Vec<Expr>, location: Option<SourceLocation> },
    /// A block used in expression position (the value of the last statement,
    /// or unit if the last statement has a trailing semicolon).
    Block { id: NodeId, stmts: Vec<super::stmt::Stmt>, location: Option<SourceLocation> },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal { id, .. }
            | Expr::InterpolatedString { id, .. }
            | Expr::Identifier { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Call { id, .. }
            | Expr::Member { id, .. }
            | Expr::StructLiteral { id, .. }
            | Expr::ArrayLiteral { id, .. }
            | Expr::Index { id, .. }
            | Expr::Match { id, .. }
            | Expr::Is { id, .. }
            | Expr::Try { id, .. }
            | Expr::Move { id, .. }
            | Expr::Await { id, .. }
            | Expr::Range { id, .. }
            | Expr::Lambda { id, .. }
            | Expr::Tuple { id, .. }
            | Expr::Block { id, .. } => *id,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Expr::Literal { location, .. }
            | Expr::InterpolatedString { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Call { location, .. }
            | Expr::Member { location, .. }
            | Expr::StructLiteral { location, .. }
            | Expr::ArrayLiteral { location, .. }
            | Expr::Index { location, .. }
            | Expr::Match { location, .. }
            | Expr::Is { location, .. }
            | Expr::Try { location, .. }
            | Expr::Move { location, .. }
            | Expr::Await { location, .. }
            | Expr::Range { location, .. }
            | Expr::Lambda { location, .. }
            | Expr::Tuple { location, .. }
            | Expr::Block { location, .. } => location.as_ref(),
        }
    }
}
