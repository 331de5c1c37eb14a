//! Match patterns (spec §3 Pattern).

use super::node_id::NodeId;
use crate::token::SourceLocation;

#[derive(Debug, Clone)]
pub enum Literal {
    Number(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard { id: NodeId, location: Option<SourceLocation> },
    Literal { id: NodeId, value: Literal, location: Option<SourceLocation> },
    /// `EnumName.Variant(bindings...)` — `enum_name` is `None` when the
    /// pattern omits the qualifier and relies on contextual inference.
    Enum {
        id: NodeId,
        enum_name: Option<String>,
        variant: String,
        bindings: Vec<Pattern>,
        location: Option<SourceLocation>,
    },
    Struct {
        id: NodeId,
        name: String,
        fields: Vec<(String, Pattern)>,
        location: Option<SourceLocation>,
    },
    Tuple { id: NodeId, elems: Vec<Pattern>, location: Option<SourceLocation> },
    /// A bare identifier binding, e.g. `v` in `Some(v) => v`.
    Binding { id: NodeId, name: String, location: Option<SourceLocation> },
}

impl Pattern {
    pub fn id(&self) -> NodeId {
        match self {
            Pattern::Wildcard { id, .. }
            | Pattern::Literal { id, .. }
            | Pattern::Enum { id, .. }
            | Pattern::Struct { id, .. }
            | Pattern::Tuple { id, .. }
            | Pattern::Binding { id, .. } => *id,
        }
    }

    /// `_name` suppresses unused-binding warnings (spec §4.4).
    pub fn is_suppressed_binding(&self) -> bool {
        matches!(self, Pattern::Binding { name, .. } if name.starts_with('_'))
    }
}
