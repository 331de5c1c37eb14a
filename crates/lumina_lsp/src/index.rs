//! Per-document symbol index: every declaration and identifier occurrence,
//! with its source span, built directly from the AST (spec §4.11 Hover,
//! Rename, Code actions all key off this).

use lumina_base::Span;
use lumina_syntax::ast::{Expr, FnDecl, NodeId, Pattern, Program, Stmt, TypeExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Function,
    Struct,
    Enum,
    TypeAlias,
    Trait,
    Variable,
    Param,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub kind: DefKind,
    pub span: Span,
    /// A short, source-derived signature shown in completion/outline
    /// entries when no inferred type is available.
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub span: Span,
    /// The identifier expression's own node id, for looking up its
    /// resolved type in `hm_expr_types`.
    pub node_id: Option<NodeId>,
    /// Set when this identifier is the callee of a `Call` expression,
    /// holding that call expression's node id — hover prefers the call's
    /// signature from `inferred_calls` over the plain identifier type.
    pub call_node_id: Option<NodeId>,
}

#[derive(Debug, Default, Clone)]
pub struct SymbolIndex {
    pub definitions: Vec<Definition>,
    pub references: Vec<Reference>,
}

impl SymbolIndex {
    pub fn build(program: &Program) -> Self {
        let mut index = SymbolIndex::default();
        for stmt in &program.body {
            index.visit_top_level(stmt);
        }
        index
    }

    fn visit_top_level(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FnDecl(f) => self.visit_fn(f),
            Stmt::StructDecl(d) => self.definitions.push(Definition {
                name: d.name.clone(),
                kind: DefKind::Struct,
                span: span_of(&d.location),
                detail: format!("struct {}", d.name),
            }),
            Stmt::EnumDecl(d) => self.definitions.push(Definition {
                name: d.name.clone(),
                kind: DefKind::Enum,
                span: span_of(&d.location),
                detail: format!("enum {}", d.name),
            }),
            Stmt::TypeDecl(d) => self.definitions.push(Definition {
                name: d.name.clone(),
                kind: DefKind::TypeAlias,
                span: span_of(&d.location),
                detail: format!("type {}", d.name),
            }),
            Stmt::TraitDecl(d) => self.definitions.push(Definition {
                name: d.name.clone(),
                kind: DefKind::Trait,
                span: span_of(&d.location),
                detail: format!("trait {}", d.name),
            }),
            Stmt::ImplDecl(d) => {
                for method in &d.methods {
                    self.visit_fn(method);
                }
            }
            Stmt::Import(_) => {}
            other => self.visit_stmt(other),
        }
    }

    fn visit_fn(&mut self, f: &FnDecl) {
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| match &p.ty {
                Some(ty) => format!("{}: {}", p.name, render_type_expr(ty)),
                None => p.name.clone(),
            })
            .collect();
        let ret = f.return_type.as_ref().map(render_type_expr).unwrap_or_else(|| "void".to_string());
        self.definitions.push(Definition {
            name: f.name.clone(),
            kind: DefKind::Function,
            span: span_of(&f.location),
            detail: format!("fn {}({}) -> {}", f.name, params.join(", "), ret),
        });
        for p in &f.params {
            self.definitions.push(Definition {
                name: p.name.clone(),
                kind: DefKind::Param,
                span: span_of(&f.location),
                detail: p.ty.as_ref().map(render_type_expr).unwrap_or_default(),
            });
        }
        for s in &f.body {
            self.visit_stmt(s);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, ty, value, location, .. } => {
                self.visit_expr(value);
                self.definitions.push(Definition {
                    name: name.clone(),
                    kind: DefKind::Variable,
                    span: span_of(location),
                    detail: ty.as_ref().map(render_type_expr).unwrap_or_default(),
                });
            }
            Stmt::LetTuple { names, value, location, .. } => {
                self.visit_expr(value);
                for n in names {
                    self.definitions.push(Definition { name: n.clone(), kind: DefKind::Variable, span: span_of(location), detail: String::new() });
                }
            }
            Stmt::Return { value: Some(v), .. } | Stmt::ExprStmt { expr: v, .. } => self.visit_expr(v),
            Stmt::Return { value: None, .. } => {}
            Stmt::If { cond, then_block, else_block, .. } => {
                self.visit_expr(cond);
                for s in then_block {
                    self.visit_stmt(s);
                }
                if let Some(eb) = else_block {
                    for s in eb {
                        self.visit_stmt(s);
                    }
                }
            }
            Stmt::While { cond, body, .. } | Stmt::For { iterable: cond, body, .. } => {
                self.visit_expr(cond);
                for s in body {
                    self.visit_stmt(s);
                }
            }
            Stmt::WhileLet { scrutinee, body, pattern, .. } => {
                self.visit_expr(scrutinee);
                self.visit_pattern(pattern);
                for s in body {
                    self.visit_stmt(s);
                }
            }
            Stmt::MatchStmt { scrutinee, arms, .. } => {
                self.visit_expr(scrutinee);
                for arm in arms {
                    self.visit_pattern(&arm.pattern);
                    self.visit_expr(&arm.body);
                }
            }
            Stmt::Assign { target, value, .. } => {
                self.visit_expr(target);
                self.visit_expr(value);
            }
            Stmt::Block { stmts, .. } => {
                for s in stmts {
                    self.visit_stmt(s);
                }
            }
            Stmt::Import(_) | Stmt::FnDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TypeDecl(_) | Stmt::TraitDecl(_) | Stmt::ImplDecl(_) => {
                self.visit_top_level(stmt);
            }
        }
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Binding { name, location, .. } => {
                self.definitions.push(Definition { name: name.clone(), kind: DefKind::Variable, span: span_of(location), detail: String::new() });
            }
            Pattern::Enum { bindings, variant, location, .. } => {
                self.references.push(Reference { name: variant.clone(), span: span_of(location), node_id: None, call_node_id: None });
                for b in bindings {
                    self.visit_pattern(b);
                }
            }
            Pattern::Struct { fields, name, location, .. } => {
                self.references.push(Reference { name: name.clone(), span: span_of(location), node_id: None, call_node_id: None });
                for (_, p) in fields {
                    self.visit_pattern(p);
                }
            }
            Pattern::Tuple { elems, .. } => {
                for e in elems {
                    self.visit_pattern(e);
                }
            }
            Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Identifier { name, location, id } = expr {
            self.references.push(Reference { name: name.clone(), span: span_of(location), node_id: Some(*id), call_node_id: None });
        }
        match expr {
            Expr::Identifier { .. } | Expr::Literal { .. } => {}
            Expr::InterpolatedString { segments, .. } => {
                for seg in segments {
                    if let lumina_syntax::ast::StringSegment::Expr(e) = seg {
                        self.visit_expr(e);
                    }
                }
            }
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Unary { operand, .. } | Expr::Try { inner: operand, .. } | Expr::Move { inner: operand, .. } | Expr::Await { inner: operand, .. } => {
                self.visit_expr(operand);
            }
            Expr::Call { callee, args, .. } => {
                if let Expr::Identifier { name, location, id } = callee.as_ref() {
                    self.references.push(Reference {
                        name: name.clone(),
                        span: span_of(location),
                        node_id: Some(*id),
                        call_node_id: Some(expr.id()),
                    });
                } else {
                    self.visit_expr(callee);
                }
                for a in args {
                    self.visit_expr(a);
                }
            }
            Expr::Member { object, .. } => self.visit_expr(object),
            Expr::Index { object, index, .. } => {
                self.visit_expr(object);
                self.visit_expr(index);
            }
            Expr::StructLiteral { fields, name, location, .. } => {
                self.references.push(Reference { name: name.clone(), span: span_of(location), node_id: None, call_node_id: None });
                for (_, v) in fields {
                    self.visit_expr(v);
                }
            }
            Expr::ArrayLiteral { elems, .. } | Expr::Tuple { elems, .. } => {
                for e in elems {
                    self.visit_expr(e);
                }
            }
            Expr::Match { scrutinee, arms, .. } => {
                self.visit_expr(scrutinee);
                for arm in arms {
                    self.visit_pattern(&arm.pattern);
                    self.visit_expr(&arm.body);
                }
            }
            Expr::Is { scrutinee, pattern, .. } => {
                self.visit_expr(scrutinee);
                self.visit_pattern(pattern);
            }
            Expr::Range { start, end, .. } => {
                self.visit_expr(start);
                self.visit_expr(end);
            }
            Expr::Lambda { body, .. } => self.visit_expr(body),
            Expr::Block { stmts, .. } => {
                for s in stmts {
                    self.visit_stmt(s);
                }
            }
        }
    }

    /// The innermost definition with this name (shadowing-aware: later
    /// definitions in document order win).
    pub fn definition_for(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().rev().find(|d| d.name == name)
    }

    pub fn references_for(&self, name: &str) -> Vec<&Reference> {
        self.references.iter().filter(|r| r.name == name).collect()
    }

    /// The reference under `offset`, if the cursor sits on a use site.
    pub fn reference_at(&self, offset: usize) -> Option<&Reference> {
        self.references.iter().find(|r| r.span.contains(offset))
    }

    /// The definition under `offset`, if the cursor sits on a declaration.
    pub fn definition_at(&self, offset: usize) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.span.contains(offset))
    }

    /// The identifier under `offset`, checked against references first
    /// (the common case: hovering a use site) then definitions (hovering
    /// the declaration itself).
    pub fn name_at(&self, offset: usize) -> Option<&str> {
        self.reference_at(offset)
            .map(|r| r.name.as_str())
            .or_else(|| self.definition_at(offset).map(|d| d.name.as_str()))
    }
}

fn span_of(location: &Option<lumina_syntax::token::SourceLocation>) -> Span {
    location.as_ref().map(|l| l.span()).unwrap_or_default()
}

pub fn render_type_expr(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Hole { .. } => "_".to_string(),
        TypeExpr::Named { name, type_args, .. } => {
            if type_args.is_empty() {
                name.clone()
            } else {
                let args: Vec<String> = type_args.iter().map(render_type_expr).collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
        TypeExpr::Function { params, ret, .. } => {
            let params: Vec<String> = params.iter().map(render_type_expr).collect();
            format!("({}) -> {}", params.join(", "), render_type_expr(ret))
        }
        TypeExpr::Array { elem, .. } => format!("[{}]", render_type_expr(elem)),
        TypeExpr::Tuple { elems, .. } => {
            let elems: Vec<String> = elems.iter().map(render_type_expr).collect();
            format!("({})", elems.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::Parser;

    fn index_of(src: &str) -> SymbolIndex {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().unwrap();
        SymbolIndex::build(&program)
    }

    #[test]
    fn indexes_a_function_declaration() {
        let idx = index_of("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        let def = idx.definition_for("add").unwrap();
        assert_eq!(def.kind, DefKind::Function);
        assert_eq!(def.detail, "fn add(a: i32, b: i32) -> i32");
    }

    #[test]
    fn collects_identifier_references() {
        let idx = index_of("fn f() -> i32 { let x = 1; return x + x; }");
        assert_eq!(idx.references_for("x").len(), 2);
    }

    #[test]
    fn name_at_resolves_reference_span() {
        let src = "fn f() -> i32 { let x = 1; return x; }";
        let idx = index_of(src);
        let offset = src.rfind("x;").unwrap();
        assert_eq!(idx.name_at(offset), Some("x"));
    }

    #[test]
    fn call_callee_reference_carries_call_node_id() {
        let src = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn f() -> i32 { return add(1, 2); }";
        let idx = index_of(src);
        let offset = src.rfind("add(").unwrap();
        let r = idx.reference_at(offset).unwrap();
        assert_eq!(r.name, "add");
        assert!(r.call_node_id.is_some(), "callee reference should carry its call's node id");
    }
}
