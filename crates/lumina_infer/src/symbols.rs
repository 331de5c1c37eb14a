//! Symbol table and semantic analysis (spec §4.4).

use std::collections::{HashMap, HashSet};

use lumina_base::{Diagnostic, Span};
use lumina_syntax::ast::{Expr, FnDecl, Pattern, Program, Stmt, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
    Module,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub visibility: Visibility,
    /// Where the binding was introduced. `Span::default()` for symbols
    /// (currently only function parameters) whose AST node carries no
    /// location of its own.
    pub location: Span,
}

/// Lexically nested scopes. `enter_scope`/`exit_scope` bracket a lexical
/// region; `lookup` walks outward per spec §3 SymbolTable.
#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn define(&mut self, symbol: Symbol) {
        self.scopes.last_mut().expect("at least one scope").insert(symbol.name.clone(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    pub fn list(&self) -> Vec<&Symbol> {
        self.scopes.iter().flat_map(|s| s.values()).collect()
    }
}

pub struct SemanticOptions<'a> {
    /// Externally supplied symbols (host-provided builtins, prelude).
    pub extern_symbols: &'a HashSet<String>,
    pub imported_names: &'a HashSet<String>,
}

pub struct SemanticResult {
    pub diagnostics: Vec<Diagnostic>,
    pub table: SymbolTable,
}

/// Runs the hoisting + scope-resolution pass (spec §4.4). This does not
/// perform type inference; [`crate::infer::InferEngine`] does that over the
/// same AST using the symbol table's visibility/import information.
pub fn analyze(program: &Program, options: &SemanticOptions) -> SemanticResult {
    let mut table = SymbolTable::new();
    let mut diagnostics = Vec::new();

    // Hoisting pass: register every top-level declaration before bodies.
    for stmt in &program.body {
        if let Some(name) = stmt.hoisted_name() {
            let (kind, visibility) = declaration_kind(stmt);
            let location = stmt_location(stmt);
            table.define(Symbol { name: name.to_string(), kind, visibility, location });
        }
    }

    for stmt in &program.body {
        if let Stmt::FnDecl(f) = stmt {
            check_function_body(f, &mut table, options, &mut diagnostics);
        }
    }

    SemanticResult { diagnostics, table }
}

fn stmt_location(stmt: &Stmt) -> Span {
    let loc = match stmt {
        Stmt::FnDecl(d) => &d.location,
        Stmt::StructDecl(d) => &d.location,
        Stmt::EnumDecl(d) => &d.location,
        Stmt::TypeDecl(d) => &d.location,
        Stmt::TraitDecl(d) => &d.location,
        _ => return Span::default(),
    };
    loc.as_ref().map(|l| l.span()).unwrap_or_default()
}

fn declaration_kind(stmt: &Stmt) -> (SymbolKind, Visibility) {
    match stmt {
        Stmt::FnDecl(f) => (SymbolKind::Function, f.visibility),
        Stmt::StructDecl(d) => (SymbolKind::Type, d.visibility),
        Stmt::EnumDecl(d) => (SymbolKind::Type, d.visibility),
        Stmt::TypeDecl(d) => (SymbolKind::Type, d.visibility),
        Stmt::TraitDecl(d) => (SymbolKind::Type, d.visibility),
        _ => (SymbolKind::Variable, Visibility::Private),
    }
}

fn check_function_body(f: &FnDecl, table: &mut SymbolTable, options: &SemanticOptions, diagnostics: &mut Vec<Diagnostic>) {
    table.enter_scope();
    for p in &f.params {
        table.define(Symbol { name: p.name.clone(), kind: SymbolKind::Variable, visibility: Visibility::Private, location: Span::default() });
    }
    let mut used = HashSet::new();
    for stmt in &f.body {
        check_stmt(stmt, table, options, diagnostics, &mut used);
    }
    for sym in table.list() {
        if sym.kind == SymbolKind::Variable && !used.contains(&sym.name) && !sym.name.starts_with('_') {
            diagnostics.push(Diagnostic::warning(
                "UNUSED_BINDING",
                format!("unused binding `{}`", sym.name),
                sym.location,
                0,
                0,
            ));
        }
    }
    table.exit_scope();
}

fn check_stmt(stmt: &Stmt, table: &mut SymbolTable, options: &SemanticOptions, diagnostics: &mut Vec<Diagnostic>, used: &mut HashSet<String>) {
    match stmt {
        Stmt::Let { name, value, location, .. } => {
            check_expr(value, table, options, diagnostics, used);
            let loc = location.as_ref().map(|l| l.span()).unwrap_or_default();
            table.define(Symbol { name: name.clone(), kind: SymbolKind::Variable, visibility: Visibility::Private, location: loc });
        }
        Stmt::LetTuple { names, value, location, .. } => {
            check_expr(value, table, options, diagnostics, used);
            let loc = location.as_ref().map(|l| l.span()).unwrap_or_default();
            for n in names {
                table.define(Symbol { name: n.clone(), kind: SymbolKind::Variable, visibility: Visibility::Private, location: loc });
            }
        }
        Stmt::Return { value: Some(v), .. } | Stmt::ExprStmt { expr: v, .. } => check_expr(v, table, options, diagnostics, used),
        Stmt::Return { value: None, .. } => {}
        Stmt::If { cond, then_block, else_block, .. } => {
            check_expr(cond, table, options, diagnostics, used);
            table.enter_scope();
            for s in then_block {
                check_stmt(s, table, options, diagnostics, used);
            }
            table.exit_scope();
            if let Some(else_block) = else_block {
                table.enter_scope();
                for s in else_block {
                    check_stmt(s, table, options, diagnostics, used);
                }
                table.exit_scope();
            }
        }
        Stmt::While { cond, body, .. } | Stmt::For { iterable: cond, body, .. } => {
            check_expr(cond, table, options, diagnostics, used);
            table.enter_scope();
            for s in body {
                check_stmt(s, table, options, diagnostics, used);
            }
            table.exit_scope();
        }
        Stmt::WhileLet { scrutinee, body, .. } => {
            check_expr(scrutinee, table, options, diagnostics, used);
            table.enter_scope();
            for s in body {
                check_stmt(s, table, options, diagnostics, used);
            }
            table.exit_scope();
        }
        Stmt::MatchStmt { scrutinee, arms, .. } => {
            check_expr(scrutinee, table, options, diagnostics, used);
            for arm in arms {
                table.enter_scope();
                bind_pattern_names(&arm.pattern, table);
                check_expr(&arm.body, table, options, diagnostics, used);
                table.exit_scope();
            }
        }
        Stmt::Assign { target, value, .. } => {
            check_expr(target, table, options, diagnostics, used);
            check_expr(value, table, options, diagnostics, used);
        }
        Stmt::Block { stmts, .. } => {
            table.enter_scope();
            for s in stmts {
                check_stmt(s, table, options, diagnostics, used);
            }
            table.exit_scope();
        }
        Stmt::Import(_) | Stmt::FnDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TypeDecl(_) | Stmt::TraitDecl(_) | Stmt::ImplDecl(_) => {}
    }
}

fn bind_pattern_names(pattern: &Pattern, table: &mut SymbolTable) {
    match pattern {
        Pattern::Binding { name, location, .. } => {
            let loc = location.as_ref().map(|l| l.span()).unwrap_or_default();
            table.define(Symbol { name: name.clone(), kind: SymbolKind::Variable, visibility: Visibility::Private, location: loc });
        }
        Pattern::Enum { bindings, .. } => {
            for b in bindings {
                bind_pattern_names(b, table);
            }
        }
        Pattern::Struct { fields, .. } => {
            for (_, p) in fields {
                bind_pattern_names(p, table);
            }
        }
        Pattern::Tuple { elems, .. } => {
            for e in elems {
                bind_pattern_names(e, table);
            }
        }
        Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
    }
}

fn check_expr(expr: &Expr, table: &SymbolTable, options: &SemanticOptions, diagnostics: &mut Vec<Diagnostic>, used: &mut HashSet<String>) {
    match expr {
        Expr::Identifier { name, .. } => {
            used.insert(name.clone());
            if table.lookup(name).is_none() && !options.extern_symbols.contains(name) && !options.imported_names.contains(name) {
                diagnostics.push(Diagnostic::error("UNKNOWN_IDENTIFIER", format!("unknown identifier `{}`", name), Span::default(), 0, 0));
            }
        }
        Expr::Binary { left, right, .. } => {
            check_expr(left, table, options, diagnostics, used);
            check_expr(right, table, options, diagnostics, used);
        }
        Expr::Unary { operand, .. } | Expr::Try { inner: operand, .. } | Expr::Move { inner: operand, .. } | Expr::Await { inner: operand, .. } => {
            check_expr(operand, table, options, diagnostics, used);
        }
        Expr::Call { callee, args, .. } => {
            check_expr(callee, table, options, diagnostics, used);
            for a in args {
                check_expr(a, table, options, diagnostics, used);
            }
        }
        Expr::Member { object, .. } | Expr::Index { object, .. } => check_expr(object, table, options, diagnostics, used),
        Expr::StructLiteral { fields, .. } => {
            for (_, v) in fields {
                check_expr(v, table, options, diagnostics, used);
            }
        }
        Expr::ArrayLiteral { elems, .. } | Expr::Tuple { elems, .. } => {
            for e in elems {
                check_expr(e, table, options, diagnostics, used);
            }
        }
        Expr::Match { scrutinee, arms, .. } => {
            check_expr(scrutinee, table, options, diagnostics, used);
            for arm in arms {
                check_expr(&arm.body, table, options, diagnostics, used);
            }
        }
        Expr::Is { scrutinee, .. } => check_expr(scrutinee, table, options, diagnostics, used),
        Expr::Range { start, end, .. } => {
            check_expr(start, table, options, diagnostics, used);
            check_expr(end, table, options, diagnostics, used);
        }
        Expr::Lambda { body, .. } => check_expr(body, table, options, diagnostics, used),
        Expr::Block { stmts, .. } => {
            for s in stmts {
                if let Stmt::ExprStmt { expr, .. } = s {
                    check_expr(expr, table, options, diagnostics, used);
                }
            }
        }
        Expr::InterpolatedString { segments, .. } => {
            for seg in segments {
                if let lumina_syntax::ast::StringSegment::Expr(e) = seg {
                    check_expr(e, table, options, diagnostics, used);
                }
            }
        }
        Expr::Literal { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::Parser;

    fn analyze_src(src: &str) -> SemanticResult {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().unwrap();
        let extern_symbols = HashSet::new();
        let imported_names = HashSet::new();
        analyze(&program, &SemanticOptions { extern_symbols: &extern_symbols, imported_names: &imported_names })
    }

    #[test]
    fn hoists_mutually_recursive_functions() {
        let src = "fn a() -> i32 { b() } fn b() -> i32 { a() }";
        let result = analyze_src(src);
        assert!(!result.diagnostics.iter().any(|d| d.code == "UNKNOWN_IDENTIFIER"));
    }

    #[test]
    fn reports_unknown_identifier() {
        let result = analyze_src("fn f() -> i32 { return nope; }");
        assert!(result.diagnostics.iter().any(|d| d.code == "UNKNOWN_IDENTIFIER"));
    }

    #[test]
    fn unused_binding_suppressed_by_underscore_prefix() {
        let result = analyze_src("fn f() -> i32 { let _unused = 1; 0 }");
        assert!(!result.diagnostics.iter().any(|d| d.code == "UNUSED_BINDING"));
    }
}
