//! Stack-machine text generator for the restricted subset of lumina that
//! maps onto a WebAssembly-style stack machine (spec §4.9): primitive
//! ints/floats, calls to primitive functions, `if`/`while`, and binary
//! arithmetic. Anything outside that subset is diagnosed as `WASM-001`
//! and replaced with an `unreachable` instruction rather than aborting the
//! whole emission, matching the teacher's diagnostic-collecting-while-
//! continuing style (`logicaffeine_compile::diagnostics`) over a single
//! hard failure.

use lumina_base::diagnostic::Diagnostic;
use lumina_base::span::Span;
use lumina_syntax::ast::{BinaryOp, Expr, FnDecl, Literal, Program, Stmt, UnaryOp};

/// Fixed import set the generated module declares; the embedding host must
/// provide these (spec §4.9).
pub const STACK_IMPORTS: &[&str] = &["print_int", "print_float", "print_bool", "abs_int", "abs_float"];

pub struct StackEmitOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

struct StackEmitter {
    out: String,
    indent: usize,
    diagnostics: Vec<Diagnostic>,
}

impl StackEmitter {
    fn new() -> Self {
        Self { out: String::new(), indent: 0, diagnostics: Vec::new() }
    }

    fn line(&mut self, s: &str) {
        self.out.push_str(&"  ".repeat(self.indent));
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn unsupported(&mut self, what: &str) {
        self.diagnostics.push(Diagnostic::error(
            "WASM-001",
            format!("unsupported construct for the stack target: {what}"),
            Span::default(),
            0,
            0,
        ));
        self.line("unreachable");
    }
}

/// Emits a single exported linear memory plus one function per top-level
/// `FnDecl` restricted to the supported subset.
pub fn emit_stack_module(program: &Program) -> StackEmitOutput {
    let mut em = StackEmitter::new();
    em.line("(module");
    em.indent += 1;
    for name in STACK_IMPORTS {
        em.line(&format!("(import \"env\" \"{name}\" (func ${name}))"));
    }
    em.line("(memory (export \"memory\") 1)");

    for stmt in &program.body {
        if let Stmt::FnDecl(f) = stmt {
            emit_fn(&mut em, f);
        }
    }

    em.indent -= 1;
    em.line(")");
    StackEmitOutput { text: em.out, diagnostics: em.diagnostics }
}

fn emit_fn(em: &mut StackEmitter, f: &FnDecl) {
    if f.is_async {
        em.diagnostics.push(Diagnostic::error(
            "WASM-001",
            format!("function `{}` is async, which the stack target cannot express", f.name),
            Span::default(),
            0,
            0,
        ));
        return;
    }
    let params = f
        .params
        .iter()
        .map(|p| format!("(param ${} i32)", p.name))
        .collect::<Vec<_>>()
        .join(" ");
    em.line(&format!("(func ${} (export \"{}\") {} (result i32)", f.name, f.name, params));
    em.indent += 1;
    for name in collect_let_names(&f.body) {
        em.line(&format!("(local ${name} i32)"));
    }
    for s in &f.body {
        emit_stmt(em, s);
    }
    em.indent -= 1;
    em.line(")");
}

/// WAT locals are function-scoped, not block-scoped, so every `let` in the
/// body — however deeply nested under `if`/`while` — needs a declaration up
/// front.
fn collect_let_names(stmts: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for s in stmts {
        match s {
            Stmt::Let { name, .. } => names.push(name.clone()),
            Stmt::If { then_block, else_block, .. } => {
                names.extend(collect_let_names(then_block));
                if let Some(else_block) = else_block {
                    names.extend(collect_let_names(else_block));
                }
            }
            Stmt::While { body, .. } => names.extend(collect_let_names(body)),
            _ => {}
        }
    }
    names
}

fn emit_stmt(em: &mut StackEmitter, stmt: &Stmt) {
    match stmt {
        Stmt::Return { value, .. } => match value {
            Some(e) => {
                emit_expr(em, e);
                em.line("return");
            }
            None => em.line("return"),
        },
        Stmt::If { cond, then_block, else_block, .. } => {
            emit_expr(em, cond);
            em.line("(if (result i32)");
            em.indent += 1;
            em.line("(then");
            em.indent += 1;
            for s in then_block {
                emit_stmt(em, s);
            }
            em.indent -= 1;
            em.line(")");
            if let Some(else_block) = else_block {
                em.line("(else");
                em.indent += 1;
                for s in else_block {
                    emit_stmt(em, s);
                }
                em.indent -= 1;
                em.line(")");
            }
            em.indent -= 1;
            em.line(")");
        }
        Stmt::While { cond, body, .. } => {
            em.line("(block $break");
            em.indent += 1;
            em.line("(loop $continue");
            em.indent += 1;
            emit_expr(em, cond);
            em.line("i32.eqz");
            em.line("br_if $break");
            for s in body {
                emit_stmt(em, s);
            }
            em.line("br $continue");
            em.indent -= 1;
            em.line(")");
            em.indent -= 1;
            em.line(")");
        }
        Stmt::ExprStmt { expr, .. } => {
            emit_expr(em, expr);
            em.line("drop");
        }
        Stmt::Let { name, value, .. } => {
            emit_expr(em, value);
            em.line(&format!("local.set ${name}"));
        }
        other => {
            let kind = match other {
                Stmt::MatchStmt { .. } => "match",
                Stmt::For { .. } => "for loop",
                Stmt::WhileLet { .. } => "while-let",
                Stmt::Assign { .. } => "compound assignment",
                _ => "declaration",
            };
            em.unsupported(kind);
        }
    }
}

fn emit_expr(em: &mut StackEmitter, expr: &Expr) {
    match expr {
        Expr::Literal { value, .. } => match value {
            Literal::Number(n) => em.line(&format!("i32.const {n}")),
            Literal::Float(f) => em.line(&format!("f32.const {f}")),
            Literal::Boolean(b) => em.line(&format!("i32.const {}", if *b { 1 } else { 0 })),
            Literal::String(_) => em.unsupported("string literal"),
        },
        Expr::Identifier { name, .. } => em.line(&format!("local.get ${name}")),
        Expr::Binary { op, left, right, .. } => {
            emit_expr(em, left);
            emit_expr(em, right);
            em.line(binop_instr(*op));
        }
        Expr::Unary { op, operand, .. } => match op {
            UnaryOp::Neg => {
                em.line("i32.const 0");
                emit_expr(em, operand);
                em.line("i32.sub");
            }
            UnaryOp::Not => {
                emit_expr(em, operand);
                em.line("i32.eqz");
            }
        },
        Expr::Call { callee, enum_name, args, .. } if enum_name.is_none() => {
            let name = match callee.as_ref() {
                Expr::Identifier { name, .. } => Some(name.clone()),
                _ => None,
            };
            match name {
                Some(name) if STACK_IMPORTS.contains(&name.as_str()) || is_known_primitive(&name) => {
                    for a in args {
                        emit_expr(em, a);
                    }
                    em.line(&format!("call ${name}"));
                }
                _ => em.unsupported("call to a non-primitive function"),
            }
        }
        _ => em.unsupported("expression outside the restricted subset"),
    }
}

fn is_known_primitive(name: &str) -> bool {
    matches!(name, "print_int" | "print_float" | "print_bool" | "abs_int" | "abs_float")
}

fn binop_instr(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "i32.add",
        BinaryOp::Sub => "i32.sub",
        BinaryOp::Mul => "i32.mul",
        BinaryOp::Div => "i32.div_s",
        BinaryOp::Rem => "i32.rem_s",
        BinaryOp::Eq => "i32.eq",
        BinaryOp::NotEq => "i32.ne",
        BinaryOp::Lt => "i32.lt_s",
        BinaryOp::LtEq => "i32.le_s",
        BinaryOp::Gt => "i32.gt_s",
        BinaryOp::GtEq => "i32.ge_s",
        BinaryOp::And => "i32.and",
        BinaryOp::Or => "i32.or",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::Parser;

    fn emit(src: &str) -> StackEmitOutput {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().unwrap();
        emit_stack_module(&program)
    }

    #[test]
    fn emits_fixed_imports_and_memory() {
        let out = emit("fn f() -> i32 { return 1; }");
        for name in STACK_IMPORTS {
            assert!(out.text.contains(&format!("${name}")));
        }
        assert!(out.text.contains("(memory (export \"memory\") 1)"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn arithmetic_and_if_while_are_supported() {
        let out = emit(
            "fn f(x: i32) -> i32 { while (x > 0) { x = x - 1; } if (x == 0) { return 1; } return 0; }",
        );
        assert!(out.text.contains("i32.add") || out.text.contains("i32.sub"));
        assert!(out.text.contains("(loop $continue"));
    }

    #[test]
    fn match_statement_reports_wasm_001_and_emits_unreachable() {
        let out = emit("fn f() -> i32 { match 1 { _ => { return 0; } } return 1; }");
        assert!(out.diagnostics.iter().any(|d| d.code == "WASM-001"));
        assert!(out.text.contains("unreachable"));
    }

    #[test]
    fn async_function_is_rejected() {
        let out = emit("async fn f() -> i32 { return 1; }");
        assert!(out.diagnostics.iter().any(|d| d.code == "WASM-001"));
    }
}
