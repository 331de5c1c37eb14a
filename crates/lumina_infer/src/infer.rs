//! Hindley-Milner inference engine (spec §4.5).
//!
//! Single-pass over the AST: ADTs and trait declarations are registered,
//! function signatures are hoisted with fresh variables for missing
//! annotations, then every statement/expression is visited and unified
//! against its expected type. Diagnostics use the error codes from §4.5/§7.

use std::collections::HashMap;

use lumina_base::{Diagnostic, Span};
use lumina_syntax::ast::{
    BinaryOp, Expr, FnDecl, ImplDecl, Literal, MatchArm, NodeId, Param, Pattern, Program, Stmt,
    TypeExpr, UnaryOp,
};
use lumina_syntax::SourceLocation;

use crate::const_eval::check_array_size;
use crate::env::TypeEnv;
use crate::exhaustiveness::check_match_exhaustive;
use crate::registry::{AdtRegistry, TraitRegistry};
use crate::types::{format_type, Subst, Type, TypeScheme, VarGen};
use crate::unify::unify;

const PRIMITIVES: &[&str] = &["i32", "i64", "f64", "bool", "str", "void", "char"];

#[derive(Debug, Clone)]
pub struct CallSignature {
    pub args: Vec<Type>,
    pub return_type: Type,
}

#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<Type>,
    ret: Type,
    type_param_bounds: Vec<(String, Vec<String>)>,
    /// Each of the function's own type parameters, mapped to the fresh
    /// variable substituted for it throughout `params`/`ret`. A call site
    /// unifies its argument types against `params`, which pins these
    /// variables to concrete types; `check_bounds` prunes them back out to
    /// decide whether the bound is satisfied (spec §4.5, §4.6).
    type_param_vars: Vec<(String, Type)>,
}

#[derive(Default)]
pub struct InferOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub hm_expr_types: HashMap<NodeId, Type>,
    pub inferred_fn_returns: HashMap<String, Type>,
    pub inferred_calls: HashMap<NodeId, CallSignature>,
    pub subst: Subst,
}

pub struct InferEngine {
    pub adts: AdtRegistry,
    pub traits: TraitRegistry,
    vars: VarGen,
    subst: Subst,
    fn_sigs: HashMap<String, FnSig>,
    diagnostics: Vec<Diagnostic>,
    hm_expr_types: HashMap<NodeId, Type>,
    inferred_fn_returns: HashMap<String, Type>,
    inferred_calls: HashMap<NodeId, CallSignature>,
    /// One entry per `_` type hole encountered while resolving a type
    /// annotation, carrying the hole's own variable and source location so
    /// the post-inference sweep in [`InferEngine::infer_program`] can report
    /// `TYPE-HOLE-UNRESOLVED` at the hole itself rather than at the call site
    /// that happened to pin its type (spec §4.5).
    hole_sites: Vec<(Type, SourceLocation)>,
}

impl InferEngine {
    pub fn new() -> Self {
        Self {
            adts: AdtRegistry::new(),
            traits: TraitRegistry::new(),
            vars: VarGen::new(),
            subst: Subst::new(),
            fn_sigs: HashMap::new(),
            diagnostics: Vec::new(),
            hm_expr_types: HashMap::new(),
            inferred_fn_returns: HashMap::new(),
            inferred_calls: HashMap::new(),
            hole_sites: Vec::new(),
        }
    }

    pub fn infer_program(mut self, program: &Program) -> InferOutput {
        self.register_decls(program);
        self.hoist_signatures(program);

        let mut env = TypeEnv::new();
        for stmt in &program.body {
            self.infer_stmt(stmt, &mut env, &Type::unit());
        }

        for (name, sig) in &self.fn_sigs {
            self.inferred_fn_returns.insert(name.clone(), self.subst.prune(&sig.ret));
        }

        self.report_unresolved_holes();

        InferOutput {
            diagnostics: self.diagnostics,
            hm_expr_types: self.hm_expr_types,
            inferred_fn_returns: self.inferred_fn_returns,
            inferred_calls: self.inferred_calls,
            subst: self.subst,
        }
    }

    // ---- step 1: ADT/trait registration ----

    fn register_decls(&mut self, program: &Program) {
        for stmt in &program.body {
            match stmt {
                Stmt::EnumDecl(d) => self.adts.register_enum(d),
                Stmt::StructDecl(d) => self.adts.register_struct(d),
                Stmt::TraitDecl(d) => self.traits.register_trait(d),
                Stmt::ImplDecl(d) => {
                    if let Some(trait_name) = &d.trait_name {
                        self.traits.register_impl(trait_name, &d.type_name);
                    }
                }
                _ => {}
            }
        }
    }

    // ---- step 2: hoist function signatures ----

    fn hoist_signatures(&mut self, program: &Program) {
        for stmt in &program.body {
            if let Stmt::FnDecl(f) = stmt {
                self.hoist_fn(f);
            }
            if let Stmt::ImplDecl(ImplDecl { methods, .. }) = stmt {
                for m in methods {
                    self.hoist_fn(m);
                }
            }
        }
    }

    fn hoist_fn(&mut self, f: &FnDecl) {
        let mut scope = HashMap::new();
        let type_param_vars: Vec<(String, Type)> = f
            .type_params
            .iter()
            .map(|tp| {
                let var = self.vars.fresh();
                scope.insert(tp.name.clone(), var.clone());
                (tp.name.clone(), var)
            })
            .collect();
        let params = f.params.iter().map(|p: &Param| self.resolve_param_type(p, &scope)).collect();
        let ret = match &f.return_type {
            Some(t) => self.resolve_type_expr_scoped(t, &scope),
            None => self.vars.fresh(),
        };
        let type_param_bounds = f.type_params.iter().map(|tp| (tp.name.clone(), tp.bounds.clone())).collect();
        self.fn_sigs.insert(f.name.clone(), FnSig { params, ret, type_param_bounds, type_param_vars });
    }

    fn resolve_param_type(&mut self, p: &Param, scope: &HashMap<String, Type>) -> Type {
        match &p.ty {
            Some(t) => self.resolve_type_expr_scoped(t, scope),
            None => self.vars.fresh(),
        }
    }

    /// Resolves a type annotation outside of any function's own generic
    /// parameters (`let` bindings, struct/enum field types).
    fn resolve_type_expr(&mut self, t: &TypeExpr) -> Type {
        self.resolve_type_expr_scoped(t, &HashMap::new())
    }

    /// Resolves a type annotation the way [`resolve_type_expr`] does, except
    /// that a bare name matching one of `scope`'s keys resolves to that
    /// type parameter's own variable rather than an opaque ADT named after
    /// it — this is what lets `fn id<T>(x: T) -> T` unify `T` against
    /// whatever concrete type the call site passes (spec §4.5, §4.6).
    fn resolve_type_expr_scoped(&mut self, t: &TypeExpr, scope: &HashMap<String, Type>) -> Type {
        match t {
            TypeExpr::Hole { location, .. } => {
                let ty = self.vars.fresh_hole();
                if let Some(loc) = location {
                    self.hole_sites.push((ty.clone(), loc.clone()));
                }
                ty
            }
            TypeExpr::Named { name, type_args, .. } => {
                if let Some(var) = scope.get(name) {
                    var.clone()
                } else if PRIMITIVES.contains(&name.as_str()) {
                    Type::Primitive(name.clone())
                } else {
                    let args = type_args.iter().map(|a| self.resolve_type_expr_scoped(a, scope)).collect();
                    Type::Adt(name.clone(), args)
                }
            }
            TypeExpr::Function { params, ret, .. } => {
                let p = params.iter().map(|a| self.resolve_type_expr_scoped(a, scope)).collect();
                let r = Box::new(self.resolve_type_expr_scoped(ret, scope));
                Type::Function(p, r)
            }
            TypeExpr::Array { elem, .. } => Type::Adt("Array".to_string(), vec![self.resolve_type_expr_scoped(elem, scope)]),
            TypeExpr::Tuple { elems, .. } => {
                Type::Adt("Tuple".to_string(), elems.iter().map(|e| self.resolve_type_expr_scoped(e, scope)).collect())
            }
        }
    }

    /// Spec §4.5: "type holes `_` ... if still unresolved after inference,
    /// emit `TYPE-HOLE-UNRESOLVED` at the hole's location with a suggested
    /// replacement string derived from `prune(type)`." Runs once, after the
    /// whole program has been visited, so every hole has had its fair chance
    /// to be pinned by unification.
    fn report_unresolved_holes(&mut self) {
        let sites = std::mem::take(&mut self.hole_sites);
        for (ty, loc) in sites {
            let pruned = self.subst.prune(&ty);
            let suggested = format_type(&pruned, &self.subst);
            self.diagnostics.push(Diagnostic::warning(
                "TYPE-HOLE-UNRESOLVED",
                format!("unresolved type hole, suggested `{}`", suggested),
                loc.span(),
                loc.start.line,
                loc.start.column,
            ));
        }
    }

    // ---- diagnostics helpers ----

    fn error(&mut self, code: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, message, Span::default(), 0, 0));
    }

    fn record(&mut self, id: NodeId, ty: Type) {
        self.hm_expr_types.insert(id, ty);
    }

    fn unify_report(&mut self, expected: &Type, found: &Type, context: &str) -> bool {
        if unify(expected, found, &mut self.subst).is_err() {
            self.diagnostics.push(Diagnostic::error(
                "LUM-001",
                format!(
                    "type mismatch in {}: expected `{}`, found `{}`",
                    context,
                    format_type(expected, &self.subst),
                    format_type(found, &self.subst)
                ),
                Span::default(),
                0,
                0,
            ));
            false
        } else {
            true
        }
    }

    // ---- statements ----

    fn infer_stmt(&mut self, stmt: &Stmt, env: &mut TypeEnv, expected_return: &Type) {
        match stmt {
            Stmt::FnDecl(f) => self.infer_fn(f, env),
            Stmt::ImplDecl(ImplDecl { methods, .. }) => {
                for m in methods {
                    self.infer_fn(m, env);
                }
            }
            Stmt::Let { id, name, value, ty, .. } => {
                let value_ty = self.infer_expr(value, env);
                if let Some(annotated) = ty {
                    if let (TypeExpr::Array { size, .. }, Expr::ArrayLiteral { elems, .. }) = (annotated, value) {
                        if let Err(message) = check_array_size(size, elems.len(), &HashMap::new()) {
                            let code = if message.contains("divides by zero") { "CONST-DIV-ZERO" } else { "CONST-SIZE-MISMATCH" };
                            self.error(code, message);
                        }
                    }
                    let annotated_ty = self.resolve_type_expr(annotated);
                    self.unify_report(&annotated_ty, &value_ty, "let binding");
                }
                let generalized = self.generalize(env, &value_ty);
                env.bind(name.clone(), generalized);
                self.record(*id, value_ty);
            }
            Stmt::LetTuple { names, value, .. } => {
                let value_ty = self.infer_expr(value, env);
                for name in names {
                    env.bind(name.clone(), TypeScheme::monomorphic(self.vars.fresh()));
                }
                let _ = value_ty;
            }
            Stmt::Return { value, .. } => {
                let ty = match value {
                    Some(v) => self.infer_expr(v, env),
                    None => Type::unit(),
                };
                self.unify_report(expected_return, &ty, "return statement");
            }
            Stmt::If { cond, then_block, else_block, .. } => {
                let cond_ty = self.infer_expr(cond, env);
                self.unify_report(&Type::Primitive("bool".to_string()), &cond_ty, "if condition");
                env.push_scope();
                for s in then_block {
                    self.infer_stmt(s, env, expected_return);
                }
                env.pop_scope();
                if let Some(else_block) = else_block {
                    env.push_scope();
                    for s in else_block {
                        self.infer_stmt(s, env, expected_return);
                    }
                    env.pop_scope();
                }
            }
            Stmt::While { cond, body, .. } => {
                let cond_ty = self.infer_expr(cond, env);
                self.unify_report(&Type::Primitive("bool".to_string()), &cond_ty, "while condition");
                env.push_scope();
                for s in body {
                    self.infer_stmt(s, env, expected_return);
                }
                env.pop_scope();
            }
            Stmt::WhileLet { scrutinee, body, .. } => {
                self.infer_expr(scrutinee, env);
                env.push_scope();
                for s in body {
                    self.infer_stmt(s, env, expected_return);
                }
                env.pop_scope();
            }
            Stmt::For { binding, iterable, body, .. } => {
                self.infer_expr(iterable, env);
                env.push_scope();
                env.bind(binding.clone(), TypeScheme::monomorphic(self.vars.fresh()));
                for s in body {
                    self.infer_stmt(s, env, expected_return);
                }
                env.pop_scope();
            }
            Stmt::MatchStmt { scrutinee, arms, .. } => {
                self.infer_match(scrutinee, arms, env);
            }
            Stmt::Assign { target, value, .. } => {
                let target_ty = self.infer_expr(target, env);
                let value_ty = self.infer_expr(value, env);
                self.unify_report(&target_ty, &value_ty, "assignment");
            }
            Stmt::ExprStmt { expr, .. } => {
                self.infer_expr(expr, env);
            }
            Stmt::Block { stmts, .. } => {
                env.push_scope();
                for s in stmts {
                    self.infer_stmt(s, env, expected_return);
                }
                env.pop_scope();
            }
            Stmt::Import(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TypeDecl(_) | Stmt::TraitDecl(_) => {}
        }
    }

    fn infer_fn(&mut self, f: &FnDecl, env: &mut TypeEnv) {
        let sig = self.fn_sigs.get(&f.name).cloned().unwrap_or_else(|| FnSig {
            params: f.params.iter().map(|_| self.vars.fresh()).collect(),
            ret: self.vars.fresh(),
            type_param_bounds: Vec::new(),
            type_param_vars: Vec::new(),
        });
        env.push_scope();
        for (param, ty) in f.params.iter().zip(sig.params.iter()) {
            env.bind(param.name.clone(), TypeScheme::monomorphic(ty.clone()));
        }
        for stmt in &f.body {
            self.infer_stmt(stmt, env, &sig.ret);
        }
        env.pop_scope();
    }

    // ---- expressions ----

    fn infer_expr(&mut self, expr: &Expr, env: &mut TypeEnv) -> Type {
        let ty = self.infer_expr_inner(expr, env);
        self.record(expr.id(), ty.clone());
        ty
    }

    fn infer_expr_inner(&mut self, expr: &Expr, env: &mut TypeEnv) -> Type {
        match expr {
            Expr::Literal { value, .. } => literal_type(value),
            Expr::InterpolatedString { segments, .. } => {
                for seg in segments {
                    if let lumina_syntax::ast::StringSegment::Expr(e) = seg {
                        self.infer_expr(e, env);
                    }
                }
                Type::Primitive("str".to_string())
            }
            Expr::Identifier { name, .. } => match env.lookup(name) {
                Some(scheme) => self.instantiate(scheme),
                None => match self.fn_sigs.get(name) {
                    Some(sig) => Type::Function(sig.params.clone(), Box::new(sig.ret.clone())),
                    None => self.vars.fresh(),
                },
            },
            Expr::Binary { op, left, right, .. } => self.infer_binary(*op, left, right, env),
            Expr::Unary { op, operand, .. } => {
                let ty = self.infer_expr(operand, env);
                match op {
                    UnaryOp::Neg => ty,
                    UnaryOp::Not => {
                        self.unify_report(&Type::Primitive("bool".to_string()), &ty, "unary `!`");
                        Type::Primitive("bool".to_string())
                    }
                }
            }
            Expr::Call { callee, enum_name, args, .. } => self.infer_call(expr.id(), callee, enum_name.as_deref(), args, env),
            Expr::Member { object, .. } => {
                self.infer_expr(object, env);
                self.vars.fresh()
            }
            Expr::StructLiteral { name, fields, .. } => {
                for (_, value) in fields {
                    self.infer_expr(value, env);
                }
                if self.adts.is_known(name) {
                    Type::Adt(name.clone(), Vec::new())
                } else {
                    self.error("HM_ENUM", format!("unknown type `{}`", name));
                    self.vars.fresh()
                }
            }
            Expr::ArrayLiteral { elems, .. } => {
                let elem_ty = self.vars.fresh();
                for e in elems {
                    let t = self.infer_expr(e, env);
                    self.unify_report(&elem_ty, &t, "array literal element");
                }
                Type::Adt("Array".to_string(), vec![elem_ty])
            }
            Expr::Index { object, index, .. } => {
                let obj_ty = self.infer_expr(object, env);
                self.infer_expr(index, env);
                match self.subst.prune(&obj_ty) {
                    Type::Adt(name, mut params) if name == "Array" && !params.is_empty() => params.remove(0),
                    _ => self.vars.fresh(),
                }
            }
            Expr::Match { scrutinee, arms, .. } => self.infer_match_expr(scrutinee, arms, env),
            Expr::Is { scrutinee, .. } => {
                self.infer_expr(scrutinee, env);
                Type::Primitive("bool".to_string())
            }
            Expr::Try { inner, .. } => self.infer_expr(inner, env),
            Expr::Move { inner, .. } => self.infer_expr(inner, env),
            Expr::Await { inner, .. } => {
                let ty = self.infer_expr(inner, env);
                match self.subst.prune(&ty) {
                    Type::Promise(inner) => *inner,
                    other => other,
                }
            }
            Expr::Range { start, end, .. } => {
                let s = self.infer_expr(start, env);
                let e = self.infer_expr(end, env);
                self.unify_report(&s, &e, "range bounds");
                Type::Adt("Range".to_string(), vec![s])
            }
            Expr::Lambda { params, body, .. } => {
                env.push_scope();
                let param_types: Vec<Type> = params.iter().map(|_| self.vars.fresh()).collect();
                for (name, ty) in params.iter().zip(param_types.iter()) {
                    env.bind(name.clone(), TypeScheme::monomorphic(ty.clone()));
                }
                let ret = self.infer_expr(body, env);
                env.pop_scope();
                Type::Function(param_types, Box::new(ret))
            }
            Expr::Tuple { elems, .. } => Type::Adt("Tuple".to_string(), elems.iter().map(|e| self.infer_expr(e, env)).collect()),
            Expr::Block { stmts, .. } => {
                env.push_scope();
                let mut last = Type::unit();
                for (i, s) in stmts.iter().enumerate() {
                    if i + 1 == stmts.len() {
                        if let Stmt::ExprStmt { expr, .. } = s {
                            last = self.infer_expr(expr, env);
                            continue;
                        }
                    }
                    self.infer_stmt(s, env, &Type::unit());
                }
                env.pop_scope();
                last
            }
        }
    }

    fn infer_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, env: &mut TypeEnv) -> Type {
        let lt = self.infer_expr(left, env);
        let rt = self.infer_expr(right, env);
        use BinaryOp::*;
        match op {
            Add | Sub | Mul | Div | Rem => {
                self.unify_report(&lt, &rt, "binary operands");
                lt
            }
            Eq | NotEq | Lt | LtEq | Gt | GtEq => {
                self.unify_report(&lt, &rt, "comparison operands");
                Type::Primitive("bool".to_string())
            }
            And | Or => {
                self.unify_report(&Type::Primitive("bool".to_string()), &lt, "logical operand");
                self.unify_report(&Type::Primitive("bool".to_string()), &rt, "logical operand");
                Type::Primitive("bool".to_string())
            }
        }
    }

    fn infer_call(
        &mut self,
        call_id: NodeId,
        callee: &Expr,
        enum_name: Option<&str>,
        args: &[Expr],
        env: &mut TypeEnv,
    ) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|a| self.infer_expr(a, env)).collect();

        if let Some(enum_qualifier) = enum_name {
            return self.infer_enum_constructor(enum_qualifier, callee, &arg_types);
        }
        if let Expr::Identifier { name, .. } = callee {
            if let Some(owner) = self.adts.find_variant_owner(name) {
                let owner = owner.to_string();
                return self.infer_enum_constructor(&owner, callee, &arg_types);
            }
        }

        let callee_ty = self.infer_expr(callee, env);
        let ret = self.vars.fresh();
        let expected = Type::Function(arg_types.clone(), Box::new(ret.clone()));
        if let Type::Function(params, _) = self.subst.prune(&callee_ty) {
            if params.len() != arg_types.len() {
                self.error(
                    "LUM-002",
                    format!("function expects {} argument(s), found {}", params.len(), arg_types.len()),
                );
            }
        }
        self.unify_report(&callee_ty, &expected, "function call");
        let result = self.subst.prune(&ret);
        self.inferred_calls.insert(call_id, CallSignature { args: arg_types, return_type: result.clone() });
        if let Expr::Identifier { name, .. } = callee {
            self.check_bounds(name);
        }
        result
    }

    /// Spec §4.5: "the semantic analyzer verifies that each concrete type
    /// has an `impl Trait for Type` registered". Runs after the call's
    /// argument types have been unified against the callee's signature, so
    /// each type parameter's variable is pruned to whatever concrete type
    /// the call site actually passed.
    fn check_bounds(&mut self, fn_name: &str) {
        let Some(sig) = self.fn_sigs.get(fn_name).cloned() else { return };
        for (param_name, bounds) in &sig.type_param_bounds {
            if bounds.is_empty() {
                continue;
            }
            let Some(var) = sig.type_param_vars.iter().find(|(n, _)| n == param_name).map(|(_, t)| t.clone()) else {
                continue;
            };
            let concrete = self.subst.prune(&var);
            let type_name = format_type(&concrete, &self.subst);
            for bound in bounds {
                if !self.traits.type_satisfies(bound, &type_name) {
                    self.error(
                        "BOUND_MISMATCH",
                        format!("type `{}` does not implement trait `{}` required by `{}`", type_name, bound, param_name),
                    );
                }
            }
        }
    }

    fn infer_enum_constructor(&mut self, enum_name: &str, callee: &Expr, arg_types: &[Type]) -> Type {
        let variant = match callee {
            Expr::Identifier { name, .. } => name.clone(),
            _ => return self.vars.fresh(),
        };
        let Some(arity) = self.adts.find_variant(enum_name, &variant).map(|v| v.payload_arity) else {
            self.error("HM_ENUM_VARIANT", format!("unknown variant `{}` of enum `{}`", variant, enum_name));
            return self.vars.fresh();
        };
        if arity != arg_types.len() {
            self.error(
                "HM_ENUM_VARIANT",
                format!("variant `{}` expects {} argument(s), found {}", variant, arity, arg_types.len()),
            );
        }
        Type::Adt(enum_name.to_string(), Vec::new())
    }

    fn infer_match(&mut self, scrutinee: &Expr, arms: &[lumina_syntax::ast::MatchArm], env: &mut TypeEnv) -> Type {
        self.infer_match_expr(scrutinee, arms, env)
    }

    fn infer_match_expr(&mut self, scrutinee: &Expr, arms: &[MatchArm], env: &mut TypeEnv) -> Type {
        let scrutinee_ty = self.infer_expr(scrutinee, env);
        let result = self.vars.fresh();

        let patterns: Vec<Pattern> = arms.iter().map(|a| a.pattern.clone()).collect();
        if let Type::Adt(enum_name, _) = self.subst.prune(&scrutinee_ty) {
            let report = check_match_exhaustive(&enum_name, &patterns, &self.adts);
            if !report.exhaustive {
                self.error(
                    "LUM-003",
                    format!("non-exhaustive match on `{}`: missing variant(s) {}", enum_name, report.missing_variants.join(", ")),
                );
            }
        }

        for arm in arms {
            env.push_scope();
            self.bind_pattern(&arm.pattern, env);
            if let Some(guard) = &arm.guard {
                let guard_ty = self.infer_expr(guard, env);
                self.unify_report(&Type::Primitive("bool".to_string()), &guard_ty, "match guard");
            }
            let body_ty = self.infer_expr(&arm.body, env);
            self.unify_report(&result, &body_ty, "match arm");
            env.pop_scope();
        }
        self.subst.prune(&result)
    }

    fn bind_pattern(&mut self, pattern: &Pattern, env: &mut TypeEnv) {
        match pattern {
            Pattern::Binding { name, .. } => env.bind(name.clone(), TypeScheme::monomorphic(self.vars.fresh())),
            Pattern::Enum { bindings, .. } => {
                for b in bindings {
                    self.bind_pattern(b, env);
                }
            }
            Pattern::Struct { fields, .. } => {
                for (_, p) in fields {
                    self.bind_pattern(p, env);
                }
            }
            Pattern::Tuple { elems, .. } => {
                for e in elems {
                    self.bind_pattern(e, env);
                }
            }
            Pattern::Wildcard { .. } | Pattern::Literal { .. } => {}
        }
    }

    // ---- generalization (spec §4.5 step 7) ----

    fn generalize(&self, env: &TypeEnv, ty: &Type) -> TypeScheme {
        let pruned = self.subst.prune(ty);
        let env_free = env.free_vars();
        let mut variables: Vec<_> = pruned.free_vars().into_iter().filter(|v| !env_free.contains(v)).collect();
        variables.sort_unstable();
        TypeScheme { variables, ty: pruned }
    }

    fn instantiate(&mut self, scheme: &TypeScheme) -> Type {
        if scheme.variables.is_empty() {
            return scheme.ty.clone();
        }
        let mut mapping = HashMap::new();
        for v in &scheme.variables {
            mapping.insert(*v, self.vars.fresh());
        }
        substitute_vars(&scheme.ty, &mapping)
    }
}

impl Default for InferEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn substitute_vars(ty: &Type, mapping: &HashMap<u32, Type>) -> Type {
    match ty {
        Type::Variable(v) => mapping.get(v).cloned().unwrap_or_else(|| ty.clone()),
        Type::Hole(v) => mapping.get(v).cloned().unwrap_or_else(|| ty.clone()),
        Type::Function(params, ret) => {
            Type::Function(params.iter().map(|p| substitute_vars(p, mapping)).collect(), Box::new(substitute_vars(ret, mapping)))
        }
        Type::Adt(name, params) => Type::Adt(name.clone(), params.iter().map(|p| substitute_vars(p, mapping)).collect()),
        Type::Promise(inner) => Type::Promise(Box::new(substitute_vars(inner, mapping))),
        Type::Primitive(_) => ty.clone(),
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Number(_) => Type::Primitive("i32".to_string()),
        Literal::Float(_) => Type::Primitive("f64".to_string()),
        Literal::String(_) => Type::Primitive("str".to_string()),
        Literal::Boolean(_) => Type::Primitive("bool".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::Parser;

    fn infer(src: &str) -> InferOutput {
        let mut parser = Parser::new(src);
        let program = parser.parse_program().expect("parses");
        InferEngine::new().infer_program(&program)
    }

    #[test]
    fn infers_simple_arithmetic_function() {
        let out = infer("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.inferred_fn_returns.get("add"), Some(&Type::Primitive("i32".to_string())));
    }

    #[test]
    fn reports_type_mismatch_on_bad_return() {
        let out = infer("fn f() -> i32 { return true; }");
        assert!(out.diagnostics.iter().any(|d| d.code == "LUM-001"));
    }

    #[test]
    fn reports_non_exhaustive_match() {
        let src = "enum Option { Some(i32), None } fn f(o: Option) -> i32 { match o { Option.Some(v) => v } }";
        let out = infer(src);
        assert!(out.diagnostics.iter().any(|d| d.code == "LUM-003"));
    }

    #[test]
    fn exhaustive_match_with_wildcard_has_no_diagnostic() {
        let src = "enum Option { Some(i32), None } fn f(o: Option) -> i32 { match o { Option.Some(v) => v, _ => 0 } }";
        let out = infer(src);
        assert!(!out.diagnostics.iter().any(|d| d.code == "LUM-003"));
    }

    #[test]
    fn unknown_enum_variant_is_reported() {
        let src = "enum Option { Some(i32), None } fn f() -> Option { Option.Other(1) }";
        let out = infer(src);
        assert!(out.diagnostics.iter().any(|d| d.code == "HM_ENUM_VARIANT"));
    }

    #[test]
    fn reports_bound_mismatch_when_impl_is_missing() {
        let src = "trait Printable { fn show(); } fn print_one<T: Printable>(x: T) -> void { return; } fn main() -> void { print_one(1); return; }";
        let out = infer(src);
        let mismatches: Vec<_> = out.diagnostics.iter().filter(|d| d.code == "BOUND_MISMATCH").collect();
        assert_eq!(mismatches.len(), 1);
    }

    #[test]
    fn bound_is_satisfied_once_the_impl_is_registered() {
        let src = "trait Printable { fn show(); } impl Printable for i32 { fn show() -> void { return; } } fn print_one<T: Printable>(x: T) -> void { return; } fn main() -> void { print_one(1); return; }";
        let out = infer(src);
        assert!(!out.diagnostics.iter().any(|d| d.code == "BOUND_MISMATCH"));
    }

    #[test]
    fn generic_function_call_unifies_its_type_parameter_against_the_argument() {
        let src = "fn id<T>(x: T) -> T { return x; } fn main() -> i32 { let a = id(1); return a; }";
        let out = infer(src);
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.inferred_fn_returns.get("main"), Some(&Type::Primitive("i32".to_string())));
    }

    #[test]
    fn reports_unresolved_type_hole_with_suggested_type() {
        let src = "fn f() -> i32 { let x: _ = 5; return x; }";
        let out = infer(src);
        let hole = out.diagnostics.iter().find(|d| d.code == "TYPE-HOLE-UNRESOLVED").expect("hole diagnostic");
        assert!(!hole.is_error());
        assert!(hole.message.contains("i32"), "message was: {}", hole.message);
    }

    #[test]
    fn fully_annotated_bindings_have_no_hole_diagnostic() {
        let src = "fn f() -> i32 { let x: i32 = 5; return x; }";
        let out = infer(src);
        assert!(!out.diagnostics.iter().any(|d| d.code == "TYPE-HOLE-UNRESOLVED"));
    }
}
