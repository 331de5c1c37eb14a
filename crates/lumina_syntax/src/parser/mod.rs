//! Recursive-descent parser producing the typed AST (spec §4.2).
//!
//! The grammar (§4.2) is compiled separately by [`crate::grammar`] for
//! validation/tooling purposes; this module is the executable parser that
//! the compiled grammar's start rules dispatch into.

pub mod error;

use crate::ast::*;
use crate::lexer::{Lexer, LexerOptions};
use crate::token::{Keyword, OperatorKind, Position, SourceLocation, Token, TokenKind};
use lumina_base::Diagnostic;
pub use error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRule {
    Program,
    Expr,
    Stmt,
    Pattern,
    TypeExpr,
}

#[derive(Default)]
pub struct ParseOptions {
    pub start_rule: Option<StartRule>,
    pub enable_diagnostics: bool,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ids: NodeIdAllocator,
    source_file: Option<String>,
    /// `MISSING_SEMICOLON` lints collected as statements are parsed (spec
    /// §4.4 — "a separate post-pass lint"), drained by
    /// [`Parser::take_lints`] once parsing finishes.
    lints: Vec<Diagnostic>,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(LexerOptions::default());
        let tokens = lexer.tokenize_all(source);
        Self { tokens, pos: 0, ids: NodeIdAllocator::new(), source_file: None, lints: Vec::new() }
    }

    /// Drains the semicolon lints collected so far.
    pub fn take_lints(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.lints)
    }

    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    pub fn parse(&mut self, options: &ParseOptions) -> PResult<ParseOutput> {
        match options.start_rule.unwrap_or(StartRule::Program) {
            StartRule::Program => Ok(ParseOutput::Program(self.parse_program()?)),
            StartRule::Expr => Ok(ParseOutput::Expr(self.parse_expr()?)),
            StartRule::Stmt => Ok(ParseOutput::Stmt(self.parse_stmt()?)),
            StartRule::Pattern => Ok(ParseOutput::Pattern(self.parse_pattern()?)),
            StartRule::TypeExpr => Ok(ParseOutput::Type(self.parse_type()?)),
        }
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        let mut body = Vec::new();
        while !self.is_eof() {
            body.push(self.parse_stmt()?);
        }
        Ok(Program { body })
    }

    // ---- token stream helpers ----

    fn is_eof(&self) -> bool {
        self.tokens.get(self.pos).map(|t| t.is_eof()).unwrap_or(true)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        t
    }

    pub fn cursor(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len().saturating_sub(1));
    }

    pub fn peek_token(&self) -> &Token {
        self.peek()
    }

    fn loc(&self, t: &Token) -> SourceLocation {
        let mut loc = t.location();
        loc.source_file = self.source_file.clone();
        loc
    }

    fn is_op(&self, op: OperatorKind) -> bool {
        matches!(self.peek_kind(), TokenKind::Operator(o) if *o == op)
    }

    fn is_kw(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_op(&mut self, op: OperatorKind) -> bool {
        if self.is_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, kw: Keyword) -> bool {
        if self.is_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a statement-terminating `;` if present. The grammar treats
    /// it as optional (so a missing one never aborts the parse), but if the
    /// next token isn't the block's closing `}` or EOF — i.e. another
    /// statement follows directly with no separator — records a
    /// `MISSING_SEMICOLON` lint at that position (spec §4.4).
    fn eat_stmt_semicolon(&mut self) {
        if self.eat_op(OperatorKind::Semicolon) {
            return;
        }
        if self.is_op(OperatorKind::RBrace) || self.is_eof() {
            return;
        }
        let loc = self.loc(self.peek());
        self.lints.push(Diagnostic::warning("MISSING_SEMICOLON", "missing `;`", loc.span(), loc.start.line, loc.start.column));
    }

    fn expect_op(&mut self, op: OperatorKind, what: &str) -> PResult<Token> {
        if self.is_op(op) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<String> {
        if matches!(self.peek_kind(), TokenKind::Identifier) {
            Ok(self.advance().lexeme)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        let t = self.peek();
        ParseError {
            message: format!("expected {}, found `{}`", what, t.lexeme),
            location: self.loc(t),
            found: t.kind.clone(),
        }
    }

    // ---- declarations / statements ----

    fn parse_visibility(&mut self) -> Visibility {
        if self.eat_kw(Keyword::Pub) {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    fn parse_type_params(&mut self) -> PResult<(Vec<TypeParam>, Vec<String>)> {
        let mut type_params = Vec::new();
        let mut const_params = Vec::new();
        if self.eat_op(OperatorKind::Lt) {
            loop {
                if matches!(self.peek_kind(), TokenKind::Identifier) && self.peek().lexeme == "const" {
                    self.advance();
                    let name = self.expect_ident("const parameter name")?;
                    self.expect_op(OperatorKind::Colon, "`:` after const parameter")?;
                    self.parse_type()?; // const param type (usize etc.), not retained beyond validation
                    const_params.push(name);
                } else {
                    let name = self.expect_ident("type parameter")?;
                    let mut bounds = Vec::new();
                    if self.eat_op(OperatorKind::Colon) {
                        bounds.push(self.expect_ident("trait bound")?);
                        while self.eat_op(OperatorKind::Amp) {
                            bounds.push(self.expect_ident("trait bound")?);
                        }
                    }
                    type_params.push(TypeParam { name, bounds });
                }
                if !self.eat_op(OperatorKind::Comma) {
                    break;
                }
            }
            self.expect_op(OperatorKind::Gt, "`>` to close type parameters")?;
        }
        Ok((type_params, const_params))
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect_op(OperatorKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.is_op(OperatorKind::RParen) {
            let name = self.expect_ident("parameter name")?;
            let ty = if self.eat_op(OperatorKind::Colon) { Some(self.parse_type()?) } else { None };
            params.push(Param { name, ty });
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RParen, "`)`")?;
        Ok(params)
    }

    fn parse_fn_decl(&mut self, visibility: Visibility) -> PResult<FnDecl> {
        let start = self.peek().clone();
        let is_async = self.eat_kw(Keyword::Async);
        self.eat_kw(Keyword::Fn);
        let name = self.expect_ident("function name")?;
        let (type_params, const_params) = self.parse_type_params()?;
        let params = self.parse_params()?;
        let return_type = if self.eat_op(OperatorKind::Arrow) { Some(self.parse_type()?) } else { None };
        let body = self.parse_block()?;
        Ok(FnDecl {
            id: self.ids.next_id(),
            name,
            type_params,
            const_params,
            params,
            return_type,
            body,
            visibility,
            is_async,
            is_extern: false,
            extern_module: None,
            location: Some(self.loc(&start)),
        })
    }

    fn parse_struct_decl(&mut self, visibility: Visibility) -> PResult<StructDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Struct);
        let name = self.expect_ident("struct name")?;
        let (type_params, _) = self.parse_type_params()?;
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            let field_vis = self.parse_visibility();
            let fname = self.expect_ident("field name")?;
            self.expect_op(OperatorKind::Colon, "`:`")?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl { name: fname, ty, visibility: field_vis });
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(StructDecl { id: self.ids.next_id(), name, type_params, fields, visibility, location: Some(self.loc(&start)) })
    }

    fn parse_enum_decl(&mut self, visibility: Visibility) -> PResult<EnumDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Enum);
        let name = self.expect_ident("enum name")?;
        let (type_params, _) = self.parse_type_params()?;
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut variants = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            let vname = self.expect_ident("variant name")?;
            let mut payload = Vec::new();
            if self.eat_op(OperatorKind::LParen) {
                while !self.is_op(OperatorKind::RParen) {
                    payload.push(self.parse_type()?);
                    if !self.eat_op(OperatorKind::Comma) {
                        break;
                    }
                }
                self.expect_op(OperatorKind::RParen, "`)`")?;
            }
            variants.push(VariantDecl { name: vname, payload });
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(EnumDecl { id: self.ids.next_id(), name, type_params, variants, visibility, location: Some(self.loc(&start)) })
    }

    fn parse_type_decl(&mut self, visibility: Visibility) -> PResult<TypeDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Type);
        let name = self.expect_ident("type name")?;
        let (type_params, _) = self.parse_type_params()?;
        self.expect_op(OperatorKind::Eq, "`=`")?;
        let target = self.parse_type()?;
        self.eat_op(OperatorKind::Semicolon);
        Ok(TypeDecl { id: self.ids.next_id(), name, type_params, target, visibility, location: Some(self.loc(&start)) })
    }

    fn parse_trait_decl(&mut self, visibility: Visibility) -> PResult<TraitDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Trait);
        let name = self.expect_ident("trait name")?;
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut methods = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            self.eat_kw(Keyword::Fn);
            let mname = self.expect_ident("method name")?;
            let params = self.parse_params()?;
            let return_type = if self.eat_op(OperatorKind::Arrow) { Some(self.parse_type()?) } else { None };
            self.eat_op(OperatorKind::Semicolon);
            methods.push(TraitMethodSig { name: mname, params, return_type });
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(TraitDecl { id: self.ids.next_id(), name, methods, visibility, location: Some(self.loc(&start)) })
    }

    fn parse_impl_decl(&mut self) -> PResult<ImplDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Impl);
        let first = self.expect_ident("type or trait name")?;
        let (trait_name, type_name) = if self.eat_kw(Keyword::For) {
            (Some(first), self.expect_ident("type name")?)
        } else {
            (None, first)
        };
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut methods = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            let vis = self.parse_visibility();
            methods.push(self.parse_fn_decl(vis)?);
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(ImplDecl { id: self.ids.next_id(), trait_name, type_name, methods, location: Some(self.loc(&start)) })
    }

    fn parse_import_decl(&mut self) -> PResult<ImportDecl> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Import);
        let mut names = Vec::new();
        if self.eat_op(OperatorKind::LBrace) {
            while !self.is_op(OperatorKind::RBrace) {
                names.push(self.expect_ident("imported name")?);
                if !self.eat_op(OperatorKind::Comma) {
                    break;
                }
            }
            self.expect_op(OperatorKind::RBrace, "`}`")?;
        } else {
            names.push(self.expect_ident("imported name")?);
        }
        self.eat_kw(Keyword::From);
        let specifier = match self.advance().kind {
            TokenKind::String | TokenKind::RawString => self.tokens[self.pos - 1].lexeme.clone(),
            _ => return Err(self.unexpected("import specifier string")),
        };
        self.eat_op(OperatorKind::Semicolon);
        Ok(ImportDecl { id: self.ids.next_id(), specifier, names, location: Some(self.loc(&start)) })
    }

    pub fn parse_stmt(&mut self) -> PResult<Stmt> {
        let vis_lookahead = self.is_kw(Keyword::Pub);
        if vis_lookahead || self.is_kw(Keyword::Fn) || self.is_kw(Keyword::Async) {
            let vis = self.parse_visibility();
            return Ok(Stmt::FnDecl(self.parse_fn_decl(vis)?));
        }
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Import) => Ok(Stmt::Import(self.parse_import_decl()?)),
            TokenKind::Keyword(Keyword::Struct) => Ok(Stmt::StructDecl(self.parse_struct_decl(Visibility::Private)?)),
            TokenKind::Keyword(Keyword::Enum) => Ok(Stmt::EnumDecl(self.parse_enum_decl(Visibility::Private)?)),
            TokenKind::Keyword(Keyword::Type) => Ok(Stmt::TypeDecl(self.parse_type_decl(Visibility::Private)?)),
            TokenKind::Keyword(Keyword::Trait) => Ok(Stmt::TraitDecl(self.parse_trait_decl(Visibility::Private)?)),
            TokenKind::Keyword(Keyword::Impl) => Ok(Stmt::ImplDecl(self.parse_impl_decl()?)),
            TokenKind::Keyword(Keyword::Let) => self.parse_let_stmt(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_stmt(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_stmt(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_stmt(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_stmt(),
            TokenKind::Keyword(Keyword::Match) => self.parse_match_stmt(),
            TokenKind::Operator(OperatorKind::LBrace) => self.parse_block_stmt(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    fn parse_let_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Let);
        let mutable = self.eat_kw(Keyword::Mut);
        if self.is_op(OperatorKind::LParen) {
            self.advance();
            let mut names = Vec::new();
            while !self.is_op(OperatorKind::RParen) {
                names.push(self.expect_ident("binding name")?);
                if !self.eat_op(OperatorKind::Comma) {
                    break;
                }
            }
            self.expect_op(OperatorKind::RParen, "`)`")?;
            self.expect_op(OperatorKind::Eq, "`=`")?;
            let value = self.parse_expr()?;
            self.eat_stmt_semicolon();
            return Ok(Stmt::LetTuple { id: self.ids.next_id(), names, value, location: Some(self.loc(&start)) });
        }
        let name = self.expect_ident("binding name")?;
        let ty = if self.eat_op(OperatorKind::Colon) { Some(self.parse_type()?) } else { None };
        self.expect_op(OperatorKind::Eq, "`=`")?;
        let value = self.parse_expr()?;
        self.eat_stmt_semicolon();
        Ok(Stmt::Let { id: self.ids.next_id(), name, mutable, ty, value, location: Some(self.loc(&start)) })
    }

    fn parse_return_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Return);
        let value = if self.is_op(OperatorKind::Semicolon) || self.is_op(OperatorKind::RBrace) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.eat_stmt_semicolon();
        Ok(Stmt::Return { id: self.ids.next_id(), value, location: Some(self.loc(&start)) })
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            if self.is_eof() {
                return Err(self.unexpected("`}`"));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(stmts)
    }

    fn parse_block_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        let stmts = self.parse_block()?;
        Ok(Stmt::Block { id: self.ids.next_id(), stmts, location: Some(self.loc(&start)) })
    }

    fn parse_if_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::If);
        if self.eat_kw(Keyword::Let) {
            let pattern = self.parse_pattern()?;
            self.expect_op(OperatorKind::Eq, "`=`")?;
            let scrutinee = self.parse_expr_no_struct()?;
            let body = self.parse_block()?;
            return Ok(Stmt::WhileLet { id: self.ids.next_id(), pattern, scrutinee, body, location: Some(self.loc(&start)) });
        }
        let cond = self.parse_expr_no_struct()?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat_kw(Keyword::Else) {
            if self.is_kw(Keyword::If) {
                Some(vec![self.parse_if_stmt()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { id: self.ids.next_id(), cond, then_block, else_block, location: Some(self.loc(&start)) })
    }

    fn parse_while_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::While);
        if self.eat_kw(Keyword::Let) {
            let pattern = self.parse_pattern()?;
            self.expect_op(OperatorKind::Eq, "`=`")?;
            let scrutinee = self.parse_expr_no_struct()?;
            let body = self.parse_block()?;
            return Ok(Stmt::WhileLet { id: self.ids.next_id(), pattern, scrutinee, body, location: Some(self.loc(&start)) });
        }
        let cond = self.parse_expr_no_struct()?;
        let body = self.parse_block()?;
        Ok(Stmt::While { id: self.ids.next_id(), cond, body, location: Some(self.loc(&start)) })
    }

    fn parse_for_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::For);
        let binding = self.expect_ident("loop variable")?;
        self.eat_kw(Keyword::In);
        let iterable = self.parse_expr_no_struct()?;
        let body = self.parse_block()?;
        Ok(Stmt::For { id: self.ids.next_id(), binding, iterable, body, location: Some(self.loc(&start)) })
    }

    fn parse_match_arms(&mut self) -> PResult<Vec<MatchArm>> {
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut arms = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            let pattern = self.parse_pattern()?;
            let guard = if self.eat_kw(Keyword::If) { Some(Box::new(self.parse_expr()?)) } else { None };
            self.expect_op(OperatorKind::FatArrow, "`=>`")?;
            let body = Box::new(self.parse_expr()?);
            arms.push(MatchArm { pattern, guard, body });
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(arms)
    }

    fn parse_match_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        self.eat_kw(Keyword::Match);
        let scrutinee = self.parse_expr_no_struct()?;
        let arms = self.parse_match_arms()?;
        Ok(Stmt::MatchStmt { id: self.ids.next_id(), scrutinee, arms, location: Some(self.loc(&start)) })
    }

    fn parse_expr_or_assign_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().clone();
        let expr = self.parse_expr()?;
        let op = match self.peek_kind() {
            TokenKind::Operator(OperatorKind::Eq) => Some(AssignOp::Assign),
            TokenKind::Operator(OperatorKind::PlusEq) => Some(AssignOp::AddAssign),
            TokenKind::Operator(OperatorKind::MinusEq) => Some(AssignOp::SubAssign),
            TokenKind::Operator(OperatorKind::StarEq) => Some(AssignOp::MulAssign),
            TokenKind::Operator(OperatorKind::SlashEq) => Some(AssignOp::DivAssign),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let value = self.parse_expr()?;
            self.eat_stmt_semicolon();
            return Ok(Stmt::Assign { id: self.ids.next_id(), op, target: expr, value, location: Some(self.loc(&start)) });
        }
        self.eat_stmt_semicolon();
        Ok(Stmt::ExprStmt { id: self.ids.next_id(), expr, location: Some(self.loc(&start)) })
    }

    // ---- expressions (precedence climbing) ----

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary(0, true)
    }

    fn parse_expr_no_struct(&mut self) -> PResult<Expr> {
        self.parse_binary(0, false)
    }

    fn binding_power(op: OperatorKind) -> Option<(u8, BinaryOp)> {
        use OperatorKind::*;
        Some(match op {
            OrOr => (1, BinaryOp::Or),
            AndAnd => (2, BinaryOp::And),
            EqEq => (3, BinaryOp::Eq),
            NotEq => (3, BinaryOp::NotEq),
            Lt => (4, BinaryOp::Lt),
            LtEq => (4, BinaryOp::LtEq),
            Gt => (4, BinaryOp::Gt),
            GtEq => (4, BinaryOp::GtEq),
            Plus => (5, BinaryOp::Add),
            Minus => (5, BinaryOp::Sub),
            Star => (6, BinaryOp::Mul),
            Slash => (6, BinaryOp::Div),
            Percent => (6, BinaryOp::Rem),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_bp: u8, allow_struct: bool) -> PResult<Expr> {
        let mut left = self.parse_range(allow_struct)?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Operator(o) => *o,
                _ => break,
            };
            let Some((bp, bin_op)) = Self::binding_power(op) else { break };
            if bp < min_bp {
                break;
            }
            let tok = self.advance();
            let right = self.parse_binary(bp + 1, allow_struct)?;
            let id = self.ids.next_id();
            let location = Some(self.loc(&tok).merge(&right.location().cloned().unwrap_or_default()));
            left = Expr::Binary { id, op: bin_op, left: Box::new(left), right: Box::new(right), location };
        }
        Ok(left)
    }

    fn parse_range(&mut self, allow_struct: bool) -> PResult<Expr> {
        let start_expr = self.parse_unary(allow_struct)?;
        if self.is_op(OperatorKind::DotDot) {
            let tok = self.advance();
            let inclusive = self.eat_op(OperatorKind::Eq);
            let end = self.parse_unary(allow_struct)?;
            return Ok(Expr::Range {
                id: self.ids.next_id(),
                start: Box::new(start_expr),
                end: Box::new(end),
                inclusive,
                location: Some(self.loc(&tok)),
            });
        }
        Ok(start_expr)
    }

    fn parse_unary(&mut self, allow_struct: bool) -> PResult<Expr> {
        if self.is_op(OperatorKind::Minus) || self.is_op(OperatorKind::Not) {
            let tok = self.advance();
            let op = if matches!(tok.kind, TokenKind::Operator(OperatorKind::Minus)) { UnaryOp::Neg } else { UnaryOp::Not };
            let operand = self.parse_unary(allow_struct)?;
            return Ok(Expr::Unary { id: self.ids.next_id(), op, operand: Box::new(operand), location: Some(self.loc(&tok)) });
        }
        if self.is_kw(Keyword::Move) {
            let tok = self.advance();
            let inner = self.parse_unary(allow_struct)?;
            return Ok(Expr::Move { id: self.ids.next_id(), inner: Box::new(inner), location: Some(self.loc(&tok)) });
        }
        if self.is_kw(Keyword::Await) {
            let tok = self.advance();
            let inner = self.parse_unary(allow_struct)?;
            return Ok(Expr::Await { id: self.ids.next_id(), inner: Box::new(inner), location: Some(self.loc(&tok)) });
        }
        self.parse_postfix(allow_struct)
    }

    fn parse_postfix(&mut self, allow_struct: bool) -> PResult<Expr> {
        let mut expr = self.parse_primary(allow_struct)?;
        loop {
            if self.eat_op(OperatorKind::Dot) {
                let member = self.expect_ident("member name")?;
                // `EnumName.Variant(args)`: an uppercase base identifier
                // followed directly by a call is a constructor, not a
                // method call (lowercase receivers are always methods).
                let enum_qualifier = match &expr {
                    Expr::Identifier { name, .. } if name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) => Some(name.clone()),
                    _ => None,
                };
                if self.is_op(OperatorKind::LParen) {
                    let args = self.parse_call_args()?;
                    let (callee, enum_name) = match enum_qualifier {
                        Some(name) => (Box::new(Expr::Identifier { id: self.ids.next_id(), name: member, location: None }), Some(name)),
                        None => (Box::new(Expr::Member { id: self.ids.next_id(), object: Box::new(expr), member, location: None }), None),
                    };
                    expr = Expr::Call { id: self.ids.next_id(), callee, enum_name, type_args: Vec::new(), args, location: None };
                } else {
                    expr = Expr::Member { id: self.ids.next_id(), object: Box::new(expr), member, location: None };
                }
            } else if self.is_op(OperatorKind::ColonColon) {
                // `EnumName::Variant(args)` or `EnumName::<T>(args)` call qualification.
                self.advance();
                let enum_name = match &expr {
                    Expr::Identifier { name, .. } => Some(name.clone()),
                    _ => None,
                };
                let variant = self.expect_ident("qualified name")?;
                let type_args = self.parse_optional_type_args()?;
                if self.is_op(OperatorKind::LParen) {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        id: self.ids.next_id(),
                        callee: Box::new(Expr::Identifier { id: self.ids.next_id(), name: variant, location: None }),
                        enum_name,
                        type_args,
                        args,
                        location: None,
                    };
                } else {
                    expr = Expr::Identifier { id: self.ids.next_id(), name: variant, location: None };
                }
            } else if self.is_op(OperatorKind::LParen) {
                let args = self.parse_call_args()?;
                expr = Expr::Call { id: self.ids.next_id(), callee: Box::new(expr), enum_name: None, type_args: Vec::new(), args, location: None };
            } else if self.is_op(OperatorKind::LBracket) {
                self.advance();
                let index = self.parse_expr()?;
                self.expect_op(OperatorKind::RBracket, "`]`")?;
                expr = Expr::Index { id: self.ids.next_id(), object: Box::new(expr), index: Box::new(index), location: None };
            } else if self.is_op(OperatorKind::Question) {
                self.advance();
                expr = Expr::Try { id: self.ids.next_id(), inner: Box::new(expr), location: None };
            } else if allow_struct && self.is_op(OperatorKind::LBrace) {
                if let Expr::Identifier { name, .. } = &expr {
                    let name = name.clone();
                    expr = self.parse_struct_literal_tail(name)?;
                } else {
                    break;
                }
            } else if self.is_kw(Keyword::Is) {
                self.advance();
                let pattern = self.parse_pattern()?;
                expr = Expr::Is { id: self.ids.next_id(), scrutinee: Box::new(expr), pattern, location: None };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_optional_type_args(&mut self) -> PResult<Vec<TypeExpr>> {
        if self.eat_op(OperatorKind::Lt) {
            let mut args = Vec::new();
            while !self.is_op(OperatorKind::Gt) {
                args.push(self.parse_type()?);
                if !self.eat_op(OperatorKind::Comma) {
                    break;
                }
            }
            self.expect_op(OperatorKind::Gt, "`>`")?;
            Ok(args)
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        self.expect_op(OperatorKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.is_op(OperatorKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RParen, "`)`")?;
        Ok(args)
    }

    fn parse_struct_literal_tail(&mut self, name: String) -> PResult<Expr> {
        self.expect_op(OperatorKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.is_op(OperatorKind::RBrace) {
            let fname = self.expect_ident("field name")?;
            self.expect_op(OperatorKind::Colon, "`:`")?;
            let value = self.parse_expr()?;
            fields.push((fname, value));
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RBrace, "`}`")?;
        Ok(Expr::StructLiteral { id: self.ids.next_id(), name, fields, location: None })
    }

    fn parse_primary(&mut self, allow_struct: bool) -> PResult<Expr> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Number => {
                self.advance();
                let value = tok.lexeme.parse::<i64>().unwrap_or(0);
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::Number(value), location: Some(self.loc(&tok)) })
            }
            TokenKind::Float => {
                self.advance();
                let value = tok.lexeme.parse::<f64>().unwrap_or(0.0);
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::Float(value), location: Some(self.loc(&tok)) })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::String(tok.lexeme.clone()), location: Some(self.loc(&tok)) })
            }
            TokenKind::RawString => {
                self.advance();
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::String(tok.lexeme.clone()), location: Some(self.loc(&tok)) })
            }
            TokenKind::InterpolatedString => {
                self.advance();
                Ok(Expr::InterpolatedString { id: self.ids.next_id(), segments: Self::split_interpolation(&tok.lexeme, &mut self.ids), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::Boolean(true), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal { id: self.ids.next_id(), value: Literal::Boolean(false), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::SelfLower) => {
                self.advance();
                Ok(Expr::Identifier { id: self.ids.next_id(), name: "self".to_string(), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::Try) => {
                self.advance();
                let inner = self.parse_unary(allow_struct)?;
                Ok(Expr::Try { id: self.ids.next_id(), inner: Box::new(inner), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::Match) => self.parse_match_expr(),
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier { id: self.ids.next_id(), name: tok.lexeme.clone(), location: Some(self.loc(&tok)) })
            }
            TokenKind::Operator(OperatorKind::Pipe) => self.parse_lambda(),
            TokenKind::Operator(OperatorKind::OrOr) => {
                // `||` lexed as one token when a lambda takes no parameters.
                self.advance();
                let body = Box::new(self.parse_expr()?);
                Ok(Expr::Lambda { id: self.ids.next_id(), params: Vec::new(), body, location: Some(self.loc(&tok)) })
            }
            TokenKind::Operator(OperatorKind::LParen) => self.parse_paren_or_tuple(),
            TokenKind::Operator(OperatorKind::LBracket) => self.parse_array_literal(),
            TokenKind::Operator(OperatorKind::LBrace) => {
                let stmts = self.parse_block()?;
                Ok(Expr::Block { id: self.ids.next_id(), stmts, location: Some(self.loc(&tok)) })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn split_interpolation(lexeme: &str, ids: &mut NodeIdAllocator) -> Vec<StringSegment> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = lexeme.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();
                if !text.is_empty() {
                    segments.push(StringSegment::Text(std::mem::take(&mut text)));
                }
                let mut inner = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    inner.push(c);
                }
                let id = ids.next_id();
                segments.push(StringSegment::Expr(Box::new(Expr::Identifier { id, name: inner.trim().to_string(), location: None })));
            } else {
                text.push(c);
            }
        }
        if !text.is_empty() {
            segments.push(StringSegment::Text(text));
        }
        segments
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        let start = self.advance(); // `|`
        let mut params = Vec::new();
        while !self.is_op(OperatorKind::Pipe) {
            params.push(self.expect_ident("lambda parameter")?);
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::Pipe, "`|` to close lambda parameters")?;
        let body = Box::new(self.parse_expr()?);
        Ok(Expr::Lambda { id: self.ids.next_id(), params, body, location: Some(self.loc(&start)) })
    }

    fn parse_paren_or_tuple(&mut self) -> PResult<Expr> {
        let start = self.advance(); // `(`
        if self.eat_op(OperatorKind::RParen) {
            return Ok(Expr::Tuple { id: self.ids.next_id(), elems: Vec::new(), location: Some(self.loc(&start)) });
        }
        let first = self.parse_expr()?;
        if self.eat_op(OperatorKind::Comma) {
            let mut elems = vec![first];
            while !self.is_op(OperatorKind::RParen) {
                elems.push(self.parse_expr()?);
                if !self.eat_op(OperatorKind::Comma) {
                    break;
                }
            }
            self.expect_op(OperatorKind::RParen, "`)`")?;
            return Ok(Expr::Tuple { id: self.ids.next_id(), elems, location: Some(self.loc(&start)) });
        }
        self.expect_op(OperatorKind::RParen, "`)`")?;
        Ok(first)
    }

    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let start = self.advance(); // `[`
        let mut elems = Vec::new();
        while !self.is_op(OperatorKind::RBracket) {
            elems.push(self.parse_expr()?);
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RBracket, "`]`")?;
        Ok(Expr::ArrayLiteral { id: self.ids.next_id(), elems, location: Some(self.loc(&start)) })
    }

    fn parse_match_expr(&mut self) -> PResult<Expr> {
        let start = self.advance(); // `match`
        let scrutinee = self.parse_expr_no_struct()?;
        let arms = self.parse_match_arms()?;
        Ok(Expr::Match { id: self.ids.next_id(), scrutinee: Box::new(scrutinee), arms, location: Some(self.loc(&start)) })
    }

    // ---- patterns ----

    pub fn parse_pattern(&mut self) -> PResult<Pattern> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Identifier if tok.lexeme == "_" => {
                self.advance();
                Ok(Pattern::Wildcard { id: self.ids.next_id(), location: Some(self.loc(&tok)) })
            }
            TokenKind::Number => {
                self.advance();
                Ok(Pattern::Literal { id: self.ids.next_id(), value: Literal::Number(tok.lexeme.parse().unwrap_or(0)), location: Some(self.loc(&tok)) })
            }
            TokenKind::String => {
                self.advance();
                Ok(Pattern::Literal { id: self.ids.next_id(), value: Literal::String(tok.lexeme.clone()), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Pattern::Literal { id: self.ids.next_id(), value: Literal::Boolean(true), location: Some(self.loc(&tok)) })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Pattern::Literal { id: self.ids.next_id(), value: Literal::Boolean(false), location: Some(self.loc(&tok)) })
            }
            TokenKind::Operator(OperatorKind::LParen) => {
                self.advance();
                let mut elems = Vec::new();
                while !self.is_op(OperatorKind::RParen) {
                    elems.push(self.parse_pattern()?);
                    if !self.eat_op(OperatorKind::Comma) {
                        break;
                    }
                }
                self.expect_op(OperatorKind::RParen, "`)`")?;
                Ok(Pattern::Tuple { id: self.ids.next_id(), elems, location: Some(self.loc(&tok)) })
            }
            TokenKind::Identifier => {
                self.advance();
                let first = tok.lexeme.clone();
                if self.eat_op(OperatorKind::Dot) || self.eat_op(OperatorKind::ColonColon) {
                    let variant = self.expect_ident("variant name")?;
                    let bindings = self.parse_pattern_bindings()?;
                    return Ok(Pattern::Enum { id: self.ids.next_id(), enum_name: Some(first), variant, bindings, location: Some(self.loc(&tok)) });
                }
                if self.is_op(OperatorKind::LParen) {
                    let bindings = self.parse_pattern_bindings()?;
                    return Ok(Pattern::Enum { id: self.ids.next_id(), enum_name: None, variant: first, bindings, location: Some(self.loc(&tok)) });
                }
                if self.is_op(OperatorKind::LBrace) {
                    self.advance();
                    let mut fields = Vec::new();
                    while !self.is_op(OperatorKind::RBrace) {
                        let fname = self.expect_ident("field name")?;
                        let pat = if self.eat_op(OperatorKind::Colon) { self.parse_pattern()? } else { Pattern::Binding { id: self.ids.next_id(), name: fname.clone(), location: None } };
                        fields.push((fname, pat));
                        if !self.eat_op(OperatorKind::Comma) {
                            break;
                        }
                    }
                    self.expect_op(OperatorKind::RBrace, "`}`")?;
                    return Ok(Pattern::Struct { id: self.ids.next_id(), name: first, fields, location: Some(self.loc(&tok)) });
                }
                Ok(Pattern::Binding { id: self.ids.next_id(), name: first, location: Some(self.loc(&tok)) })
            }
            _ => Err(self.unexpected("a pattern")),
        }
    }

    fn parse_pattern_bindings(&mut self) -> PResult<Vec<Pattern>> {
        self.expect_op(OperatorKind::LParen, "`(`")?;
        let mut bindings = Vec::new();
        while !self.is_op(OperatorKind::RParen) {
            bindings.push(self.parse_pattern()?);
            if !self.eat_op(OperatorKind::Comma) {
                break;
            }
        }
        self.expect_op(OperatorKind::RParen, "`)`")?;
        Ok(bindings)
    }

    // ---- type expressions ----

    pub fn parse_type(&mut self) -> PResult<TypeExpr> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Identifier if tok.lexeme == "_" => {
                self.advance();
                Ok(TypeExpr::Hole { id: self.ids.next_id(), location: Some(self.loc(&tok)) })
            }
            TokenKind::Identifier => {
                self.advance();
                let name = tok.lexeme.clone();
                let type_args = self.parse_optional_type_args()?;
                Ok(TypeExpr::Named { id: self.ids.next_id(), name, type_args, location: Some(self.loc(&tok)) })
            }
            TokenKind::Operator(OperatorKind::LParen) => {
                self.advance();
                let mut elems = Vec::new();
                while !self.is_op(OperatorKind::RParen) {
                    elems.push(self.parse_type()?);
                    if !self.eat_op(OperatorKind::Comma) {
                        break;
                    }
                }
                self.expect_op(OperatorKind::RParen, "`)`")?;
                if self.eat_op(OperatorKind::Arrow) {
                    let ret = Box::new(self.parse_type()?);
                    return Ok(TypeExpr::Function { id: self.ids.next_id(), params: elems, ret, location: Some(self.loc(&tok)) });
                }
                Ok(TypeExpr::Tuple { id: self.ids.next_id(), elems, location: Some(self.loc(&tok)) })
            }
            TokenKind::Operator(OperatorKind::LBracket) => {
                self.advance();
                let elem = Box::new(self.parse_type()?);
                self.expect_op(OperatorKind::Semicolon, "`;`")?;
                let size = self.parse_const_expr()?;
                self.expect_op(OperatorKind::RBracket, "`]`")?;
                Ok(TypeExpr::Array { id: self.ids.next_id(), elem, size, location: Some(self.loc(&tok)) })
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_const_expr(&mut self) -> PResult<ConstExpr> {
        let left = self.parse_const_atom()?;
        if let TokenKind::Operator(op) = self.peek_kind() {
            let cop = match op {
                OperatorKind::Plus => Some(ConstBinOp::Add),
                OperatorKind::Minus => Some(ConstBinOp::Sub),
                OperatorKind::Star => Some(ConstBinOp::Mul),
                OperatorKind::Slash => Some(ConstBinOp::Div),
                _ => None,
            };
            if let Some(cop) = cop {
                self.advance();
                let right = self.parse_const_expr()?;
                return Ok(ConstExpr::Binary { op: cop, left: Box::new(left), right: Box::new(right) });
            }
        }
        Ok(left)
    }

    fn parse_const_atom(&mut self) -> PResult<ConstExpr> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Number => {
                self.advance();
                Ok(ConstExpr::Literal(tok.lexeme.parse().unwrap_or(0)))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(ConstExpr::Param(tok.lexeme.clone()))
            }
            _ => Err(self.unexpected("a const expression")),
        }
    }
}

pub enum ParseOutput {
    Program(Program),
    Expr(Expr),
    Stmt(Stmt),
    Pattern(Pattern),
    Type(TypeExpr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let mut p = Parser::new("fn add(a: i32, b: i32) -> i32 { a + b }");
        let program = p.parse_program().unwrap();
        assert_eq!(program.body.len(), 1);
        assert!(matches!(&program.body[0], Stmt::FnDecl(d) if d.name == "add"));
    }

    #[test]
    fn reports_missing_semicolon_between_statements() {
        let mut p = Parser::new("fn f() -> i32 { let x = 1 return x; }");
        let program = p.parse_program().unwrap();
        assert_eq!(program.body.len(), 1);
        let lints = p.take_lints();
        assert_eq!(lints.iter().filter(|d| d.code == "MISSING_SEMICOLON").count(), 1);
    }

    #[test]
    fn trailing_block_expression_needs_no_semicolon() {
        let mut p = Parser::new("fn f() -> i32 { 0 }");
        p.parse_program().unwrap();
        assert!(p.take_lints().is_empty());
    }

    #[test]
    fn parses_match_exhaustiveness_example() {
        let src = "enum Option { Some(i32), None }\nfn f(o: Option) -> i32 { match o { Option.Some(v) => v } }";
        let mut p = Parser::new(src);
        let program = p.parse_program().unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn parses_loop_mutation_example() {
        let src = "fn main() -> i32 { let mut count = 0; while count < 5 { count = count + 1; } count }";
        let mut p = Parser::new(src);
        let program = p.parse_program().unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_generic_function_with_bound() {
        let src = "fn print_one<T: Printable>(x: T) -> void { x.print(); }";
        let mut p = Parser::new(src);
        let program = p.parse_program().unwrap();
        match &program.body[0] {
            Stmt::FnDecl(d) => {
                assert_eq!(d.type_params.len(), 1);
                assert_eq!(d.type_params[0].bounds, vec!["Printable".to_string()]);
            }
            _ => panic!("expected fn decl"),
        }
    }

    #[test]
    fn parses_const_generic_array_type() {
        let src = "fn f(xs: [i32; 4]) -> i32 { 0 }";
        let mut p = Parser::new(src);
        let program = p.parse_program().unwrap();
        match &program.body[0] {
            Stmt::FnDecl(d) => assert!(matches!(&d.params[0].ty, Some(TypeExpr::Array { .. }))),
            _ => panic!("expected fn decl"),
        }
    }

    #[test]
    fn parses_lambda_expression() {
        let mut p = Parser::new("let f = |x, y| x + y;");
        let program = p.parse_program().unwrap();
        match &program.body[0] {
            Stmt::Let { value: Expr::Lambda { params, .. }, .. } => assert_eq!(params, &vec!["x".to_string(), "y".to_string()]),
            other => panic!("expected let-bound lambda, got {:?}", other),
        }
    }

    #[test]
    fn syntax_error_is_structured_not_thrown() {
        let mut p = Parser::new("fn (");
        let err = p.parse_program().unwrap_err();
        assert!(err.location.start.line >= 1);
    }
}
