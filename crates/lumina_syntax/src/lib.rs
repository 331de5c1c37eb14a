//! # lumina-syntax
//!
//! Lexing, PEG grammar compilation, parsing, and the typed AST for the
//! lumina language (spec §3, §4.1–§4.3).
//!
//! The pipeline is: [`lexer::Lexer`] tokenizes source text into a flat
//! [`Token`] stream, [`parser::Parser`] consumes that stream into the typed
//! AST in [`ast`], and [`recovery::parse_with_recovery`] wraps the parser so
//! a malformed file still yields a best-effort AST plus diagnostics instead
//! of aborting. [`grammar`] compiles the PEG-style grammar description
//! separately, for tooling and validation rather than on the parser's hot
//! path.

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod recovery;
pub mod token;

pub use ast::{Program, Stmt};
pub use grammar::{CompileOptions, CompiledGrammar, GrammarCompileError, GrammarCompiler};
pub use lexer::{Lexer, LexerOptions};
pub use parser::{ParseError, ParseOutput, Parser};
pub use recovery::{parse_with_recovery, RecoveringParseResult};
pub use token::{SourceLocation, Token, TokenKind};
