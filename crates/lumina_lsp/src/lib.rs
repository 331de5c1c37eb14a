#![cfg_attr(docsrs, feature(doc_cfg))]

//! # lumina-lsp
//!
//! Language Server Protocol implementation for the lumina language,
//! built on `tower-lsp`. Each document is lexed, parsed with panic-mode
//! recovery, semantically analyzed, and type-inferred in full on every
//! change; there is no incremental re-analysis at this layer (that lives
//! in `lumina-project` for the multi-file case) and no cross-document
//! type information — each open document is its own self-contained
//! analysis.
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | Diagnostics | Syntax and semantic errors, positioned via [`line_index`] |
//! | Hover | Inferred types and declaration signatures |
//! | Semantic tokens | Syntax highlighting keyed off the lexer's token stream |
//! | Go to definition / Find references | Single-document symbol resolution |
//! | Document / workspace symbols | Outline view and cross-document symbol search |
//! | Rename | Definition- and reference-consistent symbol renaming |
//! | Code actions | Diagnostic-driven quick fixes |
//! | Completion | Previous-token-dispatch keyword/identifier/type suggestions |
//! | Signature help | Parameter hints while inside a call's argument list |
//! | Inlay hints | Inferred types for untyped `let` bindings |
//!
//! ## Modules
//!
//! - [`server`] - the `tower-lsp` `LanguageServer` implementation
//! - [`state`] - open-document tracking, keyed by URI
//! - [`document`] - per-document analysis state, rebuilt on every edit
//! - [`pipeline`] - lex → parse → analyze → infer, run over one document's text
//! - [`index`] - AST-derived symbol index (definitions, references)
//! - [`line_index`] - byte offset ⟷ LSP `Position` conversion
//!
//! Feature modules ([`hover`], [`completion`], [`definition`],
//! [`references`], [`rename`], [`code_actions`], [`signature_help`],
//! [`inlay_hints`], [`semantic_tokens`], [`document_symbols`]) are pure
//! functions over a `DocumentState`, independent of the `tower-lsp`
//! transport — each is directly unit-testable.

pub mod code_actions;
pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod document;
pub mod document_symbols;
pub mod hover;
pub mod index;
pub mod inlay_hints;
pub mod line_index;
pub mod pipeline;
pub mod references;
pub mod rename;
pub mod semantic_tokens;
pub mod server;
pub mod signature_help;
pub mod state;
