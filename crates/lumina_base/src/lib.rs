#![cfg_attr(docsrs, feature(doc_cfg))]

//! # lumina-base
//!
//! Pure structural atoms for the lumina compiler toolchain.
//!
//! This crate provides the foundational types shared by every later phase:
//!
//! - [`Span`] — Source location tracking
//! - [`Diagnostic`]/[`Severity`] — The shared diagnostic record (spec §3, §7)
//! - [`SpannedError`]/[`Result`] — A minimal positioned error for call sites
//!   that don't yet have a full `Diagnostic` in hand, convertible into one
//!
//! # Design Principles
//!
//! This crate has **no knowledge of the source grammar or I/O**. It provides
//! only generic, reusable infrastructure that the lexer, parser, inference
//! engine, and code generators build upon.
//!
//! # Example
//!
//! ```
//! use lumina_base::{Diagnostic, Span, SpannedError};
//!
//! let span = Span::new(0, 5);
//! assert!(span.contains(3));
//!
//! let err = SpannedError::new("unexpected token", span, 1, 1);
//! let diagnostic: Diagnostic = err.into();
//! assert!(diagnostic.is_error());
//! ```

pub mod diagnostic;
pub mod error;
pub mod span;

pub use diagnostic::{Diagnostic, FileLocation, RelatedInformation, Severity};
pub use error::{Result, SpannedError};
pub use span::Span;
