//! # lumina-project
//!
//! The incremental, multi-file project context (spec §4.10): tracked
//! documents, the import dependency graph, signature/body-hash based
//! incremental reuse, import resolution (relative, `@std/*`, and
//! lockfile-backed bare specifiers), and the on-disk build cache
//! (spec §6.2-§6.4).

pub mod cache;
pub mod config;
pub mod context;
pub mod document;
pub mod graph;
pub mod lockfile;
pub mod resolve;
pub mod signature;

pub use cache::{Cache, DepsCache, FileDeps, SourceCacheEntry};
pub use config::{ConfigError, ProjectConfig, Target};
pub use context::{AddOrUpdateResult, ProjectContext};
pub use document::{Document, ParseChange};
pub use graph::DependencyGraph;
pub use lockfile::{find_lockfile, Lockfile, LockfileError, LuminaExports, PackageEntry};
pub use resolve::{resolve_import, ResolveError};
pub use signature::{body_hash, signature_of};
