//! `codelens` — a multi-language code analysis core.
//!
//! Parses source files in any of ten languages, extracts symbol tables,
//! complexity and documentation metrics, detects architectural patterns,
//! resolves a dependency graph, and caches/persists the results. The RPC
//! transport, configuration loading, workspace scanning, and course
//! generation that sit in front of this crate are external collaborators;
//! see [`scanner`] and [`linter`] for the trait seams they plug into.

#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

pub mod cache;
pub mod deps;
pub mod extract;
pub mod lang;
pub mod linter;
pub mod model;
pub mod notebook;
pub mod orchestrator;
pub mod patterns;
pub mod persistence;
pub mod scanner;
pub mod scoring;

pub mod core {
    //! Ambient stack: errors and configuration.
    pub mod config;
    pub mod errors;
}

pub use core::config::CodelensConfig;
pub use core::errors::{CodelensError, Result, ResultExt};
pub use model::{CodebaseAnalysis, FileAnalysis};
pub use orchestrator::Orchestrator;

/// Crate version, as reported to callers that want to stamp analyses.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version for persisted/cached records. Bumped whenever a
/// [`model`] record's shape changes in a way that invalidates prior
/// incremental-reuse decisions: `analyze_codebase`'s incremental reuse
/// requires the previous record's schema version to match.
pub const SCHEMA_VERSION: u32 = 1;
