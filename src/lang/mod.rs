//! Parser Front-End: extension dispatch, lazily-cached
//! per-language parsers, size/time-bounded parsing, and error-node
//! collection on partial trees.

pub mod registry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tree_sitter::{Node, Parser, Tree};

pub use registry::{profile_for_key, profile_for_path, LanguageProfile};

use crate::core::errors::{CodelensError, Result};

/// The outcome of parsing one file (`ParseResult`). Lifetime: only
/// until the extractors complete; never cached or persisted itself.
pub struct ParseResult {
    /// Path the source came from (or the notebook's virtual path).
    pub file_path: String,
    /// Canonical language key the file was parsed as.
    pub language: String,
    /// The parsed tree.
    pub tree: Tree,
    /// The raw source text the tree was parsed from.
    pub source: String,
    /// Whether the tree contains any error or missing nodes.
    pub has_errors: bool,
    /// Byte ranges of error/missing nodes, collected by recursive
    /// traversal, in tree order.
    pub error_ranges: Vec<(usize, usize)>,
    /// Wall-clock milliseconds the parse call itself took.
    pub parse_time_ms: u64,
}

impl ParseResult {
    /// The tree's root node.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// One parser instance per language, reused across calls. Tree-sitter
/// parsers are cheap to reset but not `Sync`-shareable mid-parse, so each
/// language gets a mutex: one cached parser per language, guarded rather
/// than pooled, since tree-sitter parsers reset cheaply between calls.
static PARSERS: Lazy<DashMap<&'static str, Arc<Mutex<Parser>>>> = Lazy::new(DashMap::new);

fn parser_for(profile: &'static LanguageProfile) -> Result<Arc<Mutex<Parser>>> {
    if let Some(existing) = PARSERS.get(profile.key) {
        return Ok(existing.clone());
    }
    let mut parser = Parser::new();
    parser
        .set_language(&(profile.language)())
        .map_err(|e| CodelensError::parse(profile.key, format!("failed to set grammar: {e:?}")))?;
    let arc = Arc::new(Mutex::new(parser));
    PARSERS.insert(profile.key, arc.clone());
    Ok(arc)
}

/// Recursively collect error/missing node byte ranges.
fn collect_error_ranges(node: Node, out: &mut Vec<(usize, usize)>) {
    if node.is_error() || node.is_missing() {
        out.push((node.start_byte(), node.end_byte()));
        // Do not descend into an error subtree's children individually;
        // the whole subtree is already accounted for as one error range,
        // but siblings elsewhere in the tree still need visiting.
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_ranges(child, out);
    }
}

/// Parse a file whose language is already known and whose content is
/// already in memory (used directly by the [`crate::notebook`] adapter and
/// indirectly by [`parse_file`]).
///
/// `max_bytes` and `timeout` enforce the `FileTooLarge` and
/// `ParseTimeout` bounds.
pub async fn parse_source(
    file_path: impl Into<String>,
    language_key: &str,
    source: String,
    max_bytes: u64,
    timeout: Duration,
) -> Result<ParseResult> {
    let file_path = file_path.into();
    if source.len() as u64 > max_bytes {
        return Err(CodelensError::resource_exceeded(
            &file_path,
            format!("file exceeds {max_bytes} byte limit"),
        ));
    }
    let profile = profile_for_key(language_key)
        .ok_or_else(|| CodelensError::unsupported_language(&file_path))?;
    let parser_handle = parser_for(profile)?;
    let language = profile.key.to_string();

    let parse_fut = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let mut parser = parser_handle.lock();
        let tree = parser.parse(&source, None);
        (tree, source, started.elapsed())
    });

    let (tree_opt, source, elapsed) = tokio::time::timeout(timeout, parse_fut)
        .await
        .map_err(|_| CodelensError::resource_exceeded(&file_path, "parse timed out"))?
        .map_err(|e| CodelensError::internal(format!("parse task panicked: {e}")))?;

    let tree = tree_opt.ok_or_else(|| CodelensError::parse(&language, "parser produced no tree"))?;

    let mut error_ranges = Vec::new();
    collect_error_ranges(tree.root_node(), &mut error_ranges);

    Ok(ParseResult {
        file_path,
        language,
        has_errors: !error_ranges.is_empty(),
        error_ranges,
        tree,
        source,
        parse_time_ms: elapsed.as_millis() as u64,
    })
}

/// Parse a file from disk by dispatching on its extension
/// (`parse_file(path) -> ParseResult`).
pub async fn parse_file(path: &str, max_bytes: u64, timeout: Duration) -> Result<ParseResult> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| CodelensError::not_found(path))?;
    if metadata.len() > max_bytes {
        return Err(CodelensError::resource_exceeded(
            path,
            format!("file exceeds {max_bytes} byte limit"),
        ));
    }
    let language = registry::language_key_for_path(path)
        .ok_or_else(|| CodelensError::unsupported_language(path))?;
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(CodelensError::from)?;
    parse_source(path.to_string(), language, source, max_bytes, timeout).await
}

/// Count of distinct languages currently holding a cached parser; exposed
/// for diagnostics/tests rather than any analyzer.
pub fn cached_parser_languages() -> HashMap<&'static str, ()> {
    PARSERS.iter().map(|entry| (*entry.key(), ())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_simple_python() {
        let result = parse_source(
            "calc.py",
            "python",
            "def add(a, b):\n    return a + b\n".to_string(),
            10 * 1024 * 1024,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(!result.has_errors);
        assert_eq!(result.language, "python");
    }

    #[tokio::test]
    async fn flags_error_nodes_on_broken_source() {
        let result = parse_source(
            "broken.py",
            "python",
            "def broken(:\n".to_string(),
            10 * 1024 * 1024,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(result.has_errors);
        assert!(!result.error_ranges.is_empty());
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let err = parse_file("file.xyz", 10 * 1024 * 1024, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CodelensError::NotFound { .. } | CodelensError::UnsupportedLanguage { .. }));
    }

    #[tokio::test]
    async fn rejects_oversized_source() {
        let err = parse_source(
            "big.py",
            "python",
            "x = 1\n".repeat(1000),
            10,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CodelensError::ResourceExceeded { .. }));
    }
}
