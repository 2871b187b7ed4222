//! Scanner collaborator seam: resolves a
//! `codebase_id` to the list of file paths that make up that codebase.
//! Real directory walking/ignore-file handling (`.gitignore`, VCS
//! metadata) is an external collaborator's job; this crate only
//! defines the trait boundary and an in-memory reference implementation
//! useful for tests and simple embeddings, the same trait-boundary shape
//! used for [`crate::linter`].

use std::collections::HashMap;

use crate::core::errors::{CodelensError, Result};

/// Resolves a codebase id to its member file paths.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    /// List the file paths belonging to `codebase_id`, relative to its
    /// project root. Returns [`CodelensError::not_found`] if the codebase
    /// was never registered.
    async fn list_files(&self, codebase_id: &str) -> Result<Vec<String>>;

    /// The project root a codebase's relative paths resolve against, used
    /// by the Dependency Resolver's absolute-import resolution.
    async fn project_root(&self, codebase_id: &str) -> Result<String>;
}

/// An in-memory [`Scanner`] backed by a registration map, useful for tests
/// and small embedded uses where the caller already knows its file list.
#[derive(Debug, Default)]
pub struct StaticScanner {
    codebases: HashMap<String, (String, Vec<String>)>,
}

impl StaticScanner {
    /// Construct an empty scanner; register codebases with [`Self::register`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codebase's project root and member file list.
    pub fn register(mut self, codebase_id: impl Into<String>, project_root: impl Into<String>, files: Vec<String>) -> Self {
        self.codebases.insert(codebase_id.into(), (project_root.into(), files));
        self
    }
}

#[async_trait::async_trait]
impl Scanner for StaticScanner {
    async fn list_files(&self, codebase_id: &str) -> Result<Vec<String>> {
        self.codebases
            .get(codebase_id)
            .map(|(_, files)| files.clone())
            .ok_or_else(|| CodelensError::not_found(codebase_id))
    }

    async fn project_root(&self, codebase_id: &str) -> Result<String> {
        self.codebases
            .get(codebase_id)
            .map(|(root, _)| root.clone())
            .ok_or_else(|| CodelensError::not_found(codebase_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unregistered_codebase_is_not_found() {
        let scanner = StaticScanner::new();
        let err = scanner.list_files("ghost").await.unwrap_err();
        assert!(matches!(err, CodelensError::NotFound { .. }));
    }

    #[tokio::test]
    async fn registered_codebase_lists_its_files() {
        let scanner = StaticScanner::new().register("proj", "", vec!["a.py".to_string(), "b.py".to_string()]);
        let files = scanner.list_files("proj").await.unwrap();
        assert_eq!(files, vec!["a.py".to_string(), "b.py".to_string()]);
        assert_eq!(scanner.project_root("proj").await.unwrap(), "");
    }
}
