//! Linter sidecar seam: an external,
//! best-effort source of [`LinterIssue`]s merged into a [`FileAnalysis`]
//! before a short deadline. This crate defines the trait boundary only; a
//! real linter integration (ESLint, ruff, clippy, ...) is an external
//! collaborator's job, not this crate's.

use crate::core::errors::Result;
use crate::model::LinterIssue;

/// A pluggable source of lint findings for one file.
#[async_trait::async_trait]
pub trait LinterSidecar: Send + Sync {
    /// Run (or simulate running) a linter over `content` and return its
    /// findings. Implementations should respect `deadline` themselves where
    /// possible; the orchestrator additionally races this call against its
    /// own timeout and treats a miss as [`crate::core::errors::CodelensError::degraded_sidecar`],
    /// never a hard failure.
    async fn lint(&self, file_path: &str, content: &str, language: &str) -> Result<Vec<LinterIssue>>;
}

/// The default sidecar: always succeeds with no findings. Used when
/// `enable_linters` is false, or as a placeholder until a real collaborator
/// is wired in.
pub struct NoopLinter;

#[async_trait::async_trait]
impl LinterSidecar for NoopLinter {
    async fn lint(&self, _file_path: &str, _content: &str, _language: &str) -> Result<Vec<LinterIssue>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_linter_returns_no_findings() {
        let issues = NoopLinter.lint("a.py", "x = 1\n", "python").await.unwrap();
        assert!(issues.is_empty());
    }
}
