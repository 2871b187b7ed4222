//! Error taxonomy for the analysis core.
//!
//! `InvalidInput`, `NotFound`, `Cancelled` are caller-facing and bubble up
//! intact. `UnsupportedLanguage` and `ResourceExceeded` are caller-facing
//! on `analyze_file` but become error `FileAnalysis` records when raised
//! during a codebase batch.
//! `ParsePartial`, `DegradedSidecar`, `CacheUnavailable`, and `PersistFailed`
//! are always locally recovered and never fail the overall operation.

use std::fmt;
use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodelensError>;

/// The error taxonomy of the analysis core.
#[derive(Debug, thiserror::Error)]
pub enum CodelensError {
    /// Empty or malformed caller arguments (empty codebase_id, empty path).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was invalid.
        message: String,
    },

    /// Path does not exist, or a codebase was never scanned.
    #[error("not found: {what}")]
    NotFound {
        /// What was not found (a path or a codebase id).
        what: String,
    },

    /// File extension has no registered language adapter.
    #[error("unsupported language for {path}")]
    UnsupportedLanguage {
        /// The file path whose extension is unmapped.
        path: String,
    },

    /// A configured resource bound was exceeded (file size, parse timeout).
    #[error("resource exceeded for {path}: {reason}")]
    ResourceExceeded {
        /// The file the bound applies to.
        path: String,
        /// Which bound was exceeded.
        reason: String,
    },

    /// A parse tree was produced but contains error/missing nodes.
    #[error("partial parse for {path}: {error_count} error node(s)")]
    ParsePartial {
        /// The file that parsed with errors.
        path: String,
        /// Number of error/missing nodes collected.
        error_count: usize,
    },

    /// The linter sidecar failed, timed out, or was missing.
    #[error("linter sidecar degraded for {path}: {reason}")]
    DegradedSidecar {
        /// The file the linter was invoked for.
        path: String,
        /// Why the sidecar degraded.
        reason: String,
    },

    /// A cache tier (2 or 3) failed to read or write.
    #[error("cache tier {tier} unavailable: {reason}")]
    CacheUnavailable {
        /// Which tier (2 or 3) failed.
        tier: u8,
        /// Underlying reason.
        reason: String,
    },

    /// A write to the persistence store failed.
    #[error("persistence write failed for {what}: {reason}")]
    PersistFailed {
        /// What failed to persist (a codebase id or file key).
        what: String,
        /// Underlying reason.
        reason: String,
    },

    /// Cooperative cancellation was observed at a task boundary.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A parser-level failure not otherwise classified above.
    #[error("parse error ({language}): {message}")]
    Parse {
        /// Language key the parser was invoked for.
        language: String,
        /// Description of the failure.
        message: String,
    },

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An invariant was violated internally; indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodelensError {
    /// Build an [`CodelensError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Build a [`CodelensError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Build an [`CodelensError::UnsupportedLanguage`].
    pub fn unsupported_language(path: impl Into<String>) -> Self {
        Self::UnsupportedLanguage { path: path.into() }
    }

    /// Build a [`CodelensError::ResourceExceeded`].
    pub fn resource_exceeded(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceExceeded {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`CodelensError::ParsePartial`].
    pub fn parse_partial(path: impl Into<String>, error_count: usize) -> Self {
        Self::ParsePartial {
            path: path.into(),
            error_count,
        }
    }

    /// Build a [`CodelensError::DegradedSidecar`].
    pub fn degraded_sidecar(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegradedSidecar {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`CodelensError::CacheUnavailable`].
    pub fn cache_unavailable(tier: u8, reason: impl Into<String>) -> Self {
        Self::CacheUnavailable {
            tier,
            reason: reason.into(),
        }
    }

    /// Build a [`CodelensError::PersistFailed`].
    pub fn persist_failed(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PersistFailed {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`CodelensError::Parse`].
    pub fn parse(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Build a [`CodelensError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attach additional context, preserving the original message.
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        match self {
            Self::Internal(msg) => Self::Internal(format!("{context}: {msg}")),
            other => Self::Internal(format!("{context}: {other}")),
        }
    }

    /// True for the taxonomy entries that are always locally recovered
    /// and must never fail the overall operation.
    pub fn is_locally_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ParsePartial { .. }
                | Self::DegradedSidecar { .. }
                | Self::CacheUnavailable { .. }
                | Self::PersistFailed { .. }
        )
    }
}

impl From<serde_json::Error> for CodelensError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for CodelensError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Context-chaining helper, mirroring `anyhow`'s `.context()` but producing
/// a [`CodelensError`].
pub trait ResultExt<T> {
    /// Wrap an error with additional context if the result is `Err`.
    fn context(self, context: impl fmt::Display) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CodelensError>,
{
    fn context(self, context: impl fmt::Display) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locally_recoverable_classification() {
        assert!(CodelensError::parse_partial("a.py", 2).is_locally_recoverable());
        assert!(CodelensError::cache_unavailable(2, "timeout").is_locally_recoverable());
        assert!(!CodelensError::not_found("x").is_locally_recoverable());
        assert!(!CodelensError::invalid_input("empty path").is_locally_recoverable());
    }

    #[test]
    fn context_chaining_preserves_message() {
        let err: Result<()> = Err(CodelensError::internal("boom"));
        let wrapped = err.context("while analyzing a.py").unwrap_err();
        assert!(wrapped.to_string().contains("while analyzing a.py"));
        assert!(wrapped.to_string().contains("boom"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: CodelensError = io_err.into();
        assert!(matches!(err, CodelensError::Io(_)));
    }
}
