//! Configuration surface. `CodelensConfig` is a plain data type
//! the transport layer constructs and hands in; binding it from environment
//! variables or CLI flags is an external collaborator's job, not this
//! crate's.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CodelensError, Result};

/// The ten supported language keys, used as the default for
/// `supported_languages`.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "python", "javascript", "typescript", "java", "go", "rust", "cpp", "csharp", "ruby", "php",
];

/// Weights for the Teaching-Value Scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingValueWeights {
    /// Weight applied to the documentation sub-score.
    pub documentation: f64,
    /// Weight applied to the complexity sub-score.
    pub complexity: f64,
    /// Weight applied to the pattern sub-score.
    pub pattern: f64,
    /// Weight applied to the structure sub-score.
    pub structure: f64,
}

impl Default for TeachingValueWeights {
    fn default() -> Self {
        Self {
            documentation: 0.30,
            complexity: 0.25,
            pattern: 0.25,
            structure: 0.20,
        }
    }
}

/// Recognized configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodelensConfig {
    /// Maximum file size, in megabytes, the parser will attempt.
    pub max_file_size_mb: u64,
    /// Maximum wall-clock seconds a single parse is allowed to run.
    pub parse_timeout_s: u64,
    /// Maximum number of files analyzed concurrently during a codebase run.
    pub max_parallel_files: usize,
    /// Language keys this configuration recognizes.
    pub supported_languages: Vec<String>,
    /// Complexity above which a function is classified `high`.
    pub max_complexity_threshold: u32,
    /// Complexity below which a function is classified `trivial`.
    pub min_complexity_threshold: u32,
    /// Minimum acceptable documentation coverage (informational threshold;
    /// not enforced by this crate, surfaced for downstream consumers).
    pub min_documentation_coverage: f64,
    /// Teaching-value component weights.
    pub teaching_value_weights: TeachingValueWeights,
    /// Tier 1 cache byte budget, in megabytes.
    pub memory_cache_max_mb: u64,
    /// Default TTL, in seconds, for cache entries.
    pub cache_ttl_s: u64,
    /// Root directory for the persistence store.
    pub persistence_root: PathBuf,
    /// Whether the linter sidecar is invoked at all.
    pub enable_linters: bool,
    /// Optional URL for a Tier 3 distributed cache.
    pub distributed_cache_url: Option<String>,
}

impl Default for CodelensConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            parse_timeout_s: 5,
            max_parallel_files: 10,
            supported_languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            max_complexity_threshold: 10,
            min_complexity_threshold: 2,
            min_documentation_coverage: 0.5,
            teaching_value_weights: TeachingValueWeights::default(),
            memory_cache_max_mb: 500,
            cache_ttl_s: 3600,
            persistence_root: PathBuf::from(".analysis/"),
            enable_linters: false,
            distributed_cache_url: None,
        }
    }
}

impl CodelensConfig {
    /// Construct a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `max_file_size_mb`.
    pub fn with_max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size_mb = mb;
        self
    }

    /// Override `parse_timeout_s`.
    pub fn with_parse_timeout_s(mut self, secs: u64) -> Self {
        self.parse_timeout_s = secs;
        self
    }

    /// Override `max_parallel_files`.
    pub fn with_max_parallel_files(mut self, n: usize) -> Self {
        self.max_parallel_files = n;
        self
    }

    /// Restrict the recognized language set.
    pub fn with_languages(mut self, langs: impl IntoIterator<Item = String>) -> Self {
        self.supported_languages = langs.into_iter().collect();
        self
    }

    /// Override the teaching-value weights.
    pub fn with_teaching_value_weights(mut self, weights: TeachingValueWeights) -> Self {
        self.teaching_value_weights = weights;
        self
    }

    /// Override `persistence_root`.
    pub fn with_persistence_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.persistence_root = root.into();
        self
    }

    /// Enable or disable the linter sidecar.
    pub fn with_linters_enabled(mut self, enabled: bool) -> Self {
        self.enable_linters = enabled;
        self
    }

    /// Set a Tier 3 distributed cache URL.
    pub fn with_distributed_cache_url(mut self, url: impl Into<String>) -> Self {
        self.distributed_cache_url = Some(url.into());
        self
    }

    /// Validate internal consistency. Does not touch the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_mb == 0 {
            return Err(CodelensError::invalid_input(
                "max_file_size_mb must be > 0",
            ));
        }
        if self.parse_timeout_s == 0 {
            return Err(CodelensError::invalid_input("parse_timeout_s must be > 0"));
        }
        if self.max_parallel_files == 0 {
            return Err(CodelensError::invalid_input(
                "max_parallel_files must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_documentation_coverage) {
            return Err(CodelensError::invalid_input(
                "min_documentation_coverage must be within [0, 1]",
            ));
        }
        if self.min_complexity_threshold >= self.max_complexity_threshold {
            return Err(CodelensError::invalid_input(
                "min_complexity_threshold must be < max_complexity_threshold",
            ));
        }
        let w = &self.teaching_value_weights;
        let sum = w.documentation + w.complexity + w.pattern + w.structure;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(CodelensError::invalid_input(format!(
                "teaching_value_weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Byte budget for Tier 1, derived from `memory_cache_max_mb`.
    pub fn memory_cache_max_bytes(&self) -> u64 {
        self.memory_cache_max_mb * 1024 * 1024
    }

    /// Per-language overrides keyed by the same language keys used in
    /// `supported_languages`. Currently unused by any component but
    /// reserved so future per-language tuning doesn't require a schema
    /// break.
    pub fn language_overrides(&self) -> HashMap<String, ()> {
        HashMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = CodelensConfig::default();
        assert_eq!(cfg.max_file_size_mb, 10);
        assert_eq!(cfg.parse_timeout_s, 5);
        assert_eq!(cfg.max_parallel_files, 10);
        assert_eq!(cfg.supported_languages.len(), 10);
        assert_eq!(cfg.max_complexity_threshold, 10);
        assert_eq!(cfg.min_complexity_threshold, 2);
        assert_eq!(cfg.memory_cache_max_mb, 500);
        assert_eq!(cfg.cache_ttl_s, 3600);
        assert_eq!(cfg.persistence_root, PathBuf::from(".analysis/"));
        assert!(!cfg.enable_linters);
        assert!(cfg.distributed_cache_url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_chaining() {
        let cfg = CodelensConfig::new()
            .with_max_file_size_mb(20)
            .with_max_parallel_files(4)
            .with_linters_enabled(true);
        assert_eq!(cfg.max_file_size_mb, 20);
        assert_eq!(cfg.max_parallel_files, 4);
        assert!(cfg.enable_linters);
    }

    #[test]
    fn rejects_bad_weights() {
        let cfg = CodelensConfig::new().with_teaching_value_weights(TeachingValueWeights {
            documentation: 0.5,
            complexity: 0.5,
            pattern: 0.5,
            structure: 0.5,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_complexity_thresholds() {
        let mut cfg = CodelensConfig::default();
        cfg.min_complexity_threshold = 15;
        cfg.max_complexity_threshold = 10;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let cfg = CodelensConfig::new().with_max_file_size_mb(42);
        cfg.to_yaml_file(&path).unwrap();
        let loaded = CodelensConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.max_file_size_mb, 42);
    }
}
