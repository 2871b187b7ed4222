//! Persistence Store: durable, atomic on-disk storage for
//! codebase-level analysis results and per-file hashes, keyed by
//! `codebase_id`. Every write goes through a write-temp-then-rename step
//! since this output is read back as a durable contract, not just
//! human-facing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::core::errors::{CodelensError, Result};
use crate::model::{CodebaseAnalysis, FileAnalysis};

/// A durable store rooted at a configured directory, laid out as
/// `{root}/{codebase_id}/analysis.json`, `.../file_hashes.json`, and
/// `.../file_{hash}.json`.
pub struct PersistenceStore {
    root: PathBuf,
}

impl PersistenceStore {
    /// Construct a store rooted at `root`. The directory is created lazily
    /// on first write, not eagerly here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn codebase_dir(&self, codebase_id: &str) -> PathBuf {
        self.root.join(codebase_id)
    }

    fn file_entry_path(&self, codebase_id: &str, file_hash: &str) -> PathBuf {
        self.codebase_dir(codebase_id).join(format!("file_{file_hash}.json"))
    }

    fn analysis_path(&self, codebase_id: &str) -> PathBuf {
        self.codebase_dir(codebase_id).join("analysis.json")
    }

    fn file_hashes_path(&self, codebase_id: &str) -> PathBuf {
        self.codebase_dir(codebase_id).join("file_hashes.json")
    }

    /// Persist a codebase's full analysis, plus its per-file hash map for
    /// future incremental runs. Writes are atomic: each file is written to
    /// a sibling `.tmp` path then renamed into place.
    pub fn save_analysis(&self, analysis: &CodebaseAnalysis) -> Result<()> {
        let dir = self.codebase_dir(&analysis.codebase_id);
        std::fs::create_dir_all(&dir)?;

        write_atomic(&self.analysis_path(&analysis.codebase_id), analysis)?;

        let hashes: HashMap<String, String> = analysis
            .file_analyses
            .values()
            .map(|fa| (fa.file_path.clone(), fa.file_hash.clone()))
            .collect();
        write_atomic(&self.file_hashes_path(&analysis.codebase_id), &hashes)?;

        for file_analysis in analysis.file_analyses.values() {
            let path = self.file_entry_path(&analysis.codebase_id, &file_analysis.file_hash);
            write_atomic(&path, file_analysis)?;
        }

        Ok(())
    }

    /// Load a previously persisted codebase analysis. Returns `Ok(None)` if
    /// none exists rather than an error.
    pub fn load_analysis(&self, codebase_id: &str) -> Result<Option<CodebaseAnalysis>> {
        let path = self.analysis_path(codebase_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Load the previous run's `{file_path -> content_hash}` map, used by
    /// the orchestrator's incremental-reuse decision. Returns an empty map
    /// if none exists.
    pub fn get_file_hashes(&self, codebase_id: &str) -> Result<HashMap<String, String>> {
        let path = self.file_hashes_path(codebase_id);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        read_json(&path)
    }

    /// Load a single previously persisted [`FileAnalysis`] by content hash,
    /// for incremental reuse. Returns `Ok(None)` if missing.
    pub fn load_file_analysis(&self, codebase_id: &str, file_hash: &str) -> Result<Option<FileAnalysis>> {
        let path = self.file_entry_path(codebase_id, file_hash);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

fn write_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized =
        serde_json::to_vec_pretty(value).map_err(|e| CodelensError::persist_failed(path.display().to_string(), e.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &serialized)
        .map_err(|e| CodelensError::persist_failed(path.display().to_string(), e.to_string()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| CodelensError::persist_failed(path.display().to_string(), e.to_string()))?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Stable content hash of raw file bytes, used both as the `file_hash` in
/// [`FileAnalysis`] and as the persistence key for per-file entries.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodebaseMetrics, DependencyGraph};
    use chrono::Utc;

    fn sample_file(path: &str, hash: &str) -> FileAnalysis {
        FileAnalysis {
            file_path: path.to_string(),
            language: "python".to_string(),
            file_hash: hash.to_string(),
            symbols: Default::default(),
            patterns: vec![],
            complexity: Default::default(),
            documentation: Default::default(),
            teaching_value: Default::default(),
            linter_issues: vec![],
            analyzed_at: Utc::now(),
            parse_errors: vec![],
            schema_version: 1,
        }
    }

    fn sample_analysis(codebase_id: &str) -> CodebaseAnalysis {
        let mut file_analyses = HashMap::new();
        file_analyses.insert("a.py".to_string(), sample_file("a.py", "hash1"));
        CodebaseAnalysis {
            codebase_id: codebase_id.to_string(),
            file_analyses,
            dependency_graph: DependencyGraph::default(),
            global_patterns: vec![],
            top_teaching_files: vec![],
            metrics: CodebaseMetrics::default(),
            analyzed_at: Utc::now(),
            schema_version: 1,
        }
    }

    #[test]
    fn missing_analysis_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        assert!(store.load_analysis("nope").unwrap().is_none());
        assert!(store.get_file_hashes("nope").unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        let analysis = sample_analysis("proj1");
        store.save_analysis(&analysis).unwrap();

        let loaded = store.load_analysis("proj1").unwrap().unwrap();
        assert_eq!(loaded.codebase_id, "proj1");
        assert_eq!(loaded.file_analyses.len(), 1);

        let hashes = store.get_file_hashes("proj1").unwrap();
        assert_eq!(hashes.get("a.py"), Some(&"hash1".to_string()));

        let per_file = store.load_file_analysis("proj1", "hash1").unwrap().unwrap();
        assert_eq!(per_file.file_path, "a.py");
    }

    #[test]
    fn hash_bytes_is_stable_and_hex() {
        let h1 = hash_bytes(b"hello");
        let h2 = hash_bytes(b"hello");
        assert_eq!(h1, h2);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
