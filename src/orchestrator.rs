//! Orchestrator: the state machine tying every other module
//! together. `analyze_file` runs the full per-file pipeline (A→B→C→D→E,
//! plus a raced linter call and a cache round-trip); `analyze_codebase`
//! fans `analyze_file` out across a codebase's files with bounded
//! parallelism, then runs the two barrier passes (global patterns, module
//! F's dependency resolution) before ranking and persisting.
//!
//! Per-file tasks are fanned out with `tokio::spawn` + `futures::future::join_all`,
//! with each task's result matched as `Ok(Ok(..)) / Ok(Err(..)) / Err(..)` to
//! isolate a single file's failure from the rest of the batch, bounded by a
//! `tokio::sync::Semaphore` for parallelism control.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::cache::{self, UnifiedCache};
use crate::core::config::CodelensConfig;
use crate::core::errors::{CodelensError, Result, ResultExt};
use crate::extract::{complexity, doc_coverage, symbols};
use crate::lang;
use crate::linter::{LinterSidecar, NoopLinter};
use crate::model::{CodebaseAnalysis, CodebaseMetrics, FileAnalysis};
use crate::notebook;
use crate::patterns::{self, PatternDetector};
use crate::persistence::{self, PersistenceStore};
use crate::scanner::Scanner;
use crate::scoring;

/// Default top-K teaching-value files retained in a [`CodebaseAnalysis`]
///.
const DEFAULT_TOP_K: usize = 20;

/// Deadline given to the linter sidecar before its findings are dropped as
/// a [`CodelensError::degraded_sidecar`].
const LINTER_DEADLINE: Duration = Duration::from_millis(500);

/// Ties every analysis module together behind a stable API.
pub struct Orchestrator {
    config: CodelensConfig,
    cache: UnifiedCache,
    persistence: PersistenceStore,
    scanner: Arc<dyn Scanner>,
    linter: Arc<dyn LinterSidecar>,
    pattern_registry: Vec<Box<dyn PatternDetector>>,
}

impl Orchestrator {
    /// Construct an orchestrator from a validated config and the two
    /// external collaborators it needs: a [`Scanner`] to resolve
    /// a codebase id to files, and a [`LinterSidecar`] for the optional
    /// lint pass.
    pub fn new(config: CodelensConfig, scanner: Arc<dyn Scanner>, linter: Arc<dyn LinterSidecar>) -> Result<Self> {
        config.validate()?;
        let cache = UnifiedCache::new(
            cache::default_tier2_root(&config.persistence_root),
            config.memory_cache_max_bytes(),
            config.cache_ttl_s,
        );
        let persistence = PersistenceStore::new(config.persistence_root.clone());
        Ok(Self {
            config,
            cache,
            persistence,
            scanner,
            linter,
            pattern_registry: patterns::default_registry(),
        })
    }

    /// Construct an orchestrator with no linter wired in (default:
    /// `enable_linters = false`).
    pub fn with_scanner(config: CodelensConfig, scanner: Arc<dyn Scanner>) -> Result<Self> {
        Self::new(config, scanner, Arc::new(NoopLinter))
    }

    fn max_bytes(&self) -> u64 {
        self.config.max_file_size_mb * 1024 * 1024
    }

    fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.config.parse_timeout_s)
    }

    /// Analyze a single file end to end (`analyze_file(path, force) ->
    /// FileAnalysis`). `force` bypasses the cache read (but still
    /// writes the fresh result back to cache).
    ///
    /// Each pipeline stage runs inside its own named `tracing` span so a
    /// downstream consumer can reconstruct per-phase timing from the trace
    /// alone, without the RPC layer inventing its own instrumentation.
    #[tracing::instrument(skip(self, path), fields(file = %path))]
    pub async fn analyze_file(&self, path: &str, force: bool) -> Result<FileAnalysis> {
        let bytes = tokio::fs::read(path).await.map_err(|_| CodelensError::not_found(path))?;
        let file_hash = persistence::hash_bytes(&bytes);
        let cache_key = format!("analysis:{path}:{file_hash}");

        if !force {
            let cached = self
                .cache
                .get::<FileAnalysis>(&cache_key)
                .instrument(tracing::info_span!("cache_lookup"))
                .await?;
            if let Some(cached) = cached {
                return Ok(cached);
            }
        }

        let is_notebook = path.ends_with(".ipynb");
        let (source, language, cell_map) = if is_notebook {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let flattened = notebook::flatten(&text).context(format!("flattening notebook {path}"))?;
            let language = flattened
                .language
                .as_deref()
                .and_then(|l| lang::profile_for_key(l))
                .ok_or_else(|| CodelensError::unsupported_language(path))?
                .key
                .to_string();
            (flattened.source.clone(), language, Some(flattened))
        } else {
            let language = lang::registry::language_key_for_path(path)
                .ok_or_else(|| CodelensError::unsupported_language(path))?
                .to_string();
            (String::from_utf8_lossy(&bytes).into_owned(), language, None)
        };

        let mut parse_errors = Vec::new();
        let parse_result = lang::parse_source(path.to_string(), &language, source, self.max_bytes(), self.parse_timeout())
            .instrument(tracing::info_span!("parse", language = %language))
            .await
            .context(format!("parsing {path}"))?;

        if parse_result.has_errors {
            let err = CodelensError::parse_partial(path, parse_result.error_ranges.len());
            tracing::warn!(path, error = %err, "partial parse, continuing with best-effort tree");
            parse_errors.push(err.to_string());
        }

        let (extracted, complexity_metrics, documentation) = {
            let _span = tracing::info_span!("extract").entered();
            let mut extracted = symbols::extract(&parse_result).context(format!("extracting symbols from {path}"))?;
            if let Some(flattened) = &cell_map {
                symbols::annotate_notebook_cells(&mut extracted.symbols, |line| flattened.map_line_to_cell(line));
            }
            let complexity_metrics = complexity::aggregate(&extracted.symbols, &extracted.function_details, &extracted.method_details);
            let profile = lang::profile_for_key(&language).ok_or_else(|| CodelensError::unsupported_language(path))?;
            let documentation = doc_coverage::analyze(&extracted.symbols, &parse_result.source, profile);
            (extracted, complexity_metrics, documentation)
        };

        let detected_patterns = {
            let _span = tracing::info_span!("pattern").entered();
            patterns::run_per_file(&self.pattern_registry, &extracted.symbols, &parse_result.source, path, &language)
        };

        let teaching_value = {
            let _span = tracing::info_span!("score").entered();
            scoring::score_file(
                &extracted.symbols,
                &complexity_metrics,
                &documentation,
                &detected_patterns,
                &self.config.teaching_value_weights,
            )
        };

        let linter_issues = if self.config.enable_linters {
            let lint_call = self.linter.lint(path, &parse_result.source, &language).instrument(tracing::info_span!("lint"));
            match tokio::time::timeout(LINTER_DEADLINE, lint_call).await {
                Ok(Ok(issues)) => issues,
                Ok(Err(e)) => {
                    let err = CodelensError::degraded_sidecar(path, e.to_string());
                    tracing::warn!(path, error = %err, "linter sidecar failed");
                    Vec::new()
                }
                Err(_) => {
                    let err = CodelensError::degraded_sidecar(path, "deadline exceeded");
                    tracing::warn!(path, error = %err, "linter sidecar timed out");
                    Vec::new()
                }
            }
        } else {
            tracing::debug!(path, "linter sidecar disabled, skipping");
            Vec::new()
        };

        let analysis = FileAnalysis {
            file_path: path.to_string(),
            language,
            file_hash,
            symbols: extracted.symbols,
            patterns: detected_patterns,
            complexity: complexity_metrics,
            documentation,
            teaching_value,
            linter_issues,
            analyzed_at: Utc::now(),
            parse_errors,
            schema_version: crate::SCHEMA_VERSION,
        };

        let put_result = self
            .cache
            .put(&cache_key, &analysis, None)
            .instrument(tracing::info_span!("persist"))
            .await;
        if let Err(e) = put_result {
            tracing::warn!(path, error = %e, "cache write failed, continuing uncached");
        }

        Ok(analysis)
    }

    /// Analyze every file in a codebase (`analyze_codebase`).
    /// `incremental` reuses a prior run's [`FileAnalysis`] when the file's
    /// content hash and schema version are unchanged. `use_cache` controls
    /// whether `analyze_file` consults Tier 1/2/3 for files that do need
    /// reanalysis.
    ///
    /// Takes `self: Arc<Self>` (not `&self`) because the bounded-parallel
    /// fan-out below hands each file to `tokio::spawn`, which requires a
    /// `'static` future; an owned `Arc` clone per task gives every task its
    /// own handle without borrowing from this call's stack frame.
    #[tracing::instrument(skip(self, codebase_id), fields(codebase = %codebase_id))]
    pub async fn analyze_codebase(self: Arc<Self>, codebase_id: &str, incremental: bool, use_cache: bool) -> Result<CodebaseAnalysis> {
        if codebase_id.trim().is_empty() {
            return Err(CodelensError::invalid_input("codebase_id must not be empty"));
        }

        let files = self.scanner.list_files(codebase_id).await?;
        let project_root = self.scanner.project_root(codebase_id).await?;

        let (previous_hashes, previous_analysis) = if incremental {
            (
                self.persistence.get_file_hashes(codebase_id)?,
                self.persistence.load_analysis(codebase_id)?,
            )
        } else {
            (HashMap::new(), None)
        };
        let previous_analysis = Arc::new(previous_analysis);
        let previous_hashes = Arc::new(previous_hashes);

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_files.max(1)));
        let files_len = files.len();
        let mut tasks = Vec::with_capacity(files_len);

        for rel_path in files {
            let semaphore = semaphore.clone();
            let previous_hashes = previous_hashes.clone();
            let previous_analysis = previous_analysis.clone();
            let full_path = join_paths(&project_root, &rel_path);
            let this = Arc::clone(&self);

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();

                let bytes = match tokio::fs::read(&full_path).await {
                    Ok(b) => b,
                    Err(e) => {
                        return (
                            rel_path.clone(),
                            FileAnalysis::error_record(rel_path, "unknown", "", format!("read failed: {e}")),
                        );
                    }
                };
                let hash = persistence::hash_bytes(&bytes);

                if incremental {
                    if let Some(prev_hash) = previous_hashes.get(&rel_path) {
                        if prev_hash == &hash {
                            if let Some(prev) = previous_analysis.as_ref().as_ref().and_then(|pa| pa.file_analyses.get(&rel_path)) {
                                if prev.schema_version == crate::SCHEMA_VERSION {
                                    return (rel_path, prev.clone());
                                }
                            }
                        }
                    }
                }

                let result = this.analyze_file(&full_path, !use_cache).await;
                let analysis = match result {
                    Ok(mut fa) => {
                        fa.file_path = rel_path.clone();
                        fa
                    }
                    Err(e) => FileAnalysis::error_record(rel_path.clone(), "unknown", hash, e.to_string()),
                };
                (rel_path, analysis)
            }));
        }

        let results = join_all(tasks).instrument(tracing::info_span!("fan_out", files = files_len)).await;
        let mut file_analyses: HashMap<String, FileAnalysis> = HashMap::new();
        for joined in results {
            match joined {
                Ok((path, analysis)) => {
                    file_analyses.insert(path, analysis);
                }
                Err(e) => {
                    tracing::error!(error = %e, "a file-analysis task panicked; skipping");
                }
            }
        }

        // Barrier: every per-file pass must complete before the global
        // pattern pass and the Dependency Resolver run.
        let (global_patterns, dependency_graph) = {
            let _span = tracing::info_span!("pattern_global").entered();
            let per_file_for_global: Vec<(String, Vec<_>)> = file_analyses
                .iter()
                .map(|(path, fa)| (path.clone(), fa.patterns.clone()))
                .collect();
            let global_patterns = patterns::run_global_pass(&per_file_for_global);
            let dependency_graph = crate::deps::resolve(&file_analyses, &project_root);
            (global_patterns, dependency_graph)
        };

        let mut ranked: Vec<(&String, f64)> = file_analyses.iter().map(|(p, fa)| (p, fa.teaching_value.total)).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top_teaching_files: Vec<String> = ranked.into_iter().take(DEFAULT_TOP_K).map(|(p, _)| p.clone()).collect();

        let metrics = compute_codebase_metrics(&file_analyses, &global_patterns);

        let analysis = CodebaseAnalysis {
            codebase_id: codebase_id.to_string(),
            file_analyses,
            dependency_graph,
            global_patterns,
            top_teaching_files,
            metrics,
            analyzed_at: Utc::now(),
            schema_version: crate::SCHEMA_VERSION,
        };

        {
            let _span = tracing::info_span!("persist").entered();
            if let Err(e) = self.persistence.save_analysis(&analysis) {
                tracing::warn!(codebase_id, error = %e, "persistence write failed, returning in-memory result anyway");
            }
        }
        let codebase_put = self
            .cache
            .put(&format!("codebase:{codebase_id}"), &analysis, None)
            .instrument(tracing::info_span!("persist_cache"))
            .await;
        if let Err(e) = codebase_put {
            tracing::warn!(codebase_id, error = %e, "codebase cache write failed, continuing");
        }

        Ok(analysis)
    }
}

fn join_paths(root: &str, rel: &str) -> String {
    if root.is_empty() {
        rel.to_string()
    } else {
        Path::new(root).join(rel).to_string_lossy().into_owned()
    }
}

fn compute_codebase_metrics(file_analyses: &HashMap<String, FileAnalysis>, global_patterns: &[crate::model::DetectedPattern]) -> CodebaseMetrics {
    let total_files = file_analyses.len();
    let mut languages: HashMap<String, usize> = HashMap::new();
    let mut pattern_histogram: HashMap<String, usize> = HashMap::new();
    let mut complexity_sum = 0.0;
    let mut complexity_n = 0usize;
    let mut doc_sum = 0.0;
    let mut doc_n = 0usize;

    for fa in file_analyses.values() {
        *languages.entry(fa.language.clone()).or_insert(0) += 1;
        if !fa.symbols.functions.is_empty() || !fa.symbols.classes.is_empty() {
            complexity_sum += fa.complexity.avg;
            complexity_n += 1;
        }
        doc_sum += fa.documentation.total_score;
        doc_n += 1;
        for pattern in &fa.patterns {
            *pattern_histogram.entry(pattern.pattern_type.clone()).or_insert(0) += 1;
        }
    }
    for pattern in global_patterns {
        *pattern_histogram.entry(pattern.pattern_type.clone()).or_insert(0) += 1;
    }

    CodebaseMetrics {
        total_files,
        languages,
        avg_complexity: if complexity_n == 0 { 0.0 } else { complexity_sum / complexity_n as f64 },
        avg_doc_coverage: if doc_n == 0 { 0.0 } else { doc_sum / doc_n as f64 },
        pattern_histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::StaticScanner;

    async fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn analyze_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.xyz", "hello").await;
        let config = CodelensConfig::new().with_persistence_root(dir.path().join("store"));
        let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new());
        let orchestrator = Orchestrator::with_scanner(config, scanner).unwrap();
        let err = orchestrator.analyze_file(&path, true).await.unwrap_err();
        assert!(matches!(err, CodelensError::UnsupportedLanguage { .. }));
    }

    #[tokio::test]
    async fn analyze_file_produces_symbols_and_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "calc.py", "def add(a, b):\n    \"\"\"Adds two numbers.\"\"\"\n    return a + b\n").await;
        let config = CodelensConfig::new().with_persistence_root(dir.path().join("store"));
        let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new());
        let orchestrator = Orchestrator::with_scanner(config, scanner).unwrap();
        let analysis = orchestrator.analyze_file(&path, true).await.unwrap();
        assert_eq!(analysis.symbols.functions.len(), 1);
        assert!(analysis.teaching_value.total >= 0.0);
    }

    #[tokio::test]
    async fn analyze_codebase_missing_scan_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodelensConfig::new().with_persistence_root(dir.path().join("store"));
        let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new());
        let orchestrator = Arc::new(Orchestrator::with_scanner(config, scanner).unwrap());
        let err = orchestrator.analyze_codebase("ghost", false, true).await.unwrap_err();
        assert!(matches!(err, CodelensError::NotFound { .. }));
    }

    #[tokio::test]
    async fn identical_content_at_different_paths_does_not_collide_in_cache() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(&dir, "a.py", "def f():\n    pass\n").await;
        let b = write_file(&dir, "b.py", "def f():\n    pass\n").await;
        let config = CodelensConfig::new().with_persistence_root(dir.path().join("store"));
        let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new());
        let orchestrator = Orchestrator::with_scanner(config, scanner).unwrap();

        let analysis_a = orchestrator.analyze_file(&a, false).await.unwrap();
        let analysis_b = orchestrator.analyze_file(&b, false).await.unwrap();
        assert_eq!(analysis_a.file_path, a);
        assert_eq!(analysis_b.file_path, b);
    }

    #[tokio::test]
    async fn analyze_codebase_ranks_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.py", "def add(a, b):\n    \"\"\"Adds two numbers.\"\"\"\n    return a + b\n").await;
        write_file(&dir, "b.py", "def x():\n    pass\n").await;

        let config = CodelensConfig::new().with_persistence_root(dir.path().join("store"));
        let scanner: Arc<dyn Scanner> = Arc::new(
            StaticScanner::new().register("proj", dir.path().to_string_lossy(), vec!["a.py".to_string(), "b.py".to_string()]),
        );
        let orchestrator = Arc::new(Orchestrator::with_scanner(config, scanner).unwrap());
        let analysis = orchestrator.analyze_codebase("proj", false, true).await.unwrap();
        assert_eq!(analysis.file_analyses.len(), 2);
        assert_eq!(analysis.metrics.total_files, 2);
        assert!(!analysis.top_teaching_files.is_empty());
    }
}
