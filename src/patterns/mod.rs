//! Pattern Detector: a pluggable, stateless detector registry
//! run in two phases (per-file, then a global cross-file pass), built
//! around pure-function extractors that take a symbol table and source
//! text and return evidence-backed detections.

mod auth;
mod data;
mod http;
mod idioms;
mod ui;

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::model::{DetectedPattern, SymbolTable};

pub use auth::AuthPatternDetector;
pub use data::DataLayerDetector;
pub use http::HttpEndpointDetector;
pub use idioms::LanguageIdiomDetector;
pub use ui::UiComponentDetector;

/// A stateless pattern detector. Implementations must be pure functions of
/// their inputs: no shared mutable state, no I/O.
pub trait PatternDetector: Send + Sync {
    /// The `pattern_type` this detector emits (used for logging on failure
    /// and for the global pass's per-type grouping).
    fn pattern_type(&self) -> &'static str;

    /// Detect patterns in one file. A detector that cannot apply to this
    /// language/content should return `Ok(vec![])`, not an error.
    fn detect(
        &self,
        symbols: &SymbolTable,
        file_content: &str,
        file_path: &str,
        language: &str,
    ) -> crate::core::errors::Result<Vec<DetectedPattern>>;
}

/// Given a detector's maximum expected evidence count for a clear example,
/// compute the confidence rule: `min(1.0, evidence_count / n)`.
pub fn confidence_from_evidence(evidence_count: usize, max_expected: usize) -> f64 {
    if max_expected == 0 {
        return 0.0;
    }
    (evidence_count as f64 / max_expected as f64).min(1.0)
}

/// The ordered registry of required detectors, run in a stable order every time.
pub fn default_registry() -> Vec<Box<dyn PatternDetector>> {
    vec![
        Box::new(UiComponentDetector),
        Box::new(HttpEndpointDetector),
        Box::new(DataLayerDetector),
        Box::new(AuthPatternDetector),
        Box::new(LanguageIdiomDetector),
    ]
}

/// Run every detector in `registry` over one file. A detector's failure is
/// isolated and logged, never aborting the pass.
pub fn run_per_file(
    registry: &[Box<dyn PatternDetector>],
    symbols: &SymbolTable,
    file_content: &str,
    file_path: &str,
    language: &str,
) -> Vec<DetectedPattern> {
    let mut patterns = Vec::new();
    for detector in registry {
        match detector.detect(symbols, file_content, file_path, language) {
            Ok(mut found) => patterns.append(&mut found),
            Err(e) => {
                warn!(
                    detector = detector.pattern_type(),
                    file = file_path,
                    error = %e,
                    "pattern detector failed; skipping"
                );
            }
        }
    }
    patterns
}

/// Minimum number of contributing files before a per-type observation is
/// promoted to a `global_*` pattern.
pub const GLOBAL_PRESENCE_THRESHOLD: usize = 2;

/// Re-scan all per-file results and emit `global_*` patterns summarizing
/// cross-file presence, run once after every file
/// in the codebase has finished its per-file pass (a barrier).
///
/// Per DESIGN.md's open-question decision: cross-language variants of the
/// same `pattern_type` are NOT deduplicated; each is tracked independently.
pub fn run_global_pass(per_file: &[(String, Vec<DetectedPattern>)]) -> Vec<DetectedPattern> {
    let mut files_by_type: HashMap<String, Vec<String>> = HashMap::new();
    for (file_path, patterns) in per_file {
        let mut seen_types: HashSet<&str> = HashSet::new();
        for pattern in patterns {
            if seen_types.insert(pattern.pattern_type.as_str()) {
                files_by_type
                    .entry(pattern.pattern_type.clone())
                    .or_default()
                    .push(file_path.clone());
            }
        }
    }

    let mut global_patterns = Vec::new();
    let total_files = per_file.len().max(1);
    for (pattern_type, files) in files_by_type {
        if files.len() < GLOBAL_PRESENCE_THRESHOLD {
            continue;
        }
        let mut metadata = HashMap::new();
        metadata.insert(
            "files".to_string(),
            serde_json::Value::Array(files.iter().map(|f| serde_json::Value::String(f.clone())).collect()),
        );
        global_patterns.push(DetectedPattern {
            pattern_type: format!("global_{pattern_type}"),
            file_path: String::new(),
            confidence: (files.len() as f64 / total_files as f64).min(1.0),
            evidence: vec![format!("present in {} of {} files", files.len(), total_files)],
            line_numbers: Vec::new(),
            metadata,
        });
    }
    global_patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_caps_at_one() {
        assert_eq!(confidence_from_evidence(10, 4), 1.0);
        assert_eq!(confidence_from_evidence(1, 4), 0.25);
        assert_eq!(confidence_from_evidence(0, 4), 0.0);
    }

    fn pattern(pattern_type: &str, file: &str) -> DetectedPattern {
        DetectedPattern {
            pattern_type: pattern_type.to_string(),
            file_path: file.to_string(),
            confidence: 1.0,
            evidence: vec!["e".to_string()],
            line_numbers: vec![],
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn global_pass_requires_threshold_files() {
        let per_file = vec![
            ("a.py".to_string(), vec![pattern("http_endpoint", "a.py")]),
            ("b.py".to_string(), vec![pattern("http_endpoint", "b.py")]),
            ("c.py".to_string(), vec![pattern("ui_component", "c.py")]),
        ];
        let global = run_global_pass(&per_file);
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].pattern_type, "global_http_endpoint");
    }
}
