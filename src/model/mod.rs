//! The data model. All records are immutable once produced by
//! their owning analyzer; the [`crate::orchestrator::Orchestrator`] composes
//! them. Ownership: the Orchestrator exclusively owns a [`CodebaseAnalysis`];
//! [`FileAnalysis`] records are owned by it but may be borrowed by cache
//! tiers as serialized, never-aliased snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source location collected during parsing, 1-based inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// First line of the node, 1-based.
    pub start_line: usize,
    /// Last line of the node, 1-based, inclusive.
    pub end_line: usize,
}

/// A single function or method (`FunctionRecord`).
///
/// Invariant: `start_line <= end_line`; `complexity >= 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Declared name, or a synthesized fallback for anonymous bindings.
    pub name: String,
    /// Parameter names in grammar order, receiver excluded.
    pub parameters: Vec<String>,
    /// Declared or inferred return type annotation, if present.
    pub return_type: Option<String>,
    /// First-statement docstring or preceding doc-comment block, if any.
    pub docstring: Option<String>,
    /// First line of the function, 1-based.
    pub start_line: usize,
    /// Last line of the function, 1-based, inclusive.
    pub end_line: usize,
    /// Cyclomatic complexity; starts at 1, one per decision point.
    pub complexity: u32,
    /// Whether the async modifier is syntactically present.
    pub is_async: bool,
    /// Decorator/annotation expressions, raw text, in source order.
    pub decorators: Vec<String>,
    /// For a function extracted from a flattened notebook's synthetic
    /// source, the notebook cell it was defined in. `None` for ordinary
    /// files.
    pub notebook_cell: Option<usize>,
}

impl FunctionRecord {
    /// True when both structural invariants hold.
    pub fn is_well_formed(&self) -> bool {
        self.start_line <= self.end_line && self.complexity >= 1
    }
}

/// A class/struct/interface declaration (`ClassRecord`).
///
/// Methods are NOT repeated at the file's top-level function list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Declared class name.
    pub name: String,
    /// Methods declared directly on this class.
    pub methods: Vec<FunctionRecord>,
    /// Base classes / interfaces, grammar-dependent.
    pub base_classes: Vec<String>,
    /// Docstring, if present.
    pub docstring: Option<String>,
    /// First line, 1-based.
    pub start_line: usize,
    /// Last line, 1-based, inclusive.
    pub end_line: usize,
    /// Decorator/annotation expressions, raw text, in source order.
    pub decorators: Vec<String>,
    /// For a class extracted from a flattened notebook's synthetic source,
    /// the notebook cell it was defined in. `None` for ordinary files.
    pub notebook_cell: Option<usize>,
}

/// The kind of import statement, used to interpret `module`/`imported_symbols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// A bare `import module` style statement.
    Plain,
    /// A `from module import a, b` style statement.
    From,
    /// A CommonJS `require(...)` call.
    Require,
    /// An ES module `import ... from '...'` statement.
    Es6,
    /// A Rust `use` statement.
    Use,
}

/// A single import (`ImportRecord`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Module path as written (leading dots preserved for relative imports).
    pub module: String,
    /// Explicitly named imported symbols; empty for whole-module imports.
    pub imported_symbols: Vec<String>,
    /// Whether `module` is a relative (dotted) import.
    pub is_relative: bool,
    /// The syntactic kind of import statement.
    pub import_kind: ImportKind,
    /// Line the import statement appears on, 1-based.
    pub line_number: usize,
}

/// Per-file symbol table (`SymbolTable`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    /// Top-level functions (methods are nested under their class).
    pub functions: Vec<FunctionRecord>,
    /// Top-level classes.
    pub classes: Vec<ClassRecord>,
    /// Imports, in source order.
    pub imports: Vec<ImportRecord>,
    /// Exported symbol names, where the language has an explicit export
    /// mechanism.
    pub exports: Vec<String>,
}

/// Aggregate complexity for a file (`ComplexityMetrics`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// Mean complexity across all functions and methods.
    pub avg: f64,
    /// Maximum complexity observed.
    pub max: u32,
    /// Minimum complexity observed.
    pub min: u32,
    /// Count of functions with complexity > 10.
    pub high_count: usize,
    /// Count of functions with complexity < 2.
    pub trivial_count: usize,
    /// Mean nesting depth across functions.
    pub avg_nesting_depth: f64,
    /// File-wide maximum nesting depth.
    pub max_nesting_depth: u32,
    /// Total decision points summed across all functions.
    pub total_decision_points: usize,
}

/// Counts backing a [`DocumentationCoverage`] score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationCounts {
    /// Total functions considered.
    pub total_functions: usize,
    /// Functions with an acceptable docstring.
    pub documented_functions: usize,
    /// Total classes considered.
    pub total_classes: usize,
    /// Classes with an acceptable docstring.
    pub documented_classes: usize,
    /// Total methods considered.
    pub total_methods: usize,
    /// Methods with an acceptable docstring.
    pub documented_methods: usize,
}

/// Per-file documentation score (`DocumentationCoverage`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentationCoverage {
    /// Final score in `[0, 1]`.
    pub total_score: f64,
    /// Fraction of functions with an acceptable docstring.
    pub function_coverage: f64,
    /// Fraction of classes with an acceptable docstring.
    pub class_coverage: f64,
    /// Fraction of methods with an acceptable docstring.
    pub method_coverage: f64,
    /// Bonus in `[0, 0.1]` for non-trivial inline commenting.
    pub inline_comment_bonus: f64,
    /// Raw counts the score was computed from.
    pub counts: DocumentationCounts,
}

/// A detected architectural pattern (`DetectedPattern`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    /// The pattern's category, e.g. `"ui_component"`, `"http_endpoint"`.
    pub pattern_type: String,
    /// The file the pattern was detected in.
    pub file_path: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Evidence strings supporting the detection; at least one.
    pub evidence: Vec<String>,
    /// Line numbers implicated, 1-based.
    pub line_numbers: Vec<usize>,
    /// Detector-specific metadata (e.g. `files` for global patterns).
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A composite teaching-value score (`TeachingValueScore`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeachingValueScore {
    /// Weighted total in `[0, 1]`.
    pub total: f64,
    /// Documentation sub-score.
    pub documentation: f64,
    /// Complexity sub-score.
    pub complexity: f64,
    /// Pattern sub-score.
    pub pattern: f64,
    /// Structure sub-score.
    pub structure: f64,
    /// Human-readable explanation of the strongest/weakest factors.
    pub explanation: String,
    /// Raw factor values the explanation was derived from.
    pub factors: HashMap<String, f64>,
}

/// A single `{severity, message, line, column, rule?}` entry produced by the
/// linter sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinterIssue {
    /// Severity of the issue.
    pub severity: LinterSeverity,
    /// Human-readable message.
    pub message: String,
    /// Line the issue applies to, 1-based.
    pub line: usize,
    /// Column the issue applies to, 1-based.
    pub column: usize,
    /// The rule identifier that fired, if the linter reports one.
    pub rule: Option<String>,
}

/// Severity of a [`LinterIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinterSeverity {
    /// An error-level finding.
    Error,
    /// A warning-level finding.
    Warning,
    /// An informational finding.
    Info,
}

/// The complete analysis of a single file (`FileAnalysis`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Path relative to the codebase root.
    pub file_path: String,
    /// Language key the file was parsed as.
    pub language: String,
    /// Hex content hash of the raw file bytes.
    pub file_hash: String,
    /// Extracted symbols.
    pub symbols: SymbolTable,
    /// Per-file detected patterns.
    pub patterns: Vec<DetectedPattern>,
    /// Aggregate complexity.
    pub complexity: ComplexityMetrics,
    /// Documentation coverage.
    pub documentation: DocumentationCoverage,
    /// Teaching-value score.
    pub teaching_value: TeachingValueScore,
    /// Linter issues merged in before the deadline, if any.
    pub linter_issues: Vec<LinterIssue>,
    /// When this analysis was produced.
    pub analyzed_at: DateTime<Utc>,
    /// Parse-error descriptions, if the tree had error nodes or the file
    /// could not be analyzed at all.
    pub parse_errors: Vec<String>,
    /// Schema version this record was produced under; used to decide
    /// whether incremental reuse is valid across a schema change.
    pub schema_version: u32,
}

impl FileAnalysis {
    /// Build an "error analysis" record: a `FileAnalysis` representing a
    /// file that failed to analyze, used for per-file error isolation
    /// during a codebase batch.
    pub fn error_record(
        file_path: impl Into<String>,
        language: impl Into<String>,
        file_hash: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
            file_hash: file_hash.into(),
            symbols: SymbolTable::default(),
            patterns: Vec::new(),
            complexity: ComplexityMetrics::default(),
            documentation: DocumentationCoverage::default(),
            teaching_value: TeachingValueScore::default(),
            linter_issues: Vec::new(),
            analyzed_at: Utc::now(),
            parse_errors: vec![reason.into()],
            schema_version: crate::SCHEMA_VERSION,
        }
    }
}

/// A node in the [`DependencyGraph`] (`FileNode`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// This node's file path.
    pub file_path: String,
    /// Files this file imports (internal edges only).
    pub imports: Vec<String>,
    /// Files that import this file (internal edges only, inverse view).
    pub imported_by: Vec<String>,
    /// External package names this file imports.
    pub external_imports: Vec<String>,
}

/// A directed edge between two internal files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Importing file.
    pub from: String,
    /// Imported file.
    pub to: String,
    /// Number of distinct import statements that produced this edge.
    pub import_count: usize,
}

/// Severity of a reported circular dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleSeverity {
    /// At least one member file participates in more than one cycle.
    Error,
    /// Every member file participates in exactly this one cycle.
    Warning,
}

/// A single minimal, simple cycle of internal file paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularDependency {
    /// File paths in cycle order.
    pub cycle: Vec<String>,
    /// Severity classification.
    pub severity: CycleSeverity,
}

/// The resolved dependency graph (`DependencyGraph`).
///
/// Invariants: for every edge `(u, v)`, `v` is in `nodes[u].imports` and `u`
/// is in `nodes[v].imported_by`; every cycle is minimal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// File nodes keyed by path.
    pub nodes: HashMap<String, FileNode>,
    /// Internal edges.
    pub edges: Vec<DependencyEdge>,
    /// Minimal simple cycles among internal edges.
    pub circular: Vec<CircularDependency>,
    /// External package usage counts.
    pub external: HashMap<String, usize>,
}

/// Metrics summarizing a [`DependencyGraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraphMetrics {
    /// Total nodes in the graph.
    pub total_nodes: usize,
    /// Total internal edges in the graph.
    pub total_edges: usize,
    /// Mean out-degree (fan-out) across nodes.
    pub average_fan_out: f64,
}

/// Codebase-wide rollup metrics, part of [`CodebaseAnalysis`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodebaseMetrics {
    /// Total files analyzed.
    pub total_files: usize,
    /// Files per language key.
    pub languages: HashMap<String, usize>,
    /// Mean complexity across all files' function complexities.
    pub avg_complexity: f64,
    /// Mean documentation coverage across all files.
    pub avg_doc_coverage: f64,
    /// Histogram of pattern_type -> occurrence count, across all files.
    pub pattern_histogram: HashMap<String, usize>,
}

/// The complete analysis of a codebase (`CodebaseAnalysis`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseAnalysis {
    /// Stable codebase identifier, supplied by the external scanner.
    pub codebase_id: String,
    /// Per-file analyses, keyed by file path.
    pub file_analyses: HashMap<String, FileAnalysis>,
    /// The resolved dependency graph.
    pub dependency_graph: DependencyGraph,
    /// Patterns emitted by the global pattern-detector pass.
    pub global_patterns: Vec<DetectedPattern>,
    /// File paths ranked by teaching value, descending, bounded to top K.
    pub top_teaching_files: Vec<String>,
    /// Rollup metrics.
    pub metrics: CodebaseMetrics,
    /// When this analysis was produced.
    pub analyzed_at: DateTime<Utc>,
    /// Schema version this record was produced under.
    pub schema_version: u32,
}
