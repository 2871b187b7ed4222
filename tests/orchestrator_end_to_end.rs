//! End-to-end exercises of the orchestrator against small synthetic file
//! sets, the way the crate's actual embedders would drive it: register a
//! codebase with a [`StaticScanner`], run it through [`Orchestrator`], and
//! check the resulting [`CodebaseAnalysis`] against spec-level invariants
//! rather than internal implementation detail.

use std::sync::Arc;

use codelens::core::config::CodelensConfig;
use codelens::orchestrator::Orchestrator;
use codelens::scanner::{Scanner, StaticScanner};

async fn write(dir: &std::path::Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(path, content).await.unwrap();
}

fn orchestrator(dir: &std::path::Path, files: Vec<&str>) -> Arc<Orchestrator> {
    let config = CodelensConfig::new().with_persistence_root(dir.join("store"));
    let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new().register(
        "proj",
        dir.to_string_lossy(),
        files.into_iter().map(String::from).collect(),
    ));
    Arc::new(Orchestrator::with_scanner(config, scanner).unwrap())
}

#[tokio::test]
async fn small_mixed_language_codebase_analyzes_every_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "class Greeter:\n    \"\"\"Greets people by name.\"\"\"\n\n    def greet(self, name):\n        if name:\n            return f\"hi {name}\"\n        return \"hi\"\n",
    )
    .await;
    write(
        dir.path(),
        "util.js",
        "function add(a, b) {\n  return a + b;\n}\n\nmodule.exports = { add };\n",
    )
    .await;

    let orchestrator = orchestrator(dir.path(), vec!["app.py", "util.js"]);
    let analysis = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();

    assert_eq!(analysis.file_analyses.len(), 2);
    assert!(analysis.file_analyses.contains_key("app.py"));
    assert!(analysis.file_analyses.contains_key("util.js"));
    assert_eq!(analysis.metrics.total_files, 2);
    assert_eq!(*analysis.metrics.languages.get("python").unwrap(), 1);
    assert_eq!(*analysis.metrics.languages.get("javascript").unwrap(), 1);

    let py = &analysis.file_analyses["app.py"];
    assert_eq!(py.symbols.classes.len(), 1);
    assert!(py.complexity.avg >= 1.0);
    assert!(py.parse_errors.is_empty());
}

#[tokio::test]
async fn arrow_function_bound_to_a_const_is_extracted_as_a_named_function() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "util.js",
        "const double = (x) => x * 2;\n\nmodule.exports = { double };\n",
    )
    .await;

    let orchestrator = orchestrator(dir.path(), vec!["util.js"]);
    let analysis = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();

    let js = &analysis.file_analyses["util.js"];
    assert_eq!(js.symbols.functions.len(), 1);
    assert_eq!(js.symbols.functions[0].name, "double");
}

#[tokio::test]
async fn notebook_cells_are_routed_to_their_kernel_language_and_annotated() {
    let dir = tempfile::tempdir().unwrap();
    let notebook = r#"{
        "cells": [
            {"cell_type": "markdown", "source": ["# Title\n"]},
            {"cell_type": "code", "source": ["def add(a, b):\n", "    return a + b\n"]}
        ],
        "metadata": {"kernelspec": {"language": "python"}}
    }"#;
    write(dir.path(), "analysis.ipynb", notebook).await;

    let orchestrator = orchestrator(dir.path(), vec!["analysis.ipynb"]);
    let path = dir.path().join("analysis.ipynb");
    let analysis = orchestrator.analyze_file(&path.to_string_lossy(), true).await.unwrap();

    assert_eq!(analysis.language, "python");
    assert_eq!(analysis.symbols.functions.len(), 1);
    assert_eq!(analysis.symbols.functions[0].notebook_cell, Some(1));
}

#[tokio::test]
async fn notebook_with_unregistered_kernel_language_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let notebook = r#"{
        "cells": [{"cell_type": "code", "source": "1 + 1\n"}],
        "metadata": {"kernelspec": {"language": "nonexistent-lang"}}
    }"#;
    write(dir.path(), "analysis.ipynb", notebook).await;

    let orchestrator = orchestrator(dir.path(), vec!["analysis.ipynb"]);
    let path = dir.path().join("analysis.ipynb");
    let err = orchestrator.analyze_file(&path.to_string_lossy(), true).await.unwrap_err();
    assert!(err.to_string().to_lowercase().contains("unsupported"));
}

#[tokio::test]
async fn incremental_run_reuses_unchanged_file_analysis() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "def add(a, b):\n    return a + b\n").await;
    write(dir.path(), "b.py", "def sub(a, b):\n    return a - b\n").await;

    let orchestrator = orchestrator(dir.path(), vec!["a.py", "b.py"]);
    let first = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();
    assert_eq!(first.file_analyses.len(), 2);

    // A later incremental run with no file changes should reuse both
    // entries verbatim (same analyzed_at timestamps) rather than re-parse.
    let second = orchestrator.clone().analyze_codebase("proj", true, true).await.unwrap();
    assert_eq!(
        first.file_analyses["a.py"].analyzed_at,
        second.file_analyses["a.py"].analyzed_at
    );
    assert_eq!(
        first.file_analyses["b.py"].analyzed_at,
        second.file_analyses["b.py"].analyzed_at
    );
}

#[tokio::test]
async fn unreadable_file_becomes_an_error_record_not_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "real.py", "def f():\n    pass\n").await;

    // "missing.py" is registered with the scanner but never written to
    // disk; analyze_codebase must isolate that per-file failure into an
    // error FileAnalysis rather than failing the whole codebase run.
    let orchestrator = orchestrator(dir.path(), vec!["real.py", "missing.py"]);
    let analysis = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();

    assert_eq!(analysis.file_analyses.len(), 2);
    assert!(!analysis.file_analyses["missing.py"].parse_errors.is_empty());
    assert!(analysis.file_analyses["real.py"].parse_errors.is_empty());
}

#[tokio::test]
async fn three_file_import_cycle_is_reported_as_one_circular_dependency() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "from .b import helper\n").await;
    write(dir.path(), "b.py", "from .c import helper\n").await;
    write(dir.path(), "c.py", "from .a import helper\n").await;

    let orchestrator = orchestrator(dir.path(), vec!["a.py", "b.py", "c.py"]);
    let analysis = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();

    assert_eq!(analysis.dependency_graph.circular.len(), 1);
    let cycle = &analysis.dependency_graph.circular[0];
    assert_eq!(cycle.cycle.len(), 3);
}

#[tokio::test]
async fn top_teaching_files_are_sorted_descending_by_total_score() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "documented.py",
        "class Widget:\n    \"\"\"A well documented, modestly sized widget.\"\"\"\n\n    def render(self):\n        \"\"\"Render the widget.\"\"\"\n        if self.visible:\n            return \"ok\"\n        return \"hidden\"\n",
    )
    .await;
    write(dir.path(), "bare.py", "def f():\n    pass\n").await;

    let orchestrator = orchestrator(dir.path(), vec!["documented.py", "bare.py"]);
    let analysis = orchestrator.clone().analyze_codebase("proj", false, true).await.unwrap();

    assert_eq!(analysis.top_teaching_files.len(), 2);
    let scores: Vec<f64> = analysis
        .top_teaching_files
        .iter()
        .map(|p| analysis.file_analyses[p].teaching_value.total)
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}
