//! Dependency Resolver: resolves imports to internal files or
//! external packages, builds the file-level graph, and detects circular
//! dependencies.
//!
//! The graph itself is a plain adjacency structure (file path -> imports),
//! but cycle reporting needs *minimal simple cycles* with rotation-
//! deduplication, which a raw strongly-connected-components pass doesn't
//! give you (an SCC of size 4 may contain several distinct minimal
//! cycles). Cycle enumeration below is a three-color DFS instead.

use std::collections::HashMap;

use crate::model::{
    CircularDependency, CycleSeverity, DependencyEdge, DependencyGraph, FileAnalysis, FileNode,
    ImportRecord,
};

/// Rollup metrics for a [`DependencyGraph`], returned alongside the graph
/// by `analyze_dependencies` rather than stored on the graph itself (the
/// graph's own shape is the plain `DependencyGraph` type, which doesn't
/// carry top-K fields).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyMetricsReport {
    /// Total file nodes.
    pub total_nodes: usize,
    /// Total internal edges.
    pub total_edges: usize,
    /// Mean out-degree across nodes.
    pub average_fan_out: f64,
    /// Files most frequently imported, descending, bounded to K.
    pub top_imported: Vec<(String, usize)>,
    /// Files importing the most other files, descending, bounded to K.
    pub top_importers: Vec<(String, usize)>,
}

const TOP_K: usize = 10;

fn language_suffix_candidates(module_path: &str, language: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let ext = match language {
        "python" => "py",
        "javascript" => "js",
        "typescript" | "tsx" => "ts",
        "go" => "go",
        "rust" => "rs",
        "java" => "java",
        "csharp" => "cs",
        "cpp" => "cpp",
        "ruby" => "rb",
        "php" => "php",
        _ => return candidates,
    };
    candidates.push(format!("{module_path}.{ext}"));
    match language {
        "python" => candidates.push(format!("{module_path}/__init__.{ext}")),
        "javascript" | "typescript" | "tsx" => candidates.push(format!("{module_path}/index.{ext}")),
        "rust" => candidates.push(format!("{module_path}/mod.{ext}")),
        _ => {}
    }
    candidates
}

/// Convert an import's `module` field plus the importing file's directory
/// into an ordered list of candidate internal paths to probe, following
/// the relative/absolute import resolution rules below.
fn candidate_paths(import: &ImportRecord, importing_file: &str, language: &str, project_root: &str) -> Vec<String> {
    let importing_dir = importing_file.rsplit_once('/').map(|(d, _)| d).unwrap_or("");

    let base = if import.is_relative {
        if import.module.starts_with('.') && !import.module.starts_with("./") && !import.module.starts_with("../") {
            // Python-style dotted relative: count leading dots. One dot
            // means "this package" (0 levels up); each further dot is one
            // more parent directory.
            let dots = import.module.chars().take_while(|&c| c == '.').count();
            let up_levels = dots.saturating_sub(1);
            let remainder = &import.module[dots..];
            let dir = ascend(importing_dir, up_levels);
            if dir.is_none() {
                return Vec::new(); // stepped above project root: caller treats as external
            }
            let dir = dir.unwrap();
            let remainder_path = remainder.replace('.', "/");
            if remainder_path.is_empty() {
                dir
            } else if dir.is_empty() {
                remainder_path
            } else {
                format!("{dir}/{remainder_path}")
            }
        } else {
            // Path-style relative: ./ or ../ segments.
            let mut up_levels = 0usize;
            let mut remainder = import.module.as_str();
            loop {
                if let Some(rest) = remainder.strip_prefix("../") {
                    up_levels += 1;
                    remainder = rest;
                } else if let Some(rest) = remainder.strip_prefix("./") {
                    remainder = rest;
                } else {
                    break;
                }
            }
            let dir = match ascend(importing_dir, up_levels) {
                Some(d) => d,
                None => return Vec::new(),
            };
            if dir.is_empty() {
                remainder.to_string()
            } else {
                format!("{dir}/{remainder}")
            }
        }
    } else {
        let normalized = import.module.replace("::", "/").replace('.', "/");
        if project_root.is_empty() {
            normalized
        } else {
            format!("{project_root}/{normalized}")
        }
    };

    language_suffix_candidates(&base, language)
}

/// Move `up_levels` directories above `dir`; returns `None` if that steps
/// above the project root (a boundary case classified as external).
fn ascend(dir: &str, up_levels: usize) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for _ in 0..up_levels {
        if parts.pop().is_none() {
            return None;
        }
    }
    Some(parts.join("/"))
}

fn external_package_name(module: &str) -> String {
    let trimmed = module.trim_start_matches('.').trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix('@') {
        let mut parts = rest.splitn(2, '/');
        let scope = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        if name.is_empty() {
            format!("@{scope}")
        } else {
            format!("@{scope}/{}", name.split('/').next().unwrap_or(""))
        }
    } else {
        trimmed.split(['/', '.']).next().unwrap_or(trimmed).to_string()
    }
}

/// Resolve every import across `file_analyses` into a [`DependencyGraph`]
/// (`resolve(file_analyses, project_root) -> DependencyGraph`).
pub fn resolve(file_analyses: &HashMap<String, FileAnalysis>, project_root: &str) -> DependencyGraph {
    let mut nodes: HashMap<String, FileNode> = file_analyses
        .keys()
        .map(|path| {
            (
                path.clone(),
                FileNode {
                    file_path: path.clone(),
                    ..Default::default()
                },
            )
        })
        .collect();
    let mut edge_counts: HashMap<(String, String), usize> = HashMap::new();
    let mut external: HashMap<String, usize> = HashMap::new();

    for (file_path, analysis) in file_analyses {
        for import in &analysis.symbols.imports {
            let candidates = candidate_paths(import, file_path, &analysis.language, project_root);
            let resolved = candidates.into_iter().find(|c| file_analyses.contains_key(c));

            match resolved {
                Some(target) if target != *file_path => {
                    *edge_counts.entry((file_path.clone(), target.clone())).or_insert(0) += 1;
                }
                Some(_) => {} // self-import; not a meaningful edge
                None => {
                    let package = external_package_name(&import.module);
                    *external.entry(package).or_insert(0) += 1;
                }
            }
        }
    }

    let mut edges = Vec::with_capacity(edge_counts.len());
    for ((from, to), import_count) in edge_counts {
        if let Some(node) = nodes.get_mut(&from) {
            if !node.imports.contains(&to) {
                node.imports.push(to.clone());
            }
        }
        if let Some(node) = nodes.get_mut(&to) {
            if !node.imported_by.contains(&from) {
                node.imported_by.push(from.clone());
            }
        }
        edges.push(DependencyEdge { from, to, import_count });
    }

    for (path, analysis) in file_analyses {
        if let Some(node) = nodes.get_mut(path) {
            for import in &analysis.symbols.imports {
                let candidates = candidate_paths(import, path, &analysis.language, project_root);
                if !candidates.iter().any(|c| file_analyses.contains_key(c)) {
                    let package = external_package_name(&import.module);
                    if !node.external_imports.contains(&package) {
                        node.external_imports.push(package);
                    }
                }
            }
        }
    }

    let circular = detect_cycles(&nodes);

    DependencyGraph {
        nodes,
        edges,
        circular,
        external,
    }
}

/// Three-color DFS cycle enumeration: each back edge produces a
/// cycle of the gray-stacked nodes from the target to the current node.
/// Cycles are deduplicated by rotation; severity is `error` if any member
/// file appears in more than one cycle, `warning` otherwise.
fn detect_cycles(nodes: &HashMap<String, FileNode>) -> Vec<CircularDependency> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color: HashMap<&str, Color> = nodes.keys().map(|k| (k.as_str(), Color::White)).collect();
    let mut stack: Vec<&str> = Vec::new();
    let mut raw_cycles: Vec<Vec<String>> = Vec::new();

    fn dfs<'a>(
        node: &'a str,
        nodes: &'a HashMap<String, FileNode>,
        color: &mut HashMap<&'a str, Color>,
        stack: &mut Vec<&'a str>,
        raw_cycles: &mut Vec<Vec<String>>,
    ) {
        color.insert(node, Color::Gray);
        stack.push(node);

        if let Some(file_node) = nodes.get(node) {
            for next in &file_node.imports {
                let next = next.as_str();
                if !nodes.contains_key(next) {
                    continue;
                }
                match color.get(next).copied().unwrap_or(Color::White) {
                    Color::White => dfs(next, nodes, color, stack, raw_cycles),
                    Color::Gray => {
                        if let Some(pos) = stack.iter().position(|&n| n == next) {
                            let cycle: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
                            raw_cycles.push(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        stack.pop();
        color.insert(node, Color::Black);
    }

    let mut keys: Vec<&str> = nodes.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    for key in keys {
        if color.get(key).copied().unwrap_or(Color::White) == Color::White {
            dfs(key, nodes, &mut color, &mut stack, &mut raw_cycles);
        }
    }

    dedup_and_score_cycles(raw_cycles)
}

fn dedup_and_score_cycles(raw_cycles: Vec<Vec<String>>) -> Vec<CircularDependency> {
    let mut canonical: HashMap<Vec<String>, Vec<String>> = HashMap::new();
    for cycle in raw_cycles {
        if cycle.is_empty() {
            continue;
        }
        let min_idx = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.as_str())
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut rotated = cycle[min_idx..].to_vec();
        rotated.extend_from_slice(&cycle[..min_idx]);
        canonical.entry(rotated.clone()).or_insert(rotated);
    }

    let mut occurrence: HashMap<&str, usize> = HashMap::new();
    for cycle in canonical.values() {
        for file in cycle {
            *occurrence.entry(file.as_str()).or_insert(0) += 1;
        }
    }

    canonical
        .into_values()
        .map(|cycle| {
            let severity = if cycle.iter().any(|f| occurrence.get(f.as_str()).copied().unwrap_or(0) > 1) {
                CycleSeverity::Error
            } else {
                CycleSeverity::Warning
            };
            CircularDependency { cycle, severity }
        })
        .collect()
}

/// Compute rollup metrics for a resolved [`DependencyGraph`].
pub fn compute_metrics(graph: &DependencyGraph) -> DependencyMetricsReport {
    let total_nodes = graph.nodes.len();
    let total_edges = graph.edges.len();
    let average_fan_out = if total_nodes == 0 {
        0.0
    } else {
        total_edges as f64 / total_nodes as f64
    };

    let mut imported_counts: HashMap<&str, usize> = HashMap::new();
    let mut importer_counts: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes.values() {
        imported_counts.insert(node.file_path.as_str(), node.imported_by.len());
        importer_counts.insert(node.file_path.as_str(), node.imports.len());
    }

    let mut top_imported: Vec<(String, usize)> = imported_counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    top_imported.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_imported.truncate(TOP_K);

    let mut top_importers: Vec<(String, usize)> = importer_counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    top_importers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_importers.truncate(TOP_K);

    DependencyMetricsReport {
        total_nodes,
        total_edges,
        average_fan_out,
        top_imported,
        top_importers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImportKind, SymbolTable};
    use chrono::Utc;

    fn file(path: &str, imports: Vec<ImportRecord>) -> FileAnalysis {
        FileAnalysis {
            file_path: path.to_string(),
            language: "python".to_string(),
            file_hash: "h".to_string(),
            symbols: SymbolTable {
                imports,
                ..Default::default()
            },
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

    fn import(module: &str, relative: bool) -> ImportRecord {
        ImportRecord {
            module: module.to_string(),
            imported_symbols: vec![],
            is_relative: relative,
            import_kind: ImportKind::From,
            line_number: 1,
        }
    }

    #[test]
    fn two_file_project_has_one_edge_and_inverse_view() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), file("a.py", vec![import(".b", true)]));
        files.insert("b.py".to_string(), file("b.py", vec![]));

        let graph = resolve(&files, "");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "a.py");
        assert_eq!(graph.edges[0].to, "b.py");
        assert_eq!(graph.edges[0].import_count, 1);
        assert!(graph.nodes["b.py"].imported_by.contains(&"a.py".to_string()));
        assert!(graph.circular.is_empty());
    }

    #[test]
    fn three_file_cycle_is_reported_once() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), file("a.py", vec![import(".b", true)]));
        files.insert("b.py".to_string(), file("b.py", vec![import(".c", true)]));
        files.insert("c.py".to_string(), file("c.py", vec![import(".a", true)]));

        let graph = resolve(&files, "");
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.circular.len(), 1);
        assert_eq!(graph.circular[0].cycle.len(), 3);
        assert_eq!(graph.circular[0].severity, CycleSeverity::Warning);
    }

    #[test]
    fn relative_import_above_root_is_external() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), file("a.py", vec![import("....sibling", true)]));
        let graph = resolve(&files, "");
        assert!(graph.edges.is_empty());
        assert_eq!(graph.external.len(), 1);
    }

    #[test]
    fn mutually_recursive_two_file_cycle() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), file("a.py", vec![import(".b", true)]));
        files.insert("b.py".to_string(), file("b.py", vec![import(".a", true)]));
        let graph = resolve(&files, "");
        assert_eq!(graph.circular.len(), 1);
        assert_eq!(graph.circular[0].cycle.len(), 2);
        assert!(graph.nodes["a.py"].imports.contains(&"b.py".to_string()));
        assert!(graph.nodes["b.py"].imports.contains(&"a.py".to_string()));
    }
}
