//! Doc-Coverage Analyzer: per-file documentation score, built on a
//! docstring-presence scan and a placeholder-docstring heuristic (`TODO`,
//! `FIXME`, `TBD`, `xxx`, ellipsis-only, and whitespace-only bodies all
//! count as undocumented), plus category weights, a renormalization rule,
//! and an inline-comment bonus.

use crate::lang::LanguageProfile;
use crate::model::{DocumentationCounts, DocumentationCoverage, SymbolTable};

const PLACEHOLDER_MARKERS: &[&str] = &["todo", "fixme", "tbd", "xxx"];
const MIN_DOCSTRING_LEN: usize = 10;
const MIN_INLINE_COMMENT_LINES: usize = 3;
const MIN_INLINE_COMMENT_LEN: usize = 4;
const INLINE_BONUS: f64 = 0.1;

fn is_documented(docstring: &Option<String>) -> bool {
    let Some(text) = docstring else {
        return false;
    };
    let trimmed = text.trim();
    if trimmed.len() <= MIN_DOCSTRING_LEN {
        return false;
    }
    if trimmed.chars().all(|c| c == '.' || c.is_whitespace()) {
        return false;
    }
    if trimmed.chars().all(|c| c.is_whitespace()) {
        return false;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|m| lowered == *m || lowered.starts_with(m)) {
        return false;
    }
    true
}

fn is_section_divider(comment_body: &str) -> bool {
    let trimmed = comment_body.trim();
    if trimmed.is_empty() {
        return true;
    }
    let mut chars = trimmed.chars();
    let first = chars.next().unwrap();
    first.is_ascii_punctuation() && trimmed.chars().all(|c| c == first || c.is_whitespace())
}

fn count_meaningful_comment_lines(source: &str, prefix: &str) -> usize {
    source
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            trimmed.strip_prefix(prefix)
        })
        .filter(|body| !is_section_divider(body) && body.trim().len() >= MIN_INLINE_COMMENT_LEN)
        .count()
}

/// Compute [`DocumentationCoverage`] for one file's symbols and raw source.
pub fn analyze(symbols: &SymbolTable, source: &str, profile: &LanguageProfile) -> DocumentationCoverage {
    let total_functions = symbols.functions.len();
    let documented_functions = symbols.functions.iter().filter(|f| is_documented(&f.docstring)).count();

    let total_classes = symbols.classes.len();
    let documented_classes = symbols.classes.iter().filter(|c| is_documented(&c.docstring)).count();

    let total_methods: usize = symbols.classes.iter().map(|c| c.methods.len()).sum();
    let documented_methods: usize = symbols
        .classes
        .iter()
        .flat_map(|c| c.methods.iter())
        .filter(|m| is_documented(&m.docstring))
        .count();

    let function_coverage = ratio(documented_functions, total_functions);
    let class_coverage = ratio(documented_classes, total_classes);
    let method_coverage = ratio(documented_methods, total_methods);

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    if total_functions > 0 {
        weighted_sum += 0.40 * function_coverage;
        weight_total += 0.40;
    }
    if total_classes > 0 {
        weighted_sum += 0.30 * class_coverage;
        weight_total += 0.30;
    }
    if total_methods > 0 {
        weighted_sum += 0.30 * method_coverage;
        weight_total += 0.30;
    }
    let base_score = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };

    let meaningful_comments = count_meaningful_comment_lines(source, profile.line_comment_prefix);
    let inline_comment_bonus = if meaningful_comments >= MIN_INLINE_COMMENT_LINES {
        INLINE_BONUS
    } else {
        0.0
    };

    let total_score = (base_score + inline_comment_bonus).min(1.0);

    DocumentationCoverage {
        total_score,
        function_coverage,
        class_coverage,
        method_coverage,
        inline_comment_bonus,
        counts: DocumentationCounts {
            total_functions,
            documented_functions,
            total_classes,
            documented_classes,
            total_methods,
            documented_methods,
        },
    }
}

fn ratio(documented: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        documented as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::registry::profile_for_key;
    use crate::model::FunctionRecord;

    fn py_profile() -> &'static LanguageProfile {
        profile_for_key("python").unwrap()
    }

    fn func(docstring: Option<&str>) -> FunctionRecord {
        FunctionRecord {
            name: "f".into(),
            parameters: vec![],
            return_type: None,
            docstring: docstring.map(|s| s.to_string()),
            start_line: 1,
            end_line: 2,
            complexity: 1,
            is_async: false,
            decorators: vec![],
            ..Default::default()
        }
    }

    #[test]
    fn file_with_no_docstrings_scores_near_zero() {
        let symbols = SymbolTable {
            functions: vec![func(None)],
            ..Default::default()
        };
        let coverage = analyze(&symbols, "def f(): pass\n", py_profile());
        assert!(coverage.total_score <= 0.1);
    }

    #[test]
    fn placeholder_docstring_does_not_count() {
        let symbols = SymbolTable {
            functions: vec![func(Some("TODO"))],
            ..Default::default()
        };
        let coverage = analyze(&symbols, "", py_profile());
        assert_eq!(coverage.function_coverage, 0.0);
    }

    #[test]
    fn real_docstring_counts() {
        let symbols = SymbolTable {
            functions: vec![func(Some("Adds two numbers together and returns the sum."))],
            ..Default::default()
        };
        let coverage = analyze(&symbols, "", py_profile());
        assert_eq!(coverage.function_coverage, 1.0);
        assert!(coverage.total_score > 0.3);
    }

    #[test]
    fn inline_comment_bonus_requires_three_meaningful_lines() {
        let symbols = SymbolTable::default();
        let source = "# this explains step one\n# this explains step two\n# this explains step three\n";
        let coverage = analyze(&symbols, source, py_profile());
        assert_eq!(coverage.inline_comment_bonus, 0.1);
    }

    #[test]
    fn section_dividers_are_not_meaningful_comments() {
        let symbols = SymbolTable::default();
        let source = "#########\n#########\n#########\n";
        let coverage = analyze(&symbols, source, py_profile());
        assert_eq!(coverage.inline_comment_bonus, 0.0);
    }
}
