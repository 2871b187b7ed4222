//! Teaching-Value Scorer: combines documentation, complexity,
//! pattern, and structure sub-scores into a single weighted `total` plus a
//! human-readable explanation of the strongest/weakest factors. Each
//! sub-score is normalized to `[0, 1]` before a configurable weighted sum
//! over four fixed named factors.

use std::collections::HashMap;

use crate::core::config::TeachingValueWeights;
use crate::model::{ComplexityMetrics, DetectedPattern, DocumentationCoverage, SymbolTable, TeachingValueScore};

/// Complexity a well-taught function is assumed to target; the complexity
/// sub-score penalizes distance from this in either direction (a trivial
/// function teaches as little as an unreadable one).
const TARGET_COMPLEXITY: f64 = 6.0;

/// Minimum/maximum function length, in lines, considered a "healthy" size
/// for the structure sub-score.
const HEALTHY_FN_MIN_LINES: usize = 10;
const HEALTHY_FN_MAX_LINES: usize = 80;

/// Nesting depth at or above which the structure sub-score treats a file as
/// having "deep nesting" (penalized).
const DEEP_NESTING_THRESHOLD: u32 = 5;

fn documentation_subscore(doc: &DocumentationCoverage) -> f64 {
    doc.total_score.clamp(0.0, 1.0)
}

fn complexity_subscore(complexity: &ComplexityMetrics) -> f64 {
    if complexity.total_decision_points == 0 && complexity.max == 0 {
        return 0.0; // no functions to judge; nothing to teach from
    }
    let distance = (complexity.avg - TARGET_COMPLEXITY).abs() / TARGET_COMPLEXITY;
    (1.0 - distance).clamp(0.0, 1.0)
}

fn pattern_subscore(patterns: &[DetectedPattern]) -> f64 {
    if patterns.is_empty() {
        return 0.0;
    }
    let avg_confidence = patterns.iter().map(|p| p.confidence).sum::<f64>() / patterns.len() as f64;
    (0.25 * patterns.len() as f64 + 0.25 * avg_confidence).min(1.0)
}

fn structure_subscore(symbols: &SymbolTable, complexity: &ComplexityMetrics) -> f64 {
    if symbols.functions.is_empty() && symbols.classes.is_empty() {
        return 0.0; // nothing structural to judge; don't credit a trivially-shallow empty file
    }

    let mut points = 0.0;
    let mut weight = 0.0;

    weight += 1.0;
    if !symbols.classes.is_empty() {
        points += 1.0;
    }

    let all_functions: Vec<&crate::model::FunctionRecord> = symbols
        .functions
        .iter()
        .chain(symbols.classes.iter().flat_map(|c| c.methods.iter()))
        .collect();

    if !all_functions.is_empty() {
        weight += 1.0;
        let healthy = all_functions
            .iter()
            .filter(|f| {
                let len = f.end_line.saturating_sub(f.start_line) + 1;
                (HEALTHY_FN_MIN_LINES..=HEALTHY_FN_MAX_LINES).contains(&len)
            })
            .count();
        points += healthy as f64 / all_functions.len() as f64;

        weight += 1.0;
        let documented = all_functions.iter().filter(|f| f.docstring.is_some()).count();
        points += documented as f64 / all_functions.len() as f64;
    }

    weight += 1.0;
    if complexity.max_nesting_depth < DEEP_NESTING_THRESHOLD {
        points += 1.0;
    }

    if weight == 0.0 {
        0.5
    } else {
        (points / weight).clamp(0.0, 1.0)
    }
}

/// Compute the teaching-value score for a single file.
pub fn score_file(
    symbols: &SymbolTable,
    complexity: &ComplexityMetrics,
    documentation: &DocumentationCoverage,
    patterns: &[DetectedPattern],
    weights: &TeachingValueWeights,
) -> TeachingValueScore {
    let documentation_score = documentation_subscore(documentation);
    let complexity_score = complexity_subscore(complexity);
    let pattern_score = pattern_subscore(patterns);
    let structure_score = structure_subscore(symbols, complexity);

    let total = weights.documentation * documentation_score
        + weights.complexity * complexity_score
        + weights.pattern * pattern_score
        + weights.structure * structure_score;

    let mut factors = HashMap::new();
    factors.insert("documentation".to_string(), documentation_score);
    factors.insert("complexity".to_string(), complexity_score);
    factors.insert("pattern".to_string(), pattern_score);
    factors.insert("structure".to_string(), structure_score);

    let explanation = explain(&factors);

    TeachingValueScore {
        total: total.clamp(0.0, 1.0),
        documentation: documentation_score,
        complexity: complexity_score,
        pattern: pattern_score,
        structure: structure_score,
        explanation,
        factors,
    }
}

/// Build a one-sentence explanation naming the strongest and weakest
/// factors, for surfacing in reports or IDE tooltips.
fn explain(factors: &HashMap<String, f64>) -> String {
    let mut ranked: Vec<(&String, &f64)> = factors.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    let strongest = ranked.first();
    let weakest = ranked.last();

    match (strongest, weakest) {
        (Some((s_name, s_val)), Some((w_name, w_val))) if s_name != w_name => {
            format!(
                "Strongest factor: {s_name} ({s_val:.2}); weakest factor: {w_name} ({w_val:.2})."
            )
        }
        (Some((name, val)), _) => format!("Only factor: {name} ({val:.2})."),
        _ => "No factors available.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassRecord;
    use crate::model::FunctionRecord;

    fn func(start: usize, end: usize, documented: bool) -> FunctionRecord {
        FunctionRecord {
            name: "f".into(),
            parameters: vec![],
            return_type: None,
            docstring: if documented { Some("does a thing".into()) } else { None },
            start_line: start,
            end_line: end,
            complexity: 1,
            is_async: false,
            decorators: vec![],
            ..Default::default()
        }
    }

    #[test]
    fn total_is_weighted_sum_within_bounds() {
        let symbols = SymbolTable {
            functions: vec![func(1, 30, true)],
            classes: vec![],
            ..Default::default()
        };
        let complexity = ComplexityMetrics {
            avg: 6.0,
            max: 6,
            min: 6,
            total_decision_points: 5,
            max_nesting_depth: 2,
            ..Default::default()
        };
        let documentation = DocumentationCoverage {
            total_score: 0.9,
            ..Default::default()
        };
        let weights = TeachingValueWeights::default();
        let score = score_file(&symbols, &complexity, &documentation, &[], &weights);
        assert!(score.total >= 0.0 && score.total <= 1.0);
        assert_eq!(score.complexity, 1.0); // avg exactly at target
    }

    #[test]
    fn empty_symbol_table_scores_near_zero_not_neutral() {
        let symbols = SymbolTable::default();
        let complexity = ComplexityMetrics::default();
        let documentation = DocumentationCoverage::default();
        let weights = TeachingValueWeights::default();
        let score = score_file(&symbols, &complexity, &documentation, &[], &weights);
        assert!(score.total >= 0.0);
        assert!(score.total < 0.05);
        assert_eq!(score.complexity, 0.0);
        assert_eq!(score.structure, 0.0);
    }

    #[test]
    fn structure_rewards_documented_healthy_classes() {
        let symbols = SymbolTable {
            classes: vec![ClassRecord {
                name: "Widget".into(),
                methods: vec![func(1, 40, true)],
                base_classes: vec![],
                docstring: Some("a widget".into()),
                start_line: 1,
                end_line: 40,
                decorators: vec![],
                ..Default::default()
            }],
            ..Default::default()
        };
        let complexity = ComplexityMetrics {
            max_nesting_depth: 1,
            ..Default::default()
        };
        let score = structure_subscore(&symbols, &complexity);
        assert!(score > 0.8);
    }

    #[test]
    fn explanation_names_distinct_strongest_and_weakest() {
        let mut factors = HashMap::new();
        factors.insert("documentation".to_string(), 0.9);
        factors.insert("complexity".to_string(), 0.1);
        let text = explain(&factors);
        assert!(text.contains("documentation"));
        assert!(text.contains("complexity"));
    }
}
