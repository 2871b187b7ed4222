//! Complexity Analyzer: aggregates per-function complexity
//! (already computed by [`super::symbols`]) into file-level
//! [`ComplexityMetrics`], rolling per-entity complexity into file totals
//! and classifying against fixed thresholds (`high` iff `> 10`, `trivial`
//! iff `< 2`).

use crate::model::{ComplexityMetrics, SymbolTable};

use super::symbols::FunctionComplexityDetail;

/// Aggregate a file's functions and class methods into [`ComplexityMetrics`].
///
/// `function_details`/`method_details` must align with `symbols.functions`
/// and `symbols.classes[i].methods` respectively, as produced by
/// [`super::symbols::extract`].
pub fn aggregate(
    symbols: &SymbolTable,
    function_details: &[FunctionComplexityDetail],
    method_details: &[Vec<FunctionComplexityDetail>],
) -> ComplexityMetrics {
    let mut complexities: Vec<u32> = Vec::new();
    let mut nestings: Vec<u32> = Vec::new();
    let mut total_decision_points = 0usize;

    for (func, detail) in symbols.functions.iter().zip(function_details.iter()) {
        complexities.push(func.complexity);
        nestings.push(detail.max_nesting_depth);
        total_decision_points += detail.decision_points;
    }
    for (class, details) in symbols.classes.iter().zip(method_details.iter()) {
        for (method, detail) in class.methods.iter().zip(details.iter()) {
            complexities.push(method.complexity);
            nestings.push(detail.max_nesting_depth);
            total_decision_points += detail.decision_points;
        }
    }

    if complexities.is_empty() {
        return ComplexityMetrics::default();
    }

    let avg = complexities.iter().map(|&c| c as f64).sum::<f64>() / complexities.len() as f64;
    let max = *complexities.iter().max().unwrap();
    let min = *complexities.iter().min().unwrap();
    let high_count = complexities.iter().filter(|&&c| c > 10).count();
    let trivial_count = complexities.iter().filter(|&&c| c < 2).count();
    let avg_nesting_depth = nestings.iter().map(|&n| n as f64).sum::<f64>() / nestings.len() as f64;
    let max_nesting_depth = nestings.iter().copied().max().unwrap_or(0);

    ComplexityMetrics {
        avg,
        max,
        min,
        high_count,
        trivial_count,
        avg_nesting_depth,
        max_nesting_depth,
        total_decision_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FunctionRecord;

    fn func(complexity: u32) -> FunctionRecord {
        FunctionRecord {
            name: "f".into(),
            parameters: vec![],
            return_type: None,
            docstring: None,
            start_line: 1,
            end_line: 2,
            complexity,
            is_async: false,
            decorators: vec![],
            ..Default::default()
        }
    }

    #[test]
    fn empty_file_has_zeroed_metrics() {
        let symbols = SymbolTable::default();
        let metrics = aggregate(&symbols, &[], &[]);
        assert_eq!(metrics.avg, 0.0);
        assert_eq!(metrics.max, 0);
    }

    #[test]
    fn classifies_high_and_trivial() {
        let symbols = SymbolTable {
            functions: vec![func(1), func(11), func(5)],
            ..Default::default()
        };
        let details = vec![
            FunctionComplexityDetail { max_nesting_depth: 0, decision_points: 0 },
            FunctionComplexityDetail { max_nesting_depth: 3, decision_points: 10 },
            FunctionComplexityDetail { max_nesting_depth: 1, decision_points: 4 },
        ];
        let metrics = aggregate(&symbols, &details, &[]);
        assert_eq!(metrics.high_count, 1);
        assert_eq!(metrics.trivial_count, 1);
        assert_eq!(metrics.max, 11);
        assert_eq!(metrics.min, 1);
        assert_eq!(metrics.total_decision_points, 14);
    }
}
