//! Language-idiom pattern detection: comprehensions,
//! context managers, async/await, generators, decorators — surfaced
//! per-language since the idioms themselves are language-specific.

use crate::core::errors::Result;
use crate::model::{DetectedPattern, SymbolTable};

use super::confidence_from_evidence;

const MAX_EVIDENCE: usize = 4;

/// Detects language-specific idioms: comprehensions, context managers,
/// async/await, generators, decorators.
pub struct LanguageIdiomDetector;

impl super::PatternDetector for LanguageIdiomDetector {
    fn pattern_type(&self) -> &'static str {
        "language_idiom"
    }

    fn detect(
        &self,
        symbols: &SymbolTable,
        file_content: &str,
        file_path: &str,
        language: &str,
    ) -> Result<Vec<DetectedPattern>> {
        let mut evidence = Vec::new();

        let has_comprehension = match language {
            "python" => file_content.contains("for ") && (file_content.contains('[') || file_content.contains('{')),
            "rust" => file_content.contains(".collect()"),
            _ => false,
        };
        if has_comprehension {
            evidence.push("comprehension/collect-style idiom".to_string());
        }

        if language == "python" && file_content.contains("with ") {
            evidence.push("context manager (`with` statement)".to_string());
        }

        let async_functions = symbols.functions.iter().filter(|f| f.is_async).count()
            + symbols
                .classes
                .iter()
                .flat_map(|c| c.methods.iter())
                .filter(|m| m.is_async)
                .count();
        if async_functions > 0 {
            evidence.push(format!("{async_functions} async function(s)"));
        }

        let has_generator = match language {
            "python" | "javascript" | "typescript" => file_content.contains("yield "),
            "rust" => false,
            _ => false,
        };
        if has_generator {
            evidence.push("generator (`yield`)".to_string());
        }

        let decorator_count: usize = symbols.functions.iter().map(|f| f.decorators.len()).sum::<usize>()
            + symbols
                .classes
                .iter()
                .map(|c| c.decorators.len() + c.methods.iter().map(|m| m.decorators.len()).sum::<usize>())
                .sum::<usize>();
        if decorator_count > 0 {
            evidence.push(format!("{decorator_count} decorator/annotation use(s)"));
        }

        if evidence.is_empty() {
            return Ok(Vec::new());
        }

        let confidence = confidence_from_evidence(evidence.len(), MAX_EVIDENCE);
        Ok(vec![DetectedPattern {
            pattern_type: format!("{language}_idiom"),
            file_path: file_path.to_string(),
            confidence,
            evidence,
            line_numbers: Vec::new(),
            metadata: Default::default(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternDetector;

    #[test]
    fn detects_async_functions() {
        let symbols = SymbolTable {
            functions: vec![crate::model::FunctionRecord {
                name: "fetch".into(),
                parameters: vec![],
                return_type: None,
                docstring: None,
                start_line: 1,
                end_line: 3,
                complexity: 1,
                is_async: true,
                decorators: vec![],
                ..Default::default()
            }],
            ..Default::default()
        };
        let found = LanguageIdiomDetector.detect(&symbols, "", "a.py", "python").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, "python_idiom");
    }
}
