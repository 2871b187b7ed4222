//! UI-component pattern detection.

use crate::core::errors::Result;
use crate::model::{DetectedPattern, SymbolTable};

use super::confidence_from_evidence;

const MAX_EVIDENCE: usize = 4;
const FRAMEWORK_IMPORTS: &[&str] = &["react", "vue", "svelte", "solid-js", "preact"];

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
        && name.chars().any(|c| c.is_lowercase())
}

fn is_hook_call(name: &str) -> bool {
    name.starts_with("use") && name.chars().nth(3).is_some_and(|c| c.is_uppercase())
}

/// Detects JSX-component signals: a PascalCase function/class name, a
/// framework import, a component-shaped return, and hook calls matching
/// `use[A-Z]...`.
pub struct UiComponentDetector;

impl super::PatternDetector for UiComponentDetector {
    fn pattern_type(&self) -> &'static str {
        "ui_component"
    }

    fn detect(
        &self,
        symbols: &SymbolTable,
        file_content: &str,
        file_path: &str,
        _language: &str,
    ) -> Result<Vec<DetectedPattern>> {
        let mut evidence = Vec::new();
        let mut lines = Vec::new();

        let framework_import = symbols
            .imports
            .iter()
            .find(|i| FRAMEWORK_IMPORTS.iter().any(|fw| i.module.to_ascii_lowercase().contains(fw)));
        if let Some(import) = framework_import {
            evidence.push(format!("imports {}", import.module));
            lines.push(import.line_number);
        }

        for func in &symbols.functions {
            if is_pascal_case(&func.name) {
                evidence.push(format!("component-named function `{}`", func.name));
                lines.push(func.start_line);
            }
        }
        for class in &symbols.classes {
            if is_pascal_case(&class.name) {
                evidence.push(format!("component-named class `{}`", class.name));
                lines.push(class.start_line);
            }
        }

        if file_content.contains("return (") || file_content.contains("return <") {
            evidence.push("returns a JSX/component expression".to_string());
        }

        let hook_calls = file_content
            .split_whitespace()
            .map(|tok| tok.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|tok| is_hook_call(tok))
            .count();
        if hook_calls > 0 {
            evidence.push(format!("{hook_calls} hook call(s) matching use[A-Z]..."));
        }

        if evidence.is_empty() {
            return Ok(Vec::new());
        }

        let confidence = confidence_from_evidence(evidence.len(), MAX_EVIDENCE);
        Ok(vec![DetectedPattern {
            pattern_type: self.pattern_type().to_string(),
            file_path: file_path.to_string(),
            confidence,
            evidence,
            line_numbers: lines,
            metadata: Default::default(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternDetector;

    #[test]
    fn detects_pascal_case_function_with_jsx_return() {
        let symbols = SymbolTable {
            functions: vec![crate::model::FunctionRecord {
                name: "Header".into(),
                parameters: vec![],
                return_type: None,
                docstring: None,
                start_line: 1,
                end_line: 5,
                complexity: 1,
                is_async: false,
                decorators: vec![],
                ..Default::default()
            }],
            ..Default::default()
        };
        let content = "function Header() {\n  return (<div />);\n}\n";
        let found = UiComponentDetector.detect(&symbols, content, "Header.jsx", "javascript").unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].confidence > 0.0);
    }

    #[test]
    fn plain_file_yields_nothing() {
        let symbols = SymbolTable::default();
        let found = UiComponentDetector.detect(&symbols, "x = 1\n", "a.py", "python").unwrap();
        assert!(found.is_empty());
    }
}
