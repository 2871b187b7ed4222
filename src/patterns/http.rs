//! HTTP-endpoint pattern detection across framework idioms.

use crate::core::errors::Result;
use crate::model::{DetectedPattern, SymbolTable};

use super::confidence_from_evidence;

const MAX_EVIDENCE: usize = 3;
const ROUTER_METHODS: &[&str] = &[
    ".get(", ".post(", ".put(", ".delete(", ".patch(",
];
const DECORATOR_MARKERS: &[&str] = &["@app.route", "@router.", "@get(", "@post(", "@RequestMapping", "@GetMapping", "@PostMapping"];

/// Detects HTTP-endpoint signals: decorator-style routes, router-method
/// call chains, and file-path conventions like `pages/api/*`.
pub struct HttpEndpointDetector;

impl super::PatternDetector for HttpEndpointDetector {
    fn pattern_type(&self) -> &'static str {
        "http_endpoint"
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

        for func in &symbols.functions {
            for decorator in &func.decorators {
                if DECORATOR_MARKERS.iter().any(|m| decorator.contains(m)) {
                    evidence.push(format!("route decorator `{decorator}` on `{}`", func.name));
                    lines.push(func.start_line);
                }
            }
        }
        for class in &symbols.classes {
            for method in &class.methods {
                for decorator in &method.decorators {
                    if DECORATOR_MARKERS.iter().any(|m| decorator.contains(m)) {
                        evidence.push(format!("route decorator `{decorator}` on `{}`", method.name));
                        lines.push(method.start_line);
                    }
                }
            }
        }

        if ROUTER_METHODS.iter().any(|m| file_content.contains(m))
            && (file_content.contains("router") || file_content.contains("app."))
        {
            evidence.push("router-method call chain (app./router.get|post|put|delete)".to_string());
        }

        let normalized_path = file_path.replace('\\', "/");
        if normalized_path.contains("pages/api/") || normalized_path.contains("/routes/") || normalized_path.contains("/api/") {
            evidence.push(format!("file-path convention: {normalized_path}"));
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
    fn detects_decorator_style_route() {
        let symbols = SymbolTable {
            functions: vec![crate::model::FunctionRecord {
                name: "get_users".into(),
                parameters: vec![],
                return_type: None,
                docstring: None,
                start_line: 3,
                end_line: 5,
                complexity: 1,
                is_async: false,
                decorators: vec!["@app.route('/users')".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let found = HttpEndpointDetector.detect(&symbols, "", "views.py", "python").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn detects_file_path_convention() {
        let symbols = SymbolTable::default();
        let found = HttpEndpointDetector
            .detect(&symbols, "", "pages/api/users.ts", "typescript")
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
