//! Data-layer pattern detection: ORM model
//! declarations, query-builder chains, migration files.

use crate::core::errors::Result;
use crate::model::{DetectedPattern, SymbolTable};

use super::confidence_from_evidence;

const MAX_EVIDENCE: usize = 3;
const ORM_BASE_MARKERS: &[&str] = &["Model", "models.Model", "ActiveRecord", "db.Model", "Base"];
const QUERY_BUILDER_MARKERS: &[&str] = &[".where(", ".select(", ".orderBy(", ".join(", ".filter("];

/// Detects ORM model declarations, query-builder chains, and migration
/// files (by name convention plus structural markers).
pub struct DataLayerDetector;

impl super::PatternDetector for DataLayerDetector {
    fn pattern_type(&self) -> &'static str {
        "data_layer"
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

        for class in &symbols.classes {
            if class
                .base_classes
                .iter()
                .any(|b| ORM_BASE_MARKERS.iter().any(|m| b.contains(m)))
            {
                evidence.push(format!("ORM model class `{}`", class.name));
                lines.push(class.start_line);
            }
        }

        let builder_hits = QUERY_BUILDER_MARKERS.iter().filter(|m| file_content.contains(**m)).count();
        if builder_hits >= 2 {
            evidence.push(format!("query-builder chain ({builder_hits} chained calls)"));
        }

        let normalized_path = file_path.to_ascii_lowercase().replace('\\', "/");
        let file_name = normalized_path.rsplit('/').next().unwrap_or(&normalized_path);
        let looks_like_migration = normalized_path.contains("/migrations/")
            || normalized_path.contains("/migrate/")
            || (file_name.chars().take(8).all(|c| c.is_ascii_digit()) && file_name.contains('_'));
        if looks_like_migration {
            evidence.push(format!("migration file-name convention: {file_name}"));
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
    fn detects_orm_model_base_class() {
        let symbols = SymbolTable {
            classes: vec![crate::model::ClassRecord {
                name: "User".into(),
                methods: vec![],
                base_classes: vec!["models.Model".into()],
                docstring: None,
                start_line: 1,
                end_line: 4,
                decorators: vec![],
                ..Default::default()
            }],
            ..Default::default()
        };
        let found = DataLayerDetector.detect(&symbols, "", "models.py", "python").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn detects_migration_filename_convention() {
        let symbols = SymbolTable::default();
        let found = DataLayerDetector
            .detect(&symbols, "", "migrations/20240101_create_users.py", "python")
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
