//! Symbol, complexity, and documentation extraction.

pub mod complexity;
pub mod decision;
pub mod doc_coverage;
pub mod symbols;

pub use symbols::{extract, ExtractedSymbols, FunctionComplexityDetail};
