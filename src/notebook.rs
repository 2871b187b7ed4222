//! Notebook Adapter: flattens a Jupyter-style `.ipynb` JSON
//! container's code cells into one synthetic source buffer so the existing
//! language extractors can run over it unmodified, while keeping a
//! line-to-cell map for translating results back. The cell model follows
//! nbformat's public schema (`cell_type`, `source`).

use serde::Deserialize;

use crate::core::errors::{CodelensError, Result};

/// One cell's contribution to the flattened source buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpan {
    /// Index of this cell within the notebook, 0-based.
    pub cell_index: usize,
    /// First line of this cell's contribution in the flattened buffer,
    /// 1-based.
    pub start_line: usize,
    /// Last line of this cell's contribution, 1-based, inclusive.
    pub end_line: usize,
}

/// The result of flattening a notebook: a synthetic source buffer plus the
/// cell boundaries needed to map extracted symbols' line numbers back to
/// notebook cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedNotebook {
    /// Concatenated code-cell source, separated by single blank lines.
    pub source: String,
    /// Spans of code cells, in notebook order.
    pub code_cells: Vec<CellSpan>,
    /// Count of markdown/raw cells skipped, for reporting.
    pub skipped_cells: usize,
    /// The notebook's code-cell language, taken from
    /// `metadata.kernelspec.language` (falling back to
    /// `metadata.language_info.name`). `None` if neither is present, in
    /// which case a caller should not assume Python.
    pub language: Option<String>,
}

impl FlattenedNotebook {
    /// Translate a 1-based line number in the flattened buffer back to the
    /// originating cell's index, if any.
    pub fn map_line_to_cell(&self, line: usize) -> Option<usize> {
        self.code_cells
            .iter()
            .find(|span| line >= span.start_line && line <= span.end_line)
            .map(|span| span.cell_index)
    }
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    kernelspec: Option<RawKernelspec>,
    #[serde(default)]
    language_info: Option<RawLanguageInfo>,
}

#[derive(Debug, Deserialize)]
struct RawKernelspec {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLanguageInfo {
    #[serde(default)]
    name: Option<String>,
}

impl RawMetadata {
    /// Prefer `kernelspec.language` over `language_info.name`; the former is
    /// what the kernel itself declared, the latter a syntax-highlighting hint
    /// some notebook authoring tools omit or leave stale.
    fn language(&self) -> Option<String> {
        self.kernelspec
            .as_ref()
            .and_then(|k| k.language.clone())
            .or_else(|| self.language_info.as_ref().and_then(|l| l.name.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(deserialize_with = "deserialize_source")]
    source: String,
}

/// nbformat stores `source` as either a single string or a list of line
/// fragments; normalize both to one owned `String`.
fn deserialize_source<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SourceField {
        Joined(String),
        Lines(Vec<String>),
    }
    Ok(match SourceField::deserialize(deserializer)? {
        SourceField::Joined(s) => s,
        SourceField::Lines(lines) => lines.concat(),
    })
}

/// Parse and flatten a notebook's JSON text. A notebook with no
/// code cells yields an empty `source` and an empty `code_cells` list; the
/// orchestrator treats that as a valid, empty-`SymbolTable` analysis rather
/// than an error.
pub fn flatten(notebook_json: &str) -> Result<FlattenedNotebook> {
    let raw: RawNotebook = serde_json::from_str(notebook_json)
        .map_err(|e| CodelensError::parse("notebook", format!("invalid notebook JSON: {e}")))?;

    let mut source = String::new();
    let mut code_cells = Vec::new();
    let mut skipped_cells = 0;
    let mut current_line = 1usize;

    for (index, cell) in raw.cells.iter().enumerate() {
        if cell.cell_type != "code" {
            skipped_cells += 1;
            continue;
        }

        let cell_source = cell.source.trim_end_matches('\n');
        let line_count = if cell_source.is_empty() { 1 } else { cell_source.lines().count() };

        let start_line = current_line;
        let end_line = start_line + line_count - 1;
        code_cells.push(CellSpan {
            cell_index: index,
            start_line,
            end_line,
        });

        source.push_str(cell_source);
        source.push('\n');
        if index + 1 < raw.cells.len() {
            source.push('\n'); // blank-line separator between cells
        }
        current_line = end_line + 2; // +1 trailing newline, +1 blank separator
    }

    Ok(FlattenedNotebook {
        source,
        code_cells,
        skipped_cells,
        language: raw.metadata.language(),
    })
}
