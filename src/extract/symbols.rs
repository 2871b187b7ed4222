//! Symbol Extractor: walks a [`crate::lang::ParseResult`] into a
//! [`SymbolTable`]. Tolerant of error nodes — skips the subtree rooted at an
//! error node but continues with its siblings.
//!
//! Each language's functions/classes/imports are recognized via the
//! table-driven [`LanguageProfile`] rather than one bespoke walker per
//! language.

use tree_sitter::Node;

use crate::core::errors::{CodelensError, Result};
use crate::lang::{profile_for_key, LanguageProfile, ParseResult};
use crate::model::{ClassRecord, FunctionRecord, ImportKind, ImportRecord, SymbolTable};

use super::decision::{analyze_function_body, ComplexityWalkResult};

/// Per-function complexity/nesting detail computed alongside the
/// `SymbolTable`, consumed by [`crate::extract::complexity`] (module C).
/// Not part of the public data model (`FunctionRecord` only carries
/// `complexity`, not nesting) — kept as a side channel since the
/// complexity aggregator's `avg_nesting_depth`/`max_nesting_depth` need per-function nesting
/// that the record itself doesn't retain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionComplexityDetail {
    /// Nesting depth observed while walking this function's body.
    pub max_nesting_depth: u32,
    /// Decision points observed while walking this function's body.
    pub decision_points: usize,
}

/// The outcome of a symbol-extraction pass: the public `SymbolTable` plus
/// the complexity side-channel above, in the same order the functions
/// appear in `symbols.functions` followed by each class's methods in order.
pub struct ExtractedSymbols {
    /// The public symbol table.
    pub symbols: SymbolTable,
    /// Complexity detail for top-level functions, aligned with
    /// `symbols.functions`.
    pub function_details: Vec<FunctionComplexityDetail>,
    /// Complexity detail for methods, grouped per class in
    /// `symbols.classes` order, aligned with each class's `methods`.
    pub method_details: Vec<Vec<FunctionComplexityDetail>>,
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn find_name(node: Node, source: &str) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        return Some(node_text(name_node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind().contains("identifier") {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn collect_preceding_decorators(node: Node, profile: &LanguageProfile, source: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sib) = current {
        if profile.decorator_kinds.contains(&sib.kind()) {
            decorators.push(node_text(sib, source).trim().to_string());
            current = sib.prev_sibling();
        } else {
            break;
        }
    }
    decorators.reverse();
    decorators
}

fn collect_wrapped_decorators(node: Node, profile: &LanguageProfile, source: &str) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if profile.decorator_kinds.contains(&child.kind()) {
            decorators.push(node_text(child, source).trim().to_string());
        }
    }
    decorators
}

fn is_async(node: Node, profile: &LanguageProfile, source: &str) -> bool {
    if let Some(keyword) = profile.async_keyword {
        let mut cursor = node.walk();
        return node
            .children(&mut cursor)
            .any(|c| c.kind() == keyword || node_text(c, source) == keyword);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if node_text(child, source) == "async" {
            return true;
        }
        if !child.is_named() && node_text(child, source).trim() == "async" {
            return true;
        }
    }
    false
}

fn extract_parameters(node: Node, source: &str) -> Vec<String> {
    let Some(params_node) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        let kind = child.kind();
        if !kind.contains("identifier") && kind != "typed_parameter" && kind != "required_parameter"
            && kind != "parameter_declaration" && kind != "formal_parameter"
        {
            continue;
        }
        let name_node = child.child_by_field_name("name").unwrap_or(child);
        let text = node_text(name_node, source).trim();
        if text.is_empty() || text == "self" || text == "this" || text == "cls" {
            continue;
        }
        // Strip any trailing type annotation fragment a looser match let in.
        let ident = text.split(|c: char| !(c.is_alphanumeric() || c == '_')).next().unwrap_or(text);
        if !ident.is_empty() {
            names.push(ident.to_string());
        }
    }
    names
}

fn extract_return_type(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("return_type")
        .map(|n| node_text(n, source).trim().to_string())
}

fn find_docstring(node: Node, profile: &LanguageProfile, source: &str) -> Option<String> {
    match profile.docstring_style {
        crate::lang::registry::DocstringStyle::FirstStatementString => {
            let body = node.child_by_field_name("body")?;
            let mut cursor = body.walk();
            let first_stmt = body.children(&mut cursor).find(|c| c.is_named())?;
            let expr = if first_stmt.kind() == "expression_statement" {
                first_stmt.child(0)?
            } else {
                first_stmt
            };
            if expr.kind().contains("string") {
                let text = node_text(expr, source);
                Some(strip_string_quotes(text))
            } else {
                None
            }
        }
        crate::lang::registry::DocstringStyle::PrecedingBlockComment => {
            let mut current = node.prev_sibling();
            // Skip over any decorator/attribute siblings directly above.
            while let Some(sib) = current {
                if profile.decorator_kinds.contains(&sib.kind()) {
                    current = sib.prev_sibling();
                } else {
                    break;
                }
            }
            let sib = current?;
            if sib.kind().contains("comment") {
                let gap = node.start_position().row.saturating_sub(sib.end_position().row);
                if gap <= 2 {
                    return Some(node_text(sib, source).trim().to_string());
                }
            }
            None
        }
    }
}

fn strip_string_quotes(text: &str) -> String {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("\"\"\"")
        .or_else(|| trimmed.strip_prefix("'''"))
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix("\"\"\"")
        .or_else(|| trimmed.strip_suffix("'''"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.trim_matches(|c| c == '"' || c == '\'');
    trimmed.trim().to_string()
}

fn build_function_record(
    node: Node,
    profile: &LanguageProfile,
    source: &str,
    decorators: Vec<String>,
) -> (FunctionRecord, FunctionComplexityDetail) {
    let name = find_name(node, source).unwrap_or_else(|| "<anonymous>".to_string());
    let body = node.child_by_field_name("body").unwrap_or(node);
    let walk: ComplexityWalkResult = analyze_function_body(body, profile.key, source.as_bytes());

    let record = FunctionRecord {
        name,
        parameters: extract_parameters(node, source),
        return_type: extract_return_type(node, source),
        docstring: find_docstring(node, profile, source),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        complexity: walk.complexity,
        is_async: is_async(node, profile, source),
        decorators,
        notebook_cell: None,
    };
    let detail = FunctionComplexityDetail {
        max_nesting_depth: walk.max_nesting_depth,
        decision_points: walk.decision_points,
    };
    (record, detail)
}

fn build_class_record(
    node: Node,
    profile: &LanguageProfile,
    source: &str,
    decorators: Vec<String>,
) -> (ClassRecord, Vec<FunctionComplexityDetail>) {
    let name = find_name(node, source).unwrap_or_else(|| "<anonymous>".to_string());
    let docstring = find_docstring(node, profile, source);
    let base_classes = node
        .child_by_field_name("superclasses")
        .or_else(|| node.child_by_field_name("superclass"))
        .or_else(|| node.child_by_field_name("bases"))
        .map(|n| {
            let text = node_text(n, source);
            text.trim_matches(|c| c == '(' || c == ')' || c == ':')
                .split(',')
                .map(|s| s.trim().trim_start_matches(':').trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut methods = Vec::new();
    let mut method_details = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.is_error() {
                continue;
            }
            if profile.method_kinds.contains(&member.kind()) {
                let decs = collect_preceding_decorators(member, profile, source);
                let (record, detail) = build_function_record(member, profile, source, decs);
                methods.push(record);
                method_details.push(detail);
            }
        }
    }

    let record = ClassRecord {
        name,
        methods,
        base_classes,
        docstring,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        decorators,
        notebook_cell: None,
    };
    (record, method_details)
}

fn parse_import(node: Node, profile: &LanguageProfile, source: &str, line: usize) -> Option<ImportRecord> {
    let text = node_text(node, source);
    match profile.key {
        "python" => {
            if node.kind() == "import_from_statement" {
                let module_node = node.child_by_field_name("module_name")?;
                let module = node_text(module_node, source).to_string();
                let imported_symbols = text
                    .split("import")
                    .nth(1)?
                    .split(',')
                    .map(|s| s.trim().split(" as ").next().unwrap_or("").trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                Some(ImportRecord {
                    is_relative: module.starts_with('.'),
                    module,
                    imported_symbols,
                    import_kind: ImportKind::From,
                    line_number: line,
                })
            } else {
                let module = text
                    .trim_start_matches("import")
                    .split(',')
                    .next()?
                    .split(" as ")
                    .next()?
                    .trim()
                    .to_string();
                Some(ImportRecord {
                    is_relative: module.starts_with('.'),
                    module,
                    imported_symbols: Vec::new(),
                    import_kind: ImportKind::Plain,
                    line_number: line,
                })
            }
        }
        "javascript" | "typescript" | "tsx" => {
            if node.kind() == "import_statement" {
                let from_idx = text.rfind("from")?;
                let rest = &text[from_idx + 4..];
                let module = rest.trim().trim_matches(|c| c == ';' || c == '\'' || c == '"' || c == ' ').to_string();
                let imported_symbols = if let (Some(open), Some(close)) = (text.find('{'), text.find('}')) {
                    text[open + 1..close]
                        .split(',')
                        .map(|s| s.trim().split(" as ").next().unwrap_or("").trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                } else {
                    Vec::new()
                };
                Some(ImportRecord {
                    is_relative: module.starts_with('.'),
                    module,
                    imported_symbols,
                    import_kind: ImportKind::Es6,
                    line_number: line,
                })
            } else if text.contains("require(") {
                let start = text.find("require(")? + "require(".len();
                let rest = &text[start..];
                let end = rest.find(')')?;
                let module = rest[..end].trim().trim_matches(|c| c == '\'' || c == '"').to_string();
                Some(ImportRecord {
                    is_relative: module.starts_with('.'),
                    module,
                    imported_symbols: Vec::new(),
                    import_kind: ImportKind::Require,
                    line_number: line,
                })
            } else {
                None
            }
        }
        "rust" => {
            let module = text
                .trim_start_matches("use")
                .trim()
                .trim_end_matches(';')
                .to_string();
            let imported_symbols = if let (Some(open), Some(close)) = (module.find('{'), module.rfind('}')) {
                module[open + 1..close]
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            } else {
                Vec::new()
            };
            let module = module.split('{').next().unwrap_or(&module).trim_end_matches("::").to_string();
            Some(ImportRecord {
                is_relative: module.starts_with("self") || module.starts_with("super") || module.starts_with("crate"),
                module,
                imported_symbols,
                import_kind: ImportKind::Use,
                line_number: line,
            })
        }
        "go" => {
            let module = text
                .trim()
                .trim_start_matches("import")
                .trim()
                .trim_matches(|c| c == '(' || c == ')')
                .trim()
                .trim_matches('"')
                .to_string();
            Some(ImportRecord {
                is_relative: false,
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Plain,
                line_number: line,
            })
        }
        "java" => {
            let module = text
                .trim_start_matches("import")
                .trim()
                .trim_end_matches(';')
                .trim_start_matches("static")
                .trim()
                .to_string();
            Some(ImportRecord {
                is_relative: false,
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Plain,
                line_number: line,
            })
        }
        "csharp" => {
            let module = text
                .trim_start_matches("using")
                .trim()
                .trim_end_matches(';')
                .to_string();
            Some(ImportRecord {
                is_relative: false,
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Plain,
                line_number: line,
            })
        }
        "cpp" => {
            let module = text
                .trim_start_matches("#include")
                .trim()
                .trim_matches(|c| c == '<' || c == '>' || c == '"')
                .to_string();
            Some(ImportRecord {
                is_relative: text.contains('"'),
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Plain,
                line_number: line,
            })
        }
        "ruby" => {
            let method = node.child_by_field_name("method").map(|n| node_text(n, source))?;
            if method != "require" && method != "require_relative" {
                return None;
            }
            let args = node.child_by_field_name("arguments")?;
            let module = node_text(args, source)
                .trim_matches(|c| c == '(' || c == ')')
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            Some(ImportRecord {
                is_relative: method == "require_relative",
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Plain,
                line_number: line,
            })
        }
        "php" => {
            let module = text
                .trim_start_matches("use")
                .trim()
                .trim_end_matches(';')
                .to_string();
            Some(ImportRecord {
                is_relative: false,
                module,
                imported_symbols: Vec::new(),
                import_kind: ImportKind::Use,
                line_number: line,
            })
        }
        _ => None,
    }
}

fn walk(node: Node, profile: &LanguageProfile, source: &str, table: &mut SymbolTable,
        function_details: &mut Vec<FunctionComplexityDetail>,
        method_details: &mut Vec<Vec<FunctionComplexityDetail>>) {
    if node.is_error() || node.is_missing() {
        return;
    }
    let kind = node.kind();

    if kind == "variable_declarator" {
        if let Some(value) = node.child_by_field_name("value") {
            if value.kind() == "arrow_function" {
                let binder_name = node.child_by_field_name("name").map(|n| node_text(n, source).to_string());
                let (mut record, detail) = build_function_record(value, profile, source, Vec::new());
                if let Some(binder_name) = binder_name {
                    record.name = binder_name;
                }
                table.functions.push(record);
                function_details.push(detail);
                return;
            }
        }
    }

    if kind == "decorated_definition" {
        let decorators = collect_wrapped_decorators(node, profile, source);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if profile.class_kinds.contains(&child.kind()) {
                let (record, details) = build_class_record(child, profile, source, decorators.clone());
                table.classes.push(record);
                method_details.push(details);
                return;
            }
            if profile.function_kinds.contains(&child.kind()) {
                let (record, detail) = build_function_record(child, profile, source, decorators.clone());
                table.functions.push(record);
                function_details.push(detail);
                return;
            }
        }
        return;
    }

    if profile.class_kinds.contains(&kind) {
        let decorators = collect_preceding_decorators(node, profile, source);
        let (record, details) = build_class_record(node, profile, source, decorators);
        table.classes.push(record);
        method_details.push(details);
        return;
    }

    if profile.function_kinds.contains(&kind) {
        let decorators = collect_preceding_decorators(node, profile, source);
        let (record, detail) = build_function_record(node, profile, source, decorators);
        table.functions.push(record);
        function_details.push(detail);
        return;
    }

    if profile.import_kinds.contains(&kind) {
        let line = node.start_position().row + 1;
        if let Some(import) = parse_import(node, profile, source, line) {
            table.imports.push(import);
            return;
        }
        // Not actually an import (e.g. a JS/TS `lexical_declaration` that's
        // a plain `const`/`let` binding, not a `require(...)` call) — fall
        // through so its children (`variable_declarator`, ...) still get
        // visited instead of being swallowed whole.
    }

    if kind == "export_statement" || kind == "export_declaration" {
        let before_fns = table.functions.len();
        let before_classes = table.classes.len();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, profile, source, table, function_details, method_details);
        }
        if table.functions.len() > before_fns {
            table.exports.push(table.functions.last().unwrap().name.clone());
        }
        if table.classes.len() > before_classes {
            table.exports.push(table.classes.last().unwrap().name.clone());
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, profile, source, table, function_details, method_details);
    }
}

/// Walk a [`ParseResult`] into a [`SymbolTable`] plus complexity detail
/// (`extract(ParseResult) -> SymbolTable`).
pub fn extract(parse: &ParseResult) -> Result<ExtractedSymbols> {
    let profile = profile_for_key(&parse.language)
        .ok_or_else(|| CodelensError::unsupported_language(&parse.file_path))?;
    let mut table = SymbolTable::default();
    let mut function_details = Vec::new();
    let mut method_details = Vec::new();

    let root = parse.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk(
            child,
            profile,
            &parse.source,
            &mut table,
            &mut function_details,
            &mut method_details,
        );
    }

    Ok(ExtractedSymbols {
        symbols: table,
        function_details,
        method_details,
    })
}

/// Stamp each top-level function/class and class method with the notebook
/// cell its `start_line` falls in, for symbols extracted from a flattened
/// notebook's synthetic source. `cell_for_line` is typically
/// [`crate::notebook::FlattenedNotebook::map_line_to_cell`]; a no-op for
/// ordinary (non-notebook) files, which never call this.
pub fn annotate_notebook_cells(symbols: &mut SymbolTable, cell_for_line: impl Fn(usize) -> Option<usize>) {
    for function in &mut symbols.functions {
        function.notebook_cell = cell_for_line(function.start_line);
    }
    for class in &mut symbols.classes {
        class.notebook_cell = cell_for_line(class.start_line);
        for method in &mut class.methods {
            method.notebook_cell = cell_for_line(method.start_line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn extract_py(src: &str) -> ExtractedSymbols {
        let parse = crate::lang::parse_source(
            "t.py",
            "python",
            src.to_string(),
            10 * 1024 * 1024,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        extract(&parse).unwrap()
    }

    #[tokio::test]
    async fn extracts_one_function_with_parameters() {
        let extracted = extract_py("def add(a, b):\n    return a + b\n").await;
        assert_eq!(extracted.symbols.functions.len(), 1);
        let f = &extracted.symbols.functions[0];
        assert_eq!(f.name, "add");
        assert_eq!(f.parameters, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.complexity, 1);
        assert!(f.start_line <= f.end_line);
    }

    #[tokio::test]
    async fn class_methods_not_duplicated_at_top_level() {
        let src = "class Foo:\n    def bar(self):\n        pass\n";
        let extracted = extract_py(src).await;
        assert_eq!(extracted.symbols.classes.len(), 1);
        assert_eq!(extracted.symbols.classes[0].methods.len(), 1);
        assert!(extracted.symbols.functions.is_empty());
    }

    #[tokio::test]
    async fn relative_import_keeps_leading_dots() {
        let src = "from . import sibling\n";
        let extracted = extract_py(src).await;
        assert_eq!(extracted.symbols.imports.len(), 1);
        assert!(extracted.symbols.imports[0].is_relative);
    }
}
