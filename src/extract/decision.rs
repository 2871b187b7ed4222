//! Shared cyclomatic-complexity rule: classify each AST node as a decision
//! point or not, track whether it increases nesting depth, and accumulate
//! `1 + decision_points.len()` per function across all ten supported
//! languages, including `loop`, `select`, per-arm `match`, and `rescue`.

use tree_sitter::Node;

/// A classified decision point inside a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// `if` / `elif` / `else if`.
    If,
    /// `for` loops, including `for-in`/`for-each` variants.
    For,
    /// `while` loops.
    While,
    /// `do`/`while` post-condition loops.
    DoWhile,
    /// Rust's unconditional `loop`.
    Loop,
    /// Go's `select` statement (counted once per arm, like `match`).
    Select,
    /// A single `case`/`when`/`switch`-arm.
    CaseArm,
    /// A single `match` arm (Rust).
    MatchArm,
    /// `except` / `catch` / `rescue`.
    ExceptCatch,
    /// Short-circuit boolean `and`/`or`/`&&`/`||`, counted per occurrence.
    BooleanOp,
    /// A ternary / conditional expression.
    Ternary,
}

/// Result of walking one function body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityWalkResult {
    /// Cyclomatic complexity: `1 + decision_points`.
    pub complexity: u32,
    /// Count of decision points found (== `complexity - 1`).
    pub decision_points: usize,
    /// Maximum nesting depth of control constructs within the body.
    pub max_nesting_depth: u32,
}

/// Classify a single node as a decision point, per-language.
///
/// Boolean operators and ternaries are detected by grammar-stable node
/// kinds shared across most grammars (`binary_expression`/`binary` with a
/// `&&`/`||`/`and`/`or` operator; `conditional_expression`/`conditional`).
fn classify_decision(language: &str, node: &Node, source: &[u8]) -> Option<DecisionKind> {
    let kind = node.kind();
    match kind {
        "if_statement" | "if_expression" | "elif_clause" | "else_if_clause" => {
            Some(DecisionKind::If)
        }
        "for_statement" | "for_expression" | "for_in_statement" | "enhanced_for_statement"
        | "foreach_statement" => Some(DecisionKind::For),
        "while_statement" | "while_expression" => Some(DecisionKind::While),
        "do_statement" => Some(DecisionKind::DoWhile),
        "loop_expression" => Some(DecisionKind::Loop),
        "select_statement" => Some(DecisionKind::Select),
        "match_arm" => Some(DecisionKind::MatchArm),
        "communication_case" if language == "go" => Some(DecisionKind::Select),
        "switch_case" | "case_statement" | "switch_section" | "expression_case"
        | "switch_rule" => Some(DecisionKind::CaseArm),
        "when" if language == "ruby" => Some(DecisionKind::CaseArm),
        "except_clause" | "catch_clause" | "rescue" | "rescue_clause" => {
            Some(DecisionKind::ExceptCatch)
        }
        "conditional_expression" | "conditional" | "ternary_expression" => {
            Some(DecisionKind::Ternary)
        }
        "boolean_operator" | "binary_expression" | "binary" => {
            let operator_text = node
                .child_by_field_name("operator")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or("");
            match operator_text {
                "&&" | "||" | "and" | "or" => Some(DecisionKind::BooleanOp),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Node kinds that increase nesting depth when entered (control constructs
/// and block bodies).
fn increases_nesting(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "if_expression"
            | "elif_clause"
            | "else_clause"
            | "else_if_clause"
            | "for_statement"
            | "for_expression"
            | "for_in_statement"
            | "enhanced_for_statement"
            | "foreach_statement"
            | "while_statement"
            | "while_expression"
            | "do_statement"
            | "loop_expression"
            | "match_expression"
            | "match_statement"
            | "switch_statement"
            | "switch_expression"
            | "select_statement"
            | "try_statement"
            | "try_expression"
            | "block"
            | "compound_statement"
    )
}

/// True when a node kind represents the start of a *nested* function/class
/// scope; the walk stops descending into it so inner functions/classes
/// don't contribute their decision points to the enclosing function.
fn is_nested_scope(kind: &str) -> bool {
    matches!(
        kind,
        "function_definition"
            | "function_declaration"
            | "method_declaration"
            | "method_definition"
            | "function_item"
            | "class_definition"
            | "class_declaration"
            | "class_specifier"
    )
}

fn walk(
    node: Node,
    language: &str,
    source: &[u8],
    depth: u32,
    is_root: bool,
    result: &mut ComplexityWalkResult,
) {
    if !is_root && is_nested_scope(node.kind()) {
        return;
    }
    if let Some(_kind) = classify_decision(language, &node, source) {
        result.decision_points += 1;
    }
    let child_depth = if increases_nesting(node.kind()) && !is_root {
        depth + 1
    } else {
        depth
    };
    result.max_nesting_depth = result.max_nesting_depth.max(child_depth);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_error() {
            continue;
        }
        walk(child, language, source, child_depth, false, result);
    }
}

/// Compute complexity and nesting depth for a single function body,
/// starting complexity at 1 and adding one per decision point found.
/// `body` should be the function's body node (or the whole function
/// node if the grammar has no distinct body child).
pub fn analyze_function_body(body: Node, language: &str, source: &[u8]) -> ComplexityWalkResult {
    let mut result = ComplexityWalkResult::default();
    walk(body, language, source, 0, true, &mut result);
    result.complexity = 1 + result.decision_points as u32;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_python(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn trivial_function_has_complexity_one() {
        let src = "def add(a, b):\n    return a + b\n";
        let tree = parse_python(src);
        let root = tree.root_node();
        let func = root.child(0).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let result = analyze_function_body(body, "python", src.as_bytes());
        assert_eq!(result.complexity, 1);
    }

    #[test]
    fn if_statement_raises_complexity_to_two() {
        let src = "def f(x):\n    if x:\n        y()\n";
        let tree = parse_python(src);
        let root = tree.root_node();
        let func = root.child(0).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let result = analyze_function_body(body, "python", src.as_bytes());
        assert_eq!(result.complexity, 2);
    }

    #[test]
    fn ternary_in_same_body_adds_one_more() {
        let src = "def f(x):\n    if x:\n        y()\n    z = 1 if x else 2\n";
        let tree = parse_python(src);
        let root = tree.root_node();
        let func = root.child(0).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let result = analyze_function_body(body, "python", src.as_bytes());
        assert_eq!(result.complexity, 3);
    }

    #[test]
    fn nested_function_does_not_leak_decisions_into_parent() {
        let src = "def outer():\n    def inner():\n        if True:\n            pass\n    return 1\n";
        let tree = parse_python(src);
        let root = tree.root_node();
        let outer = root.child(0).unwrap();
        let body = outer.child_by_field_name("body").unwrap();
        let result = analyze_function_body(body, "python", src.as_bytes());
        assert_eq!(result.complexity, 1);
    }
}
