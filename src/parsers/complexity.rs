//! Cyclomatic complexity of Python declarations

use tree_sitter::Node;

/// Node kinds that add one decision point each.
///
/// A `boolean_operator` node is binary, so a chain of n operands holds
/// n - 1 of them. Every `for ... in` clause of a comprehension or generator
/// is its own `for_in_clause`.
const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "except_group_clause",
    "conditional_expression",
    "boolean_operator",
    "for_in_clause",
];

/// Nested scopes that are measured on their own
const NESTED_SCOPES: &[&str] = &[
    "function_definition",
    "class_definition",
    "decorated_definition",
];

/// Complexity of a declaration given its body: 1 plus its decision points
pub fn declaration_complexity(body: Node<'_>) -> u32 {
    1 + decision_points(body)
}

fn decision_points(body: Node<'_>) -> u32 {
    let mut total = 0;
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        for child in (0..node.child_count()).filter_map(|i| node.child(i)) {
            let kind = child.kind();
            if NESTED_SCOPES.contains(&kind) {
                continue;
            }
            if DECISION_KINDS.contains(&kind) {
                total += 1;
            }
            stack.push(child);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn body_complexity(source: &str) -> u32 {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let root = tree.root_node();
        let function = root.child(0).unwrap();
        assert_eq!(function.kind(), "function_definition");
        declaration_complexity(function.child_by_field_name("body").unwrap())
    }

    #[test]
    fn test_straight_line_function_is_one() {
        assert_eq!(body_complexity("def f():\n    return 1\n"), 1);
    }

    #[test]
    fn test_counts_branches_loops_handlers_and_expressions() {
        let source = "\
def f(x, items):
    if x and items:
        return 1
    elif x:
        pass
    for i in items:
        try:
            pass
        except ValueError:
            pass
    y = 1 if x else 2
    return [i for i in items]
";
        assert_eq!(body_complexity(source), 8);
    }

    #[test]
    fn test_boolean_chain_counts_operands_minus_one() {
        let source = "def f(a, b, c, d):\n    return a and b or c and d\n";
        assert_eq!(body_complexity(source), 4);
    }

    #[test]
    fn test_nested_generator_clauses() {
        let source = "def f(rows):\n    return [c for r in rows for c in r]\n";
        assert_eq!(body_complexity(source), 3);
    }

    #[test]
    fn test_nested_function_is_excluded() {
        let source = "\
def outer(x):
    def inner(y):
        if y:
            return 1
        return 0
    while x:
        x -= 1
";
        assert_eq!(body_complexity(source), 2);
    }

    #[test]
    fn test_deep_nesting_is_walked_without_recursion() {
        let depth = 50_000;
        let source = format!(
            "def f(a, b, c):\n    return {}a if b and c else c{}\n",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        assert_eq!(body_complexity(&source), 3);
    }
}
