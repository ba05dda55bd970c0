//! Point queries - from a source position to scopes, nodes and statements

use crate::scope::{NameResolver, ScopeId, ScopeTree};
use crate::syntax::{LineIndex, NodeId, NodeKind, PathSegment, Span, SyntaxTree};

/// Range of a scope used for position lookups. For functions it starts at
/// the first parameter (or the body), so an index on the function's name
/// or keyword still belongs to the enclosing scope.
pub fn search_span(tree: &SyntaxTree, scopes: &ScopeTree, scope: ScopeId) -> Span {
    let node = scopes.get(scope).node;
    let span = tree.span(node);
    match tree.kind(node).as_function() {
        Some(function) => {
            let start = function
                .params
                .first()
                .map(|param| tree.span(*param).start)
                .unwrap_or_else(|| tree.span(function.body).start);
            Span::new(start, span.end)
        }
        None => span,
    }
}

/// Chain of scopes containing `index`, root first. Never empty; an index
/// outside every function yields just the root.
pub fn scopes_at_index(tree: &SyntaxTree, scopes: &ScopeTree, index: usize) -> Vec<ScopeId> {
    let mut chain = vec![ScopeId::root()];
    let mut current = ScopeId::root();
    while let Some(child) = scopes
        .get(current)
        .sub_scopes
        .iter()
        .copied()
        .find(|child| search_span(tree, scopes, *child).contains(index))
    {
        chain.push(child);
        current = child;
    }
    chain
}

/// Innermost scope containing `index`
pub fn scope_at_index(tree: &SyntaxTree, scopes: &ScopeTree, index: usize) -> ScopeId {
    scopes_at_index(tree, scopes, index)
        .last()
        .copied()
        .unwrap_or_else(ScopeId::root)
}

/// Identifier declaring the `name` visible at `index`, or `None` for a
/// free (global) name
pub fn find_declaration_closest_to_index(
    resolver: &NameResolver<'_>,
    name: &str,
    index: usize,
) -> Option<NodeId> {
    let scope = scope_at_index(resolver.tree(), resolver.scopes(), index);
    resolver.resolve_binding(scope, name).map(|binding| binding.id)
}

/// Innermost node whose range contains `index`; the root when none does
pub fn node_at_index(tree: &SyntaxTree, index: usize) -> NodeId {
    let mut current = tree.root();
    while let Some(child) = tree
        .children(current)
        .into_iter()
        .find(|child| tree.span(*child).contains(index))
    {
        current = child;
    }
    current
}

/// Every node spanning all of the given 1-based `lines`, in pre-order
/// starting at the root
pub fn find_nodes_including_lines(tree: &SyntaxTree, source: &str, lines: &[usize]) -> Vec<NodeId> {
    let index = LineIndex::new(source);
    let covers = |node: NodeId| {
        let (first, last) = index.lines_of(tree.span(node));
        lines.iter().all(|line| first <= *line && *line <= last)
    };

    let mut found = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if !covers(node) {
            continue;
        }
        found.push(node);
        stack.extend(tree.children(node).into_iter().rev());
    }
    found
}

/// `VariableDeclaration` heads of `for` loops are not statements of their own
fn is_loop_head(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::ForStatement { init, .. } => *init == Some(node),
        NodeKind::ForInStatement { left, .. } | NodeKind::ForOfStatement { left, .. } => {
            *left == node
        }
        _ => false,
    }
}

/// Smallest statement enclosing `target` (possibly `target` itself)
pub fn statement_of(tree: &SyntaxTree, target: NodeId) -> Option<NodeId> {
    std::iter::once(target)
        .chain(tree.ancestors(target))
        .find(|node| tree.kind(*node).is_statement() && !is_loop_head(tree, *node))
}

/// Path from the root to [`statement_of`]`(target)`
pub fn statement_path_of(tree: &SyntaxTree, target: NodeId) -> Option<Vec<PathSegment>> {
    statement_of(tree, target).map(|statement| tree.path_to(statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::build_scopes;

    fn at_path(tree: &SyntaxTree, path: &[PathSegment]) -> NodeId {
        tree.node_at_path(path).unwrap()
    }

    fn path(steps: &[&str]) -> Vec<PathSegment> {
        steps
            .iter()
            .map(|step| match step.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::from(*step),
            })
            .collect()
    }

    #[test]
    fn test_scopes_at_index() {
        let source = "var x = {\n  f: function(a) {\n  return function(a) { return a + 1};\n  },\n  f2: function() {}\n}";
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        let index = source.find("return").unwrap();
        let first = scopes.root().sub_scopes[0];
        assert_eq!(scopes_at_index(&tree, &scopes, index), vec![ScopeId::root(), first]);
        assert_eq!(scopes_at_index(&tree, &scopes, 10_000), vec![ScopeId::root()]);
    }

    #[test]
    fn test_scope_at_index_on_function_name_and_params() {
        let source = "var x = \"fooo\"; function bar() { var z = \"baz\" }";
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        assert_eq!(scope_at_index(&tree, &scopes, 26), ScopeId::root());
        assert_eq!(scope_at_index(&tree, &scopes, 34), scopes.root().sub_scopes[0]);

        let source = "var x = \"fooo\"; function bar(zork) { var z = zork + \"baz\"; }";
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        assert_eq!(scope_at_index(&tree, &scopes, 31), scopes.root().sub_scopes[0]);
    }

    #[test]
    fn test_find_declaration_closest_to_index() {
        let source = "var x = 3, yyy = 4;\nvar z = function() { yyy + yyy + (function(yyy) { yyy+1 })(); }";
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        let resolver = NameResolver::new(&tree, &scopes);

        let outer = find_declaration_closest_to_index(&resolver, "yyy", 48).unwrap();
        assert_eq!(tree.span(outer), Span::new(11, 14));
        let inner = find_declaration_closest_to_index(&resolver, "yyy", 73).unwrap();
        assert_eq!(tree.span(inner), Span::new(63, 66));
        assert!(find_declaration_closest_to_index(&resolver, "nope", 73).is_none());
    }

    #[test]
    fn test_find_nodes_including_lines() {
        let source = "var x = {\n  f: function(a) {\n   return 23;\n  }\n}\n";
        let tree = SyntaxTree::parse(source).unwrap();
        let types = |lines: &[usize]| -> Vec<String> {
            find_nodes_including_lines(&tree, source, lines)
                .into_iter()
                .map(|id| tree.type_name(id).to_string())
                .collect()
        };
        assert_eq!(
            types(&[3]),
            vec![
                "Program",
                "VariableDeclaration",
                "VariableDeclarator",
                "ObjectExpression",
                "Property",
                "FunctionExpression",
                "BlockStatement",
                "ReturnStatement",
                "Literal"
            ]
        );
        assert_eq!(
            types(&[3, 5]),
            vec!["Program", "VariableDeclaration", "VariableDeclarator", "ObjectExpression"]
        );
    }

    #[test]
    fn test_statement_of() {
        let cases: &[(&str, &[&str], &[&str])] = &[
            (
                "var x = 3; function foo() { var y = 3; return y + 2 }; x + foo();",
                &["body", "1", "body", "body", "1", "argument", "left"],
                &["body", "1", "body", "body", "1"],
            ),
            ("var x = 1; x;", &["body", "1"], &["body", "1"]),
            (
                "switch (123) { case 123: debugger; }",
                &["body", "0", "cases", "0", "consequent", "0"],
                &["body", "0", "cases", "0", "consequent", "0"],
            ),
            (
                "if (true) { var a = 1; }",
                &["body", "0", "consequent", "body", "0", "declarations", "0"],
                &["body", "0", "consequent", "body", "0"],
            ),
            (
                "if (true) var a = 1;",
                &["body", "0", "consequent", "declarations", "0", "id"],
                &["body", "0", "consequent"],
            ),
            ("if (true) var a = 2;", &["body", "0", "test"], &["body", "0"]),
            (
                "export default class Foo {}",
                &["body", "0", "declaration", "id"],
                &["body", "0", "declaration"],
            ),
            ("a;", &["body", "0", "expression"], &["body", "0"]),
            (
                "for (var i = 0; i < 3; i++) {}",
                &["body", "0", "init", "declarations", "0"],
                &["body", "0"],
            ),
        ];
        for (source, target, expected) in cases {
            let tree = SyntaxTree::parse(source).unwrap();
            let target = at_path(&tree, &path(target));
            let expected = at_path(&tree, &path(expected));
            assert_eq!(statement_of(&tree, target), Some(expected), "{}", source);
        }
    }

    #[test]
    fn test_statement_path_of() {
        let tree =
            SyntaxTree::parse("var x = 3; function foo() { var y = 3; return y + 2 }; x + foo();")
                .unwrap();
        let target = at_path(&tree, &path(&["body", "1", "body", "body", "1", "argument", "left"]));
        assert_eq!(
            statement_path_of(&tree, target),
            Some(path(&["body", "1", "body", "body", "1"]))
        );
    }

    #[test]
    fn test_node_at_index() {
        let tree = SyntaxTree::parse("foo(bar);").unwrap();
        let node = node_at_index(&tree, 5);
        assert_eq!(tree.identifier_name(node), Some("bar"));
        assert_eq!(node_at_index(&tree, 100), tree.root());
    }
}
