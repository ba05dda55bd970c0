//! Destructuring pattern flattener
//!
//! Walks a binding pattern (identifier, array/object pattern, rest, default)
//! and yields each bound name together with the path that reaches it.

use crate::syntax::{LiteralValue, NodeId, NodeKind, PathSegment, SyntaxTree};
use crate::{Error, Result};
use serde::Serialize;

/// One name (or, with `leaf_only = false`, one sub-pattern) inside a pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternEntry {
    pub path: Vec<PathSegment>,
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Anything that is not a binding pattern is a contract violation
    Strict,
    /// Skip what is not a binding pattern
    Lenient,
    /// Object/array literals; any other expression is a leaf
    Literal,
}

/// Flatten a binding pattern into `(path, node)` entries in source order.
///
/// Fails with [`Error::InvalidPattern`] when `pattern` (or anything nested in
/// it) is not a valid binding-pattern kind.
pub fn flatten(
    tree: &SyntaxTree,
    pattern: NodeId,
    prefix: &[PathSegment],
    leaf_only: bool,
) -> Result<Vec<PatternEntry>> {
    let mut walker = Walker::new(tree, Mode::Strict, leaf_only);
    walker.walk(pattern, &mut prefix.to_vec(), true)?;
    Ok(walker.out)
}

/// Identifiers bound by a pattern. Parts that are not binding patterns
/// (possible in recovered parse trees) are skipped.
pub fn bound_identifiers(tree: &SyntaxTree, pattern: NodeId) -> Vec<NodeId> {
    let mut walker = Walker::new(tree, Mode::Lenient, true);
    // Lenient mode never fails
    let _ = walker.walk(pattern, &mut Vec::new(), true);
    walker.out.into_iter().map(|entry| entry.node).collect()
}

/// Flatten an object or array literal into its property paths. Leaves are
/// the property values, whatever expression they are.
pub fn object_properties_as_list(
    tree: &SyntaxTree,
    object: NodeId,
    prefix: &[PathSegment],
    leaf_only: bool,
) -> Vec<PatternEntry> {
    let mut walker = Walker::new(tree, Mode::Literal, leaf_only);
    let _ = walker.walk(object, &mut prefix.to_vec(), true);
    walker.out
}

/// Label for a property key in a path: identifier name, string or number
/// literal, or `[computed]`
pub fn key_label(tree: &SyntaxTree, key: NodeId, computed: bool) -> String {
    if computed {
        return "[computed]".to_string();
    }
    match tree.kind(key) {
        NodeKind::Identifier { name } | NodeKind::PrivateIdentifier { name } => name.clone(),
        NodeKind::Literal { value: LiteralValue::String(value) } => value.clone(),
        NodeKind::Literal {
            value: LiteralValue::Number(n),
        } if n.fract() == 0.0 && n.is_finite() => {
            format!("{}", *n as i64)
        }
        NodeKind::Literal { value: LiteralValue::Number(n) } => n.to_string(),
        _ => "[computed]".to_string(),
    }
}

struct Walker<'a> {
    tree: &'a SyntaxTree,
    mode: Mode,
    leaf_only: bool,
    out: Vec<PatternEntry>,
}

impl<'a> Walker<'a> {
    fn new(tree: &'a SyntaxTree, mode: Mode, leaf_only: bool) -> Self {
        Self {
            tree,
            mode,
            leaf_only,
            out: Vec::new(),
        }
    }

    fn emit(&mut self, path: &[PathSegment], node: NodeId) {
        self.out.push(PatternEntry {
            path: path.to_vec(),
            node,
        });
    }

    /// Intermediate (non-leaf) nodes are listed only when asked for, and never the root
    fn emit_intermediate(&mut self, path: &[PathSegment], node: NodeId, is_root: bool) {
        if !self.leaf_only && !is_root {
            self.emit(path, node);
        }
    }

    fn walk(&mut self, node: NodeId, path: &mut Vec<PathSegment>, is_root: bool) -> Result<()> {
        let tree = self.tree;
        match (tree.kind(node), self.mode) {
            (NodeKind::Identifier { .. }, Mode::Strict | Mode::Lenient) => {
                self.emit(path, node);
            }
            (NodeKind::ArrayPattern { elements }, Mode::Strict | Mode::Lenient)
            | (NodeKind::ArrayExpression { elements }, Mode::Literal) => {
                self.emit_intermediate(path, node, is_root);
                for (index, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    path.push(PathSegment::Index(index));
                    self.walk(*element, path, false)?;
                    path.pop();
                }
            }
            (NodeKind::ObjectPattern { properties }, Mode::Strict | Mode::Lenient)
            | (NodeKind::ObjectExpression { properties }, Mode::Literal) => {
                self.emit_intermediate(path, node, is_root);
                for property in properties {
                    match tree.kind(*property) {
                        NodeKind::Property {
                            key, value, computed, ..
                        } => {
                            path.push(PathSegment::Name(key_label(tree, *key, *computed)));
                            self.walk(*value, path, false)?;
                            path.pop();
                        }
                        NodeKind::RestElement { argument } => self.walk(*argument, path, false)?,
                        // spread in literals contributes no named path
                        _ if self.mode == Mode::Literal => {}
                        _ => self.walk(*property, path, false)?,
                    }
                }
            }
            (NodeKind::AssignmentPattern { left, .. }, Mode::Strict | Mode::Lenient) => {
                self.walk(*left, path, is_root)?;
            }
            (NodeKind::RestElement { argument }, Mode::Strict | Mode::Lenient) => {
                self.walk(*argument, path, is_root)?;
            }
            (_, Mode::Literal) => {
                if !is_root {
                    self.emit(path, node);
                }
            }
            (_, Mode::Lenient) => {}
            (kind, Mode::Strict) => {
                return Err(Error::InvalidPattern {
                    type_name: kind.type_name().to_string(),
                    offset: tree.span(node).start,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// First declarator's binding pattern
    fn declarator_id(tree: &SyntaxTree) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find_map(|id| match tree.kind(id) {
                NodeKind::VariableDeclarator { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap()
    }

    fn names(tree: &SyntaxTree, entries: &[PatternEntry]) -> Vec<String> {
        entries
            .iter()
            .filter_map(|entry| tree.identifier_name(entry.node).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_flatten_nested_object_pattern() {
        let tree = SyntaxTree::parse("var {x, y: [{z}]} = {x: 3, y: [{z: 4}]};").unwrap();
        let entries = flatten(&tree, declarator_id(&tree), &[], true).unwrap();
        assert_eq!(names(&tree, &entries), vec!["x", "z"]);
        assert_eq!(entries[0].path, vec![PathSegment::from("x")]);
        assert_eq!(
            entries[1].path,
            vec![PathSegment::from("y"), PathSegment::from(0), PathSegment::from("z")]
        );
    }

    #[test]
    fn test_flatten_array_rest_and_defaults() {
        let tree = SyntaxTree::parse("var [head = 1, ...inner] = list;").unwrap();
        let entries = flatten(&tree, declarator_id(&tree), &[], true).unwrap();
        assert_eq!(names(&tree, &entries), vec!["head", "inner"]);
        assert_eq!(entries[0].path, vec![PathSegment::from(0)]);
        assert_eq!(entries[1].path, vec![PathSegment::from(1)]);
    }

    #[test]
    fn test_flatten_with_intermediates() {
        let tree = SyntaxTree::parse("var {a: {b}, c} = o;").unwrap();
        let entries =
            flatten(&tree, declarator_id(&tree), &[PathSegment::from("o")], false).unwrap();
        let types: Vec<&str> = entries.iter().map(|e| tree.type_name(e.node)).collect();
        assert_eq!(types, vec!["ObjectPattern", "Identifier", "Identifier"]);
        assert_eq!(entries[0].path, vec![PathSegment::from("o"), PathSegment::from("a")]);
    }

    #[test]
    fn test_flatten_rejects_non_patterns() {
        let tree = SyntaxTree::parse("f(1);").unwrap();
        let call = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.type_name(*id) == "CallExpression")
            .unwrap();
        let err = flatten(&tree, call, &[], true).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPattern { ref type_name, .. } if type_name == "CallExpression"
        ));
        assert!(bound_identifiers(&tree, call).is_empty());
    }

    #[test]
    fn test_object_properties_as_list() {
        let tree = SyntaxTree::parse("var o = {a: 1, b: {c: [2, 3]}};").unwrap();
        let object = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.type_name(*id) == "ObjectExpression")
            .unwrap();

        let leaves = object_properties_as_list(&tree, object, &[], true);
        let paths: Vec<String> = leaves
            .iter()
            .map(|e| e.path.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("."))
            .collect();
        assert_eq!(paths, vec!["a", "b.c.0", "b.c.1"]);

        let all = object_properties_as_list(&tree, object, &[], false);
        assert_eq!(all.len(), 5);
    }
}
