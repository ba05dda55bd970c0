//! Syntax model - an arena-backed ESTree-shaped tree
//!
//! The scope engine never parses text; it only reads a [`SyntaxTree`]. The
//! [`lower`] module produces one from JavaScript source using tree-sitter.

pub mod kind;
pub mod lines;
pub mod lower;

use serde::Serialize;
use std::fmt;

pub use kind::{
    Class, Field, Function, LiteralValue, MethodKind, NodeKind, PropertyKind, VariableKind,
};
pub use lines::LineIndex;
pub use lower::ParseOptions;

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Half-open byte range `[start, end)` into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One step of a path from the root: a field name or a list index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Name(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Name(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Name(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// A source comment, kept for `/*global ...*/` declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
    comments: Vec<Comment>,
}

impl SyntaxTree {
    /// Assemble a tree from nodes whose parent links are not yet set.
    pub(crate) fn from_parts(mut nodes: Vec<Node>, root: NodeId, comments: Vec<Comment>) -> Self {
        for index in 0..nodes.len() {
            for child in nodes[index].kind.children() {
                nodes[child.index()].parent = Some(NodeId(index as u32));
            }
        }
        Self { nodes, root, comments }
    }

    /// Parse JavaScript source, rejecting input with syntax errors
    pub fn parse(source: &str) -> crate::Result<Self> {
        lower::parse(source, &ParseOptions::default())
    }

    pub fn parse_with(source: &str, options: &ParseOptions) -> crate::Result<Self> {
        lower::parse(source, options)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn type_name(&self, id: NodeId) -> &str {
        self.kind(id).type_name()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Name of an `Identifier` node
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Name of an `Identifier`, or the value of a string `Literal` (module export names)
    pub fn name_or_string(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            NodeKind::Literal { value: LiteralValue::String(value) } => Some(value),
            _ => None,
        }
    }

    /// Parents of `id`, innermost first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Pre-order list of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Field (and index, for lists) under which `child` hangs off its parent
    pub fn step_to(&self, parent: NodeId, child: NodeId) -> Vec<PathSegment> {
        for (name, field) in self.kind(parent).fields() {
            match field {
                Field::One(id) if id == child => return vec![name.into()],
                Field::Many(ids) => {
                    if let Some(index) = ids.iter().position(|id| *id == child) {
                        return vec![name.into(), index.into()];
                    }
                }
                Field::Sparse(ids) => {
                    if let Some(index) = ids.iter().position(|id| *id == Some(child)) {
                        return vec![name.into(), index.into()];
                    }
                }
                _ => {}
            }
        }
        Vec::new()
    }

    /// Path of field names and indexes from the root down to `id`
    pub fn path_to(&self, id: NodeId) -> Vec<PathSegment> {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain.push(id);
        chain
            .windows(2)
            .flat_map(|pair| self.step_to(pair[0], pair[1]))
            .collect()
    }

    /// Follow a path from the root; `None` if any step does not exist
    pub fn node_at_path(&self, path: &[PathSegment]) -> Option<NodeId> {
        let mut current = self.root;
        let mut steps = path.iter();
        while let Some(step) = steps.next() {
            let PathSegment::Name(name) = step else {
                return None;
            };
            let (_, field) = self
                .kind(current)
                .fields()
                .into_iter()
                .find(|(field_name, _)| *field_name == name.as_str())?;
            current = match field {
                Field::One(id) => id,
                Field::Many(ids) => match steps.next()? {
                    PathSegment::Index(index) => *ids.get(*index)?,
                    PathSegment::Name(_) => return None,
                },
                Field::Sparse(ids) => match steps.next()? {
                    PathSegment::Index(index) => (*ids.get(*index)?)?,
                    PathSegment::Name(_) => return None,
                },
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_is_half_open() {
        let span = Span::new(4, 10);
        assert!(span.contains(4));
        assert!(span.contains(9));
        assert!(!span.contains(10));
        assert!(span.contains_span(Span::new(4, 5)));
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn test_path_round_trips_through_node_at_path() {
        let tree =
            SyntaxTree::parse("var x = 3; function foo() { var y = 3; return y + 2 }").unwrap();
        let ret = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.type_name(*id) == "ReturnStatement")
            .unwrap();

        let path = tree.path_to(ret);
        assert_eq!(
            path,
            vec![
                PathSegment::from("body"),
                PathSegment::from(1),
                PathSegment::from("body"),
                PathSegment::from("body"),
                PathSegment::from(1),
            ]
        );
        assert_eq!(tree.node_at_path(&path), Some(ret));
    }

    #[test]
    fn test_parents_are_linked() {
        let tree = SyntaxTree::parse("a.b(c);").unwrap();
        for id in tree.descendants(tree.root()) {
            if id == tree.root() {
                assert!(tree.parent(id).is_none());
            } else {
                let parent = tree.parent(id).unwrap();
                assert!(tree.children(parent).contains(&id));
                assert!(tree.span(parent).contains_span(tree.span(id)));
            }
        }
    }

    #[test]
    fn test_path_segments_serialize_untagged() {
        let path = vec![PathSegment::from("body"), PathSegment::from(1)];
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["body",1]"#);
    }
}
