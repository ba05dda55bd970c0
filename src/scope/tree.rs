//! Scope tree data structure
//!
//! One [`Scope`] per function/module boundary, stored in an arena and
//! addressed by [`ScopeId`]. Each scope tracks:
//! - Declarations made directly in the boundary (var/function/class/import)
//! - Parameters and catch bindings
//! - Identifier references and `this` references that belong to it
//! - Child scopes, in source order

use crate::syntax::NodeId;
use serde::Serialize;

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The program scope
    pub fn root() -> Self {
        Self(0)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of boundary a scope represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Program/module root
    Program,
    /// Function declaration, function expression or method
    Function,
    /// Arrow function; has no `this` of its own
    Arrow,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Boundary node: the Program or the function node
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    /// `VariableDeclaration` nodes (var, let and const alike)
    pub var_decls: Vec<NodeId>,
    /// `FunctionDeclaration` nodes
    pub func_decls: Vec<NodeId>,
    /// `ClassDeclaration` nodes
    pub class_decls: Vec<NodeId>,
    /// Identifiers bound by the parameter list
    pub params: Vec<NodeId>,
    /// Identifiers bound by catch clauses
    pub catches: Vec<NodeId>,
    /// `ImportDeclaration` nodes
    pub import_decls: Vec<NodeId>,
    /// `Export*Declaration` nodes
    pub export_decls: Vec<NodeId>,
    /// Identifier references, in source order
    pub refs: Vec<NodeId>,
    /// `ThisExpression` nodes
    pub this_refs: Vec<NodeId>,
    pub sub_scopes: Vec<ScopeId>,
}

impl Scope {
    pub(crate) fn new(id: ScopeId, kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            kind,
            node,
            parent,
            var_decls: Vec::new(),
            func_decls: Vec::new(),
            class_decls: Vec::new(),
            params: Vec::new(),
            catches: Vec::new(),
            import_decls: Vec::new(),
            export_decls: Vec::new(),
            refs: Vec::new(),
            this_refs: Vec::new(),
            sub_scopes: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// All scopes of one syntax tree; index 0 is the program scope
#[derive(Debug, Clone, Serialize)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub(crate) fn from_scopes(scopes: Vec<Scope>) -> Self {
        Self { scopes }
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scopes in creation order, which is pre-order over the tree
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.get(scope).parent
    }

    /// `scope` and its ancestors, innermost first
    pub fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = scope;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// `scope` and everything nested in it, pre-order
    pub fn descendants(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.get(current).sub_scopes.iter().rev().copied());
        }
        out
    }

    /// The scope whose boundary node is `node`
    pub fn scope_of_boundary(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes.iter().find(|scope| scope.node == node).map(|scope| scope.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ScopeTree {
        let mut root = Scope::new(ScopeId::root(), ScopeKind::Program, NodeId(0), None);
        let mut func =
            Scope::new(ScopeId(1), ScopeKind::Function, NodeId(5), Some(ScopeId::root()));
        let arrow = Scope::new(ScopeId(2), ScopeKind::Arrow, NodeId(9), Some(ScopeId(1)));
        let sibling =
            Scope::new(ScopeId(3), ScopeKind::Function, NodeId(12), Some(ScopeId::root()));
        func.sub_scopes.push(ScopeId(2));
        root.sub_scopes.extend([ScopeId(1), ScopeId(3)]);
        ScopeTree::from_scopes(vec![root, func, arrow, sibling])
    }

    #[test]
    fn test_scope_hierarchy() {
        let tree = sample_tree();
        assert!(tree.root().is_root());
        assert_eq!(tree.parent(ScopeId(2)), Some(ScopeId(1)));
        assert_eq!(tree.parent(ScopeId::root()), None);
        assert_eq!(tree.chain(ScopeId(2)), vec![ScopeId(2), ScopeId(1), ScopeId::root()]);
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let tree = sample_tree();
        assert_eq!(
            tree.descendants(ScopeId::root()),
            vec![ScopeId(0), ScopeId(1), ScopeId(2), ScopeId(3)]
        );
        assert_eq!(tree.scope_of_boundary(NodeId(9)), Some(ScopeId(2)));
    }
}
