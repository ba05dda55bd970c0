//! Scope builder - one traversal from syntax tree to scope tree
//!
//! Declarations attach to the nearest function or program boundary, not to
//! blocks: `let`/`const`/class declarations inside an `if` body belong to the
//! enclosing function just like `var`.

use super::tree::{Scope, ScopeId, ScopeKind, ScopeTree};
use crate::pattern::bound_identifiers;
use crate::syntax::{Function, NodeId, NodeKind, SyntaxTree};
use tracing::debug;

/// Build the scope tree for `tree`
pub fn build_scopes(tree: &SyntaxTree) -> ScopeTree {
    let mut builder = ScopeBuilder::new(tree);
    builder.visit(tree.root());
    debug!(scopes = builder.scopes.len(), "Built scope tree");
    ScopeTree::from_scopes(builder.scopes)
}

struct ScopeBuilder<'a> {
    tree: &'a SyntaxTree,
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl<'a> ScopeBuilder<'a> {
    fn new(tree: &'a SyntaxTree) -> Self {
        Self {
            tree,
            scopes: vec![Scope::new(ScopeId::root(), ScopeKind::Program, tree.root(), None)],
            current: ScopeId::root(),
        }
    }

    fn scope(&mut self) -> &mut Scope {
        &mut self.scopes[self.current.index()]
    }

    /// Nearest enclosing scope that owns `this` (arrows do not)
    fn this_scope(&self) -> ScopeId {
        let mut id = self.current;
        loop {
            let scope = &self.scopes[id.index()];
            match (scope.kind, scope.parent) {
                (ScopeKind::Arrow, Some(parent)) => id = parent,
                _ => return id,
            }
        }
    }

    fn visit(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Identifier { .. } => self.scope().refs.push(node),
            NodeKind::ThisExpression => {
                let owner = self.this_scope();
                self.scopes[owner.index()].this_refs.push(node);
            }

            NodeKind::FunctionDeclaration(function) => {
                if function.id.is_some() {
                    self.scope().func_decls.push(node);
                }
                self.visit_function(node, function, ScopeKind::Function);
            }
            NodeKind::FunctionExpression(function) => {
                self.visit_function(node, function, ScopeKind::Function);
            }
            NodeKind::ArrowFunctionExpression(function) => {
                self.visit_function(node, function, ScopeKind::Arrow);
            }

            NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
                if matches!(tree.kind(node), NodeKind::ClassDeclaration(_)) && class.id.is_some() {
                    self.scope().class_decls.push(node);
                }
                if let Some(super_class) = class.super_class {
                    self.visit(super_class);
                }
                self.visit(class.body);
            }
            NodeKind::MethodDefinition {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.visit(*key);
                }
                self.visit(*value);
            }
            NodeKind::PropertyDefinition {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.visit(*key);
                }
                if let Some(value) = value {
                    self.visit(*value);
                }
            }
            NodeKind::Property {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.visit(*key);
                }
                self.visit(*value);
            }
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                ..
            } => {
                self.visit(*object);
                if *computed {
                    self.visit(*property);
                }
            }

            NodeKind::VariableDeclaration { declarations, .. } => {
                self.scope().var_decls.push(node);
                for declarator in declarations {
                    if let NodeKind::VariableDeclarator { id, init } = tree.kind(*declarator) {
                        self.visit_pattern_expressions(*id);
                        if let Some(init) = init {
                            self.visit(*init);
                        }
                    }
                }
            }
            NodeKind::CatchClause { param, body } => {
                if let Some(param) = param {
                    let names = bound_identifiers(tree, *param);
                    self.scope().catches.extend(names);
                    self.visit_pattern_expressions(*param);
                }
                self.visit(*body);
            }

            NodeKind::LabeledStatement { body, .. } => self.visit(*body),
            NodeKind::BreakStatement { .. }
            | NodeKind::ContinueStatement { .. }
            | NodeKind::MetaProperty { .. }
            | NodeKind::PrivateIdentifier { .. } => {}

            NodeKind::ImportDeclaration { .. } => self.scope().import_decls.push(node),
            NodeKind::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => {
                self.scope().export_decls.push(node);
                if let Some(declaration) = declaration {
                    self.visit(*declaration);
                } else if source.is_none() {
                    for specifier in specifiers {
                        if let NodeKind::ExportSpecifier { local, .. } = tree.kind(*specifier) {
                            if tree.identifier_name(*local).is_some() {
                                self.scope().refs.push(*local);
                            }
                        }
                    }
                }
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                self.scope().export_decls.push(node);
                self.visit(*declaration);
            }
            NodeKind::ExportAllDeclaration { .. } => self.scope().export_decls.push(node),

            kind => {
                for child in kind.children() {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_function(&mut self, node: NodeId, function: &Function, kind: ScopeKind) {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, node, Some(self.current)));
        self.scope().sub_scopes.push(id);

        let parent = std::mem::replace(&mut self.current, id);
        debug!(scope = id.0, parent = parent.0, ?kind, "Entering scope");

        for param in &function.params {
            let names = bound_identifiers(self.tree, *param);
            self.scope().params.extend(names);
            self.visit_pattern_expressions(*param);
        }
        self.visit(function.body);

        self.current = parent;
    }

    /// Default values and computed keys inside a binding pattern are
    /// evaluated in the owning scope; the bound identifiers are not refs.
    fn visit_pattern_expressions(&mut self, pattern: NodeId) {
        let tree = self.tree;
        match tree.kind(pattern) {
            NodeKind::Identifier { .. } => {}
            NodeKind::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.visit_pattern_expressions(*element);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for property in properties {
                    match tree.kind(*property) {
                        NodeKind::Property {
                            key,
                            value,
                            computed,
                            ..
                        } => {
                            if *computed {
                                self.visit(*key);
                            }
                            self.visit_pattern_expressions(*value);
                        }
                        _ => self.visit_pattern_expressions(*property),
                    }
                }
            }
            NodeKind::AssignmentPattern { left, right } => {
                self.visit_pattern_expressions(*left);
                self.visit(*right);
            }
            NodeKind::RestElement { argument } => self.visit_pattern_expressions(*argument),
            _ => self.visit(pattern),
        }
    }
}
