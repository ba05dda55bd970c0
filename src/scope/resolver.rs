//! Name Resolver - Resolves references to declarations
//!
//! Resolution algorithm:
//! 1. Collect the bindings each scope declares
//! 2. Walk outward from the reference's scope
//! 3. The first scope declaring the name wins
//! 4. No declaring scope → the reference is global

use super::tree::{ScopeId, ScopeKind, ScopeTree};
use crate::pattern::bound_identifiers;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use serde::Serialize;
use std::collections::HashSet;

/// How a name got bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    /// Name of a function or class expression, visible inside it only
    SelfName,
    Function,
    Param,
    Class,
    Import,
    Var,
    Catch,
}

/// A declared name within one scope
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    pub name: String,
    /// The identifier that introduces the name
    pub id: NodeId,
    /// The declaring construct (declarator, function, class, specifier, ...)
    pub decl: NodeId,
    pub kind: BindingKind,
}

/// Declaration and reference sites of one name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefsAndDecls {
    pub decls: Vec<NodeId>,
    pub refs: Vec<NodeId>,
}

/// Name resolver over a scope tree
pub struct NameResolver<'a> {
    tree: &'a SyntaxTree,
    scopes: &'a ScopeTree,
    /// Bindings per scope, indexed by `ScopeId`
    bindings: Vec<Vec<Binding>>,
    /// Declared names per scope, first occurrence order
    declared: Vec<Vec<String>>,
}

impl<'a> NameResolver<'a> {
    /// Create a new resolver
    pub fn new(tree: &'a SyntaxTree, scopes: &'a ScopeTree) -> Self {
        let bindings: Vec<Vec<Binding>> = scopes
            .iter()
            .map(|scope| collect_bindings(tree, scopes, scope.id))
            .collect();
        let declared = scopes
            .iter()
            .map(|scope| {
                let own_name = own_function_name(tree, scope.node);
                let mut seen = HashSet::new();
                own_name
                    .into_iter()
                    .chain(bindings[scope.id.index()].iter().map(|b| b.name.clone()))
                    .filter(|name| seen.insert(name.clone()))
                    .collect()
            })
            .collect();
        Self {
            tree,
            scopes,
            bindings,
            declared,
        }
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn scopes(&self) -> &'a ScopeTree {
        self.scopes
    }

    /// Bindings introduced directly in `scope`
    pub fn bindings(&self, scope: ScopeId) -> &[Binding] {
        &self.bindings[scope.index()]
    }

    /// Names declared in `scope`: own function name, function declarations,
    /// params, classes, imports, vars, catch params; duplicates dropped
    pub fn declared_names(&self, scope: ScopeId) -> &[String] {
        &self.declared[scope.index()]
    }

    pub fn declares(&self, scope: ScopeId, name: &str) -> bool {
        self.declared[scope.index()].iter().any(|declared| declared == name)
    }

    /// Nearest scope in the chain from `scope` outward declaring `name`
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.scopes
            .chain(scope)
            .into_iter()
            .find(|candidate| self.declares(*candidate, name))
    }

    /// The binding `name` refers to from inside `scope`. When one scope
    /// declares the name several times, the last declaration in source order wins.
    pub fn resolve_binding(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        self.scopes.chain(scope).into_iter().find_map(|candidate| {
            self.bindings(candidate)
                .iter()
                .filter(|binding| binding.name == name)
                .max_by_key(|binding| self.tree.span(binding.id).start)
        })
    }

    /// Every reference in the tree paired with the scope it belongs to, in source order
    fn all_refs(&self) -> Vec<(ScopeId, NodeId)> {
        let mut refs: Vec<(ScopeId, NodeId)> = self
            .scopes
            .iter()
            .flat_map(|scope| scope.refs.iter().map(move |id| (scope.id, *id)))
            .collect();
        refs.sort_by_key(|(_, id)| self.tree.span(*id).start);
        refs
    }

    /// References that no enclosing scope declares, in source order, not deduplicated
    pub fn find_global_var_refs(&self) -> Vec<NodeId> {
        self.all_refs()
            .into_iter()
            .filter(|(scope, id)| {
                self.tree
                    .identifier_name(*id)
                    .map(|name| {
                        self.resolve(*scope, name).is_none()
                            && !self.in_class_named(*scope, *id, name)
                    })
                    .unwrap_or(false)
            })
            .map(|(_, id)| id)
            .collect()
    }

    /// Whether `id` sits in a field initializer or heritage clause of a class
    /// expression named `name`, which `scope` itself does not see
    fn in_class_named(&self, scope: ScopeId, id: NodeId, name: &str) -> bool {
        let boundary = self.scopes.get(scope).node;
        enclosing_class_expression(self.tree, id, boundary, name).is_some()
    }

    /// Distinct names of [`find_global_var_refs`](Self::find_global_var_refs),
    /// first occurrence order
    pub fn undeclared_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.find_global_var_refs()
            .into_iter()
            .filter_map(|id| self.tree.identifier_name(id))
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Declarations and references of `name` in `scope` and in every
    /// sub-scope that does not declare `name` itself. For `"this"` only the
    /// scope's own `this` references are returned.
    pub fn find_references_and_decls_in_scope(&self, scope: ScopeId, name: &str) -> RefsAndDecls {
        if name == "this" {
            return RefsAndDecls {
                decls: Vec::new(),
                refs: self.scopes.get(scope).this_refs.clone(),
            };
        }

        let mut result = RefsAndDecls::default();
        self.collect_refs_and_decls(scope, name, &mut result);
        result.decls.sort_by_key(|id| self.tree.span(*id).start);
        result.refs.sort_by_key(|id| self.tree.span(*id).start);
        result
    }

    fn collect_refs_and_decls(&self, scope: ScopeId, name: &str, out: &mut RefsAndDecls) {
        out.decls.extend(
            self.bindings(scope)
                .iter()
                .filter(|binding| binding.name == name)
                .map(|binding| binding.id),
        );
        out.refs.extend(
            self.scopes
                .get(scope)
                .refs
                .iter()
                .filter(|id| self.tree.identifier_name(**id) == Some(name)),
        );
        for child in &self.scopes.get(scope).sub_scopes {
            let shadows = self.bindings(*child).iter().any(|binding| binding.name == name);
            if !shadows {
                self.collect_refs_and_decls(*child, name, out);
            }
        }
    }
}

/// Name of a named function boundary node
fn own_function_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    tree.kind(node)
        .as_function()
        .and_then(|function| function.id)
        .and_then(|id| tree.identifier_name(id))
        .map(str::to_string)
}

/// Named class expression called `name` that encloses `node` without
/// crossing `boundary`
fn enclosing_class_expression(
    tree: &SyntaxTree,
    node: NodeId,
    boundary: NodeId,
    name: &str,
) -> Option<NodeId> {
    tree.ancestors(node)
        .take_while(|ancestor| *ancestor != boundary)
        .find(|ancestor| match tree.kind(*ancestor) {
            NodeKind::ClassExpression(class) => {
                class.id.and_then(|id| tree.identifier_name(id)) == Some(name)
            }
            _ => false,
        })
}

fn collect_bindings(tree: &SyntaxTree, scopes: &ScopeTree, scope_id: ScopeId) -> Vec<Binding> {
    let scope = scopes.get(scope_id);
    let mut bindings = Vec::new();
    let mut push = |id: NodeId, decl: NodeId, kind: BindingKind| {
        if let Some(name) = tree.identifier_name(id) {
            bindings.push(Binding {
                name: name.to_string(),
                id,
                decl,
                kind,
            });
        }
    };

    // A function declaration's name is bound in the enclosing scope already
    if let NodeKind::FunctionExpression(function) = tree.kind(scope.node) {
        if let (Some(id), ScopeKind::Function) = (function.id, scope.kind) {
            push(id, scope.node, BindingKind::SelfName);
        }
    }
    // Methods and other functions directly inside a named class expression see its name
    if let Some(parent) = scope.parent {
        let boundary = scopes.get(parent).node;
        for ancestor in tree.ancestors(scope.node).take_while(|ancestor| *ancestor != boundary) {
            if let NodeKind::ClassExpression(class) = tree.kind(ancestor) {
                if let Some(id) = class.id {
                    push(id, ancestor, BindingKind::SelfName);
                }
            }
        }
    }
    for decl in &scope.func_decls {
        if let Some(id) = tree.kind(*decl).as_function().and_then(|f| f.id) {
            push(id, *decl, BindingKind::Function);
        }
    }
    for param in &scope.params {
        push(*param, scope.node, BindingKind::Param);
    }
    for decl in &scope.class_decls {
        if let Some(id) = tree.kind(*decl).as_class().and_then(|c| c.id) {
            push(id, *decl, BindingKind::Class);
        }
    }
    for import in &scope.import_decls {
        if let NodeKind::ImportDeclaration { specifiers, .. } = tree.kind(*import) {
            for specifier in specifiers {
                let local = match tree.kind(*specifier) {
                    NodeKind::ImportSpecifier { local, .. }
                    | NodeKind::ImportDefaultSpecifier { local }
                    | NodeKind::ImportNamespaceSpecifier { local } => *local,
                    _ => continue,
                };
                push(local, *specifier, BindingKind::Import);
            }
        }
    }
    for decl in &scope.var_decls {
        if let NodeKind::VariableDeclaration { declarations, .. } = tree.kind(*decl) {
            for declarator in declarations {
                if let NodeKind::VariableDeclarator { id, .. } = tree.kind(*declarator) {
                    for name in bound_identifiers(tree, *id) {
                        push(name, *declarator, BindingKind::Var);
                    }
                }
            }
        }
    }
    for id in &scope.catches {
        let clause = tree
            .ancestors(*id)
            .find(|ancestor| matches!(tree.kind(*ancestor), NodeKind::CatchClause { .. }))
            .unwrap_or(*id);
        push(*id, clause, BindingKind::Catch);
    }
    bindings
}
