//! Top-level summary of a program: what it declares and what it leaves free

use crate::globals::KnownGlobals;
use crate::scope::{NameResolver, ScopeId};
use crate::syntax::{NodeId, PathSegment, SyntaxTree};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopLevelOptions {
    /// Treat names listed in `/*global a, b*/` comments as declared
    #[serde(default)]
    pub jslint_global_comment: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelSummary {
    pub var_decls: Vec<NodeId>,
    pub func_decls: Vec<NodeId>,
    pub class_decls: Vec<NodeId>,
    pub declared_names: Vec<String>,
    pub undeclared_names: Vec<String>,
    /// Program refs, then refs of nested scopes those scopes do not declare
    pub refs: Vec<NodeId>,
    pub this_refs: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDeclEntry {
    pub node: NodeId,
    pub path: Vec<PathSegment>,
}

fn global_comment_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^/\*\s*globals?\s+(.*?)\*/$").ok())
        .as_ref()
}

/// Names declared by jslint-style `/*global a, b: true*/` comments
pub fn global_comment_names(tree: &SyntaxTree) -> Vec<String> {
    let Some(re) = global_comment_regex() else {
        return Vec::new();
    };
    tree.comments()
        .iter()
        .filter_map(|comment| re.captures(&comment.text))
        .flat_map(|captures| {
            captures[1]
                .split(',')
                .filter_map(|entry| entry.split(':').next())
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Declarations, free names and references of the program scope
pub fn top_level_decls_and_refs(
    resolver: &NameResolver<'_>,
    options: &TopLevelOptions,
) -> TopLevelSummary {
    let tree = resolver.tree();
    let root = resolver.scopes().root();

    let comment_globals = if options.jslint_global_comment {
        global_comment_names(tree)
    } else {
        Vec::new()
    };

    let mut seen = HashSet::new();
    let declared_names: Vec<String> = resolver
        .declared_names(ScopeId::root())
        .iter()
        .chain(comment_globals.iter())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect();

    let undeclared_names = resolver
        .undeclared_names()
        .into_iter()
        .filter(|name| !comment_globals.contains(name))
        .collect();

    let mut refs = root.refs.clone();
    for child in &root.sub_scopes {
        refs.extend(leftover_refs(resolver, *child));
    }

    TopLevelSummary {
        var_decls: root.var_decls.clone(),
        func_decls: root.func_decls.clone(),
        class_decls: root.class_decls.clone(),
        declared_names,
        undeclared_names,
        refs,
        this_refs: root.this_refs.clone(),
    }
}

/// Refs of `scope` and its descendants that `scope` itself does not declare
fn leftover_refs(resolver: &NameResolver<'_>, scope: ScopeId) -> Vec<NodeId> {
    let tree = resolver.tree();
    let current = resolver.scopes().get(scope);
    let mut refs = current.refs.clone();
    for child in &current.sub_scopes {
        refs.extend(leftover_refs(resolver, *child));
    }
    refs.retain(|id| {
        tree.identifier_name(*id)
            .map(|name| !resolver.declares(scope, name))
            .unwrap_or(true)
    });
    refs
}

/// Function declarations of the program scope with their paths
pub fn top_level_func_decls(resolver: &NameResolver<'_>) -> Vec<FuncDeclEntry> {
    let tree = resolver.tree();
    resolver
        .scopes()
        .root()
        .func_decls
        .iter()
        .map(|node| FuncDeclEntry {
            node: *node,
            path: tree.path_to(*node),
        })
        .collect()
}

/// Unresolved references whose name is not a known host global
pub fn find_unknown_global_refs(resolver: &NameResolver<'_>, known: &KnownGlobals) -> Vec<NodeId> {
    let tree = resolver.tree();
    resolver
        .find_global_var_refs()
        .into_iter()
        .filter(|id| {
            tree.identifier_name(*id)
                .map(|name| !known.contains(name))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{build_scopes, ScopeTree};

    fn analyse(source: &str) -> (SyntaxTree, ScopeTree) {
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        (tree, scopes)
    }

    fn names(tree: &SyntaxTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| tree.identifier_name(*id).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_decls_and_refs_in_top_level_scope() {
        let (tree, scopes) = analyse(
            "var x = 3;\n function baz(y) { var zork; return xxx + zork + x + y; }\nvar y = 4, z;\nbar = 'foo';",
        );
        let resolver = NameResolver::new(&tree, &scopes);
        let summary = top_level_decls_and_refs(&resolver, &TopLevelOptions::default());

        assert_eq!(summary.var_decls.len(), 2);
        assert_eq!(summary.func_decls.len(), 1);
        assert_eq!(summary.declared_names, vec!["baz", "x", "y", "z"]);
        assert_eq!(names(&tree, &summary.refs), vec!["bar", "xxx", "x"]);
        assert_eq!(summary.undeclared_names, vec!["xxx", "bar"]);
    }

    #[test]
    fn test_this_refs() {
        let (tree, scopes) = analyse("this.foo = this.bar;");
        let resolver = NameResolver::new(&tree, &scopes);
        let summary = top_level_decls_and_refs(&resolver, &TopLevelOptions::default());
        let starts: Vec<usize> = summary.this_refs.iter().map(|id| tree.span(*id).start).collect();
        assert_eq!(starts, vec![0, 11]);
    }

    #[test]
    fn test_async_function_declared_names() {
        let (tree, scopes) = analyse("async function foo() { return 23 }\nvar x = await foo();");
        let resolver = NameResolver::new(&tree, &scopes);
        let summary = top_level_decls_and_refs(&resolver, &TopLevelOptions::default());
        assert_eq!(summary.declared_names, vec!["foo", "x"]);
    }

    #[test]
    fn test_jslint_global_comment() {
        let source = "/*global foo, bar: true*/\nfoo(); bar(); baz();";
        let (tree, scopes) = analyse(source);
        let resolver = NameResolver::new(&tree, &scopes);

        let plain = top_level_decls_and_refs(&resolver, &TopLevelOptions::default());
        assert_eq!(plain.undeclared_names, vec!["foo", "bar", "baz"]);

        let options = TopLevelOptions {
            jslint_global_comment: true,
        };
        let summary = top_level_decls_and_refs(&resolver, &options);
        assert_eq!(summary.undeclared_names, vec!["baz"]);
        assert_eq!(summary.declared_names, vec!["foo", "bar"]);
    }

    #[test]
    fn test_top_level_func_decls() {
        let (tree, scopes) = analyse(
            "var baz = function zork() { function barf() {} }\nfunction foo() { function bar() {}; }",
        );
        let resolver = NameResolver::new(&tree, &scopes);
        let decls = top_level_func_decls(&resolver);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].path, vec![PathSegment::from("body"), PathSegment::from(1)]);
        assert_eq!(tree.node_at_path(&decls[0].path), Some(decls[0].node));
    }

    #[test]
    fn test_unknown_global_refs_skip_host_globals() {
        let (tree, scopes) = analyse("foo + String(baz) + console.log(foo);");
        let resolver = NameResolver::new(&tree, &scopes);
        let refs = find_unknown_global_refs(&resolver, &KnownGlobals::default());
        assert_eq!(names(&tree, &refs), vec!["foo", "baz", "foo"]);
    }
}
