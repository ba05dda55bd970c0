//! Module binding extraction - import and export tables of a program

use crate::scope::{NameResolver, ScopeId, ScopeTree};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use serde::Serialize;

/// One name brought in by an `import` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    pub from_module: String,
    /// Imported name, `"default"` or `"*"`
    pub imported: String,
    pub local: String,
}

/// What kind of local binding an export refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Id,
    Var,
    Function,
    Class,
    Expr,
}

/// One name made visible by an `export` construct
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBinding {
    /// External name, `"default"` or `"*"`
    pub exported: String,
    pub local: Option<String>,
    /// Absent for re-exports, which have no local binding
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExportKind>,
    pub decl: Option<NodeId>,
    pub decl_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<String>,
}

impl ExportBinding {
    fn local(
        exported: String,
        local: Option<String>,
        kind: ExportKind,
        decl: Option<NodeId>,
        decl_id: Option<NodeId>,
    ) -> Self {
        Self {
            exported,
            local,
            kind: Some(kind),
            decl,
            decl_id,
            from_module: None,
            imported: None,
        }
    }

    fn re_export(exported: String, from_module: String, imported: Option<String>) -> Self {
        Self {
            exported,
            local: None,
            kind: None,
            decl: None,
            decl_id: None,
            from_module: Some(from_module),
            imported,
        }
    }

    pub fn is_re_export(&self) -> bool {
        self.from_module.is_some()
    }
}

fn module_name(tree: &SyntaxTree, node: NodeId) -> String {
    tree.name_or_string(node).unwrap_or_default().to_string()
}

/// Import bindings of the program scope, one per specifier in source order
pub fn imports(tree: &SyntaxTree, scopes: &ScopeTree) -> Vec<ImportBinding> {
    let mut result = Vec::new();
    for decl in &scopes.root().import_decls {
        let NodeKind::ImportDeclaration { specifiers, source } = tree.kind(*decl) else {
            continue;
        };
        let from_module = module_name(tree, *source);
        for specifier in specifiers {
            let (imported, local) = match tree.kind(*specifier) {
                NodeKind::ImportDefaultSpecifier { local } => ("default".to_string(), *local),
                NodeKind::ImportNamespaceSpecifier { local } => ("*".to_string(), *local),
                NodeKind::ImportSpecifier { imported, local } => {
                    (module_name(tree, *imported), *local)
                }
                _ => continue,
            };
            result.push(ImportBinding {
                from_module: from_module.clone(),
                imported,
                local: module_name(tree, local),
            });
        }
    }
    result
}

/// Export bindings of the program scope in source order. Re-exports
/// (`export * from`, `export {a} from`) are listed only when
/// `include_re_exports` is set.
pub fn exports(resolver: &NameResolver<'_>, include_re_exports: bool) -> Vec<ExportBinding> {
    let tree = resolver.tree();
    let mut result = Vec::new();

    for decl in &resolver.scopes().root().export_decls {
        match tree.kind(*decl) {
            NodeKind::ExportNamedDeclaration {
                declaration: Some(declaration),
                ..
            } => declaration_exports(tree, *declaration, None, &mut result),

            NodeKind::ExportNamedDeclaration {
                declaration: None,
                specifiers,
                source: Some(source),
            } => {
                if !include_re_exports {
                    continue;
                }
                let from_module = module_name(tree, *source);
                for specifier in specifiers {
                    let NodeKind::ExportSpecifier { local, exported } = tree.kind(*specifier) else {
                        continue;
                    };
                    let imported = module_name(tree, *local);
                    let exported = module_name(tree, *exported);
                    let renamed = (imported != exported).then_some(imported);
                    result.push(ExportBinding::re_export(exported, from_module.clone(), renamed));
                }
            }

            NodeKind::ExportNamedDeclaration {
                declaration: None,
                specifiers,
                source: None,
            } => {
                for specifier in specifiers {
                    let NodeKind::ExportSpecifier { local, exported } = tree.kind(*specifier) else {
                        continue;
                    };
                    let local = module_name(tree, *local);
                    let binding = resolver.resolve_binding(ScopeId::root(), &local);
                    result.push(ExportBinding::local(
                        module_name(tree, *exported),
                        Some(local),
                        ExportKind::Id,
                        binding.map(|b| b.decl),
                        binding.map(|b| b.id),
                    ));
                }
            }

            NodeKind::ExportDefaultDeclaration { declaration } => match tree.kind(*declaration) {
                NodeKind::Identifier { name } => {
                    let binding = resolver.resolve_binding(ScopeId::root(), name);
                    result.push(ExportBinding::local(
                        "default".to_string(),
                        Some(name.clone()),
                        ExportKind::Id,
                        binding.map(|b| b.decl),
                        binding.map(|b| b.id),
                    ));
                }
                NodeKind::FunctionDeclaration(_)
                | NodeKind::FunctionExpression(_)
                | NodeKind::ArrowFunctionExpression(_)
                | NodeKind::ClassDeclaration(_)
                | NodeKind::ClassExpression(_) => {
                    declaration_exports(tree, *declaration, Some("default"), &mut result)
                }
                _ => result.push(ExportBinding::local(
                    "default".to_string(),
                    None,
                    ExportKind::Expr,
                    Some(*declaration),
                    Some(*declaration),
                )),
            },

            NodeKind::ExportAllDeclaration { exported, source } => {
                if !include_re_exports {
                    continue;
                }
                let name = exported
                    .map(|exported| module_name(tree, exported))
                    .unwrap_or_else(|| "*".to_string());
                let imported = exported.map(|_| "*".to_string());
                result.push(ExportBinding::re_export(name, module_name(tree, *source), imported));
            }

            _ => {}
        }
    }
    result
}

/// Exports of an inline declaration; `exported_as` overrides the external name
fn declaration_exports(
    tree: &SyntaxTree,
    declaration: NodeId,
    exported_as: Option<&str>,
    out: &mut Vec<ExportBinding>,
) {
    let named = |id: Option<NodeId>| id.and_then(|id| tree.identifier_name(id)).map(str::to_string);

    match tree.kind(declaration) {
        NodeKind::VariableDeclaration { declarations, .. } => {
            for declarator in declarations {
                let NodeKind::VariableDeclarator { id, .. } = tree.kind(*declarator) else {
                    continue;
                };
                for name_id in crate::pattern::bound_identifiers(tree, *id) {
                    let Some(name) = tree.identifier_name(name_id) else { continue };
                    out.push(ExportBinding::local(
                        name.to_string(),
                        Some(name.to_string()),
                        ExportKind::Var,
                        Some(*declarator),
                        Some(name_id),
                    ));
                }
            }
        }
        kind => {
            let (id, export_kind) = match kind {
                NodeKind::FunctionDeclaration(f)
                | NodeKind::FunctionExpression(f)
                | NodeKind::ArrowFunctionExpression(f) => (f.id, ExportKind::Function),
                NodeKind::ClassDeclaration(c) | NodeKind::ClassExpression(c) => {
                    (c.id, ExportKind::Class)
                }
                _ => return,
            };
            let local = named(id);
            let Some(exported) = exported_as.map(str::to_string).or_else(|| local.clone()) else {
                return;
            };
            out.push(ExportBinding::local(exported, local, export_kind, Some(declaration), id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::build_scopes;
    use crate::syntax::{LiteralValue, Span};

    fn im(source: &str) -> Vec<ImportBinding> {
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        imports(&tree, &scopes)
    }

    /// Exports with `(type, start, end)` of decl and declId resolved
    fn ex(source: &str) -> Vec<(ExportBinding, Option<(String, Span)>, Option<Span>)> {
        let tree = SyntaxTree::parse(source).unwrap();
        let scopes = build_scopes(&tree);
        let resolver = NameResolver::new(&tree, &scopes);
        exports(&resolver, true)
            .into_iter()
            .map(|binding| {
                let decl = binding.decl.map(|d| (tree.type_name(d).to_string(), tree.span(d)));
                let decl_id = binding.decl_id.map(|d| tree.span(d));
                (binding, decl, decl_id)
            })
            .collect()
    }

    fn import(from: &str, imported: &str, local: &str) -> ImportBinding {
        ImportBinding {
            from_module: from.to_string(),
            imported: imported.to_string(),
            local: local.to_string(),
        }
    }

    #[test]
    fn test_imports() {
        assert_eq!(
            im("import { y as yyy } from './file2.js';"),
            vec![import("./file2.js", "y", "yyy")]
        );
        assert_eq!(im("import z from './file2.js';"), vec![import("./file2.js", "default", "z")]);
        assert_eq!(
            im("import * as file2 from './file2.js';"),
            vec![import("./file2.js", "*", "file2")]
        );
        assert_eq!(
            im("import a, { b, c as d } from 'm';"),
            vec![import("m", "default", "a"), import("m", "b", "b"), import("m", "c", "d")]
        );
    }

    #[test]
    fn test_exports_of_ids() {
        let cases = [
            ("var x = 23; export { x }", "x"),
            ("var x = 23; export { x as y }", "y"),
        ];
        for (source, exported) in cases {
            let result = ex(source);
            assert_eq!(result.len(), 1);
            let (binding, decl, decl_id) = &result[0];
            assert_eq!(binding.exported, exported);
            assert_eq!(binding.local.as_deref(), Some("x"));
            assert_eq!(binding.kind, Some(ExportKind::Id));
            assert_eq!(decl, &Some(("VariableDeclarator".to_string(), Span::new(4, 10))));
            assert_eq!(decl_id, &Some(Span::new(4, 5)));
        }
    }

    #[test]
    fn test_exports_of_referenced_function() {
        let result = ex("function x() {}; export { x }");
        let (binding, decl, decl_id) = &result[0];
        assert_eq!(binding.kind, Some(ExportKind::Id));
        assert_eq!(decl, &Some(("FunctionDeclaration".to_string(), Span::new(0, 15))));
        assert_eq!(decl_id, &Some(Span::new(9, 10)));
    }

    #[test]
    fn test_exports_of_var_decls() {
        let result = ex("export var x = 23, y = 42;");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0.exported, "x");
        assert_eq!(result[0].0.kind, Some(ExportKind::Var));
        assert_eq!(result[0].1, Some(("VariableDeclarator".to_string(), Span::new(11, 17))));
        assert_eq!(result[0].2, Some(Span::new(11, 12)));
        assert_eq!(result[1].0.local.as_deref(), Some("y"));
        assert_eq!(result[1].1, Some(("VariableDeclarator".to_string(), Span::new(19, 25))));
        assert_eq!(result[1].2, Some(Span::new(19, 20)));
    }

    #[test]
    fn test_re_exports() {
        let result = ex("export * from './file1.js'");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0.exported, "*");
        assert_eq!(result[0].0.local, None);
        assert_eq!(result[0].0.from_module.as_deref(), Some("./file1.js"));

        let result = ex("export { x } from './file1.js';");
        assert_eq!(result[0].0.exported, "x");
        assert_eq!(result[0].0.imported, None);
        assert_eq!(result[0].0.local, None);

        let result = ex("export { x as y } from './file1.js';");
        assert_eq!(result[0].0.exported, "y");
        assert_eq!(result[0].0.imported.as_deref(), Some("x"));
        assert_eq!(result[0].0.from_module.as_deref(), Some("./file1.js"));
    }

    #[test]
    fn test_re_exports_can_be_left_out() {
        let tree =
            SyntaxTree::parse("export * from 'a'; export { b } from 'c'; export const d = 1;")
                .unwrap();
        let scopes = build_scopes(&tree);
        let resolver = NameResolver::new(&tree, &scopes);
        let result = exports(&resolver, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].exported, "d");
        assert!(!result[0].is_re_export());
    }

    #[test]
    fn test_exports_of_functions_and_classes() {
        let cases = [
            (
                "export function bar() {}",
                "bar",
                "bar",
                ExportKind::Function,
                "FunctionDeclaration",
                Span::new(7, 24),
                Span::new(16, 19),
            ),
            (
                "export default async function foo() {}",
                "default",
                "foo",
                ExportKind::Function,
                "FunctionDeclaration",
                Span::new(15, 38),
                Span::new(30, 33),
            ),
            (
                "export class Baz {}",
                "Baz",
                "Baz",
                ExportKind::Class,
                "ClassDeclaration",
                Span::new(7, 19),
                Span::new(13, 16),
            ),
            (
                "export default class Baz {}",
                "default",
                "Baz",
                ExportKind::Class,
                "ClassDeclaration",
                Span::new(15, 27),
                Span::new(21, 24),
            ),
        ];
        for (source, exported, local, kind, decl_type, decl_span, id_span) in cases {
            let result = ex(source);
            assert_eq!(result.len(), 1, "{}", source);
            let (binding, decl, decl_id) = &result[0];
            assert_eq!(binding.exported, exported);
            assert_eq!(binding.local.as_deref(), Some(local));
            assert_eq!(binding.kind, Some(kind));
            assert_eq!(decl, &Some((decl_type.to_string(), decl_span)));
            assert_eq!(decl_id, &Some(id_span));
        }
    }

    #[test]
    fn test_default_exports_of_ids_and_expressions() {
        let result = ex("var x = 23; export default x;");
        let (binding, decl, decl_id) = &result[0];
        assert_eq!(binding.exported, "default");
        assert_eq!(binding.local.as_deref(), Some("x"));
        assert_eq!(binding.kind, Some(ExportKind::Id));
        assert_eq!(decl, &Some(("VariableDeclarator".to_string(), Span::new(4, 10))));
        assert_eq!(decl_id, &Some(Span::new(4, 5)));

        let tree = SyntaxTree::parse("export default 12;").unwrap();
        let scopes = build_scopes(&tree);
        let resolver = NameResolver::new(&tree, &scopes);
        let result = exports(&resolver, true);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, Some(ExportKind::Expr));
        assert_eq!(result[0].local, None);
        let literal = result[0].decl_id.unwrap();
        assert_eq!(result[0].decl, Some(literal));
        assert_eq!(tree.span(literal), Span::new(15, 17));
        assert!(matches!(
            tree.kind(literal),
            NodeKind::Literal { value: LiteralValue::Number(n) } if *n == 12.0
        ));
    }

    #[test]
    fn test_export_binding_json_shape() {
        let result = ex("export { x as y } from './file1.js';");
        let json = serde_json::to_value(&result[0].0).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "exported": "y",
                "local": null,
                "decl": null,
                "declId": null,
                "fromModule": "./file1.js",
                "imported": "x"
            })
        );
    }
}
