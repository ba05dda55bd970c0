//! One analysed source file: text, syntax tree and scope tree together

use crate::globals::KnownGlobals;
use crate::query::{self, ExportBinding, ImportBinding, TopLevelOptions, TopLevelSummary};
use crate::scope::{build_scopes, NameResolver, ScopeTree};
use crate::syntax::{LineIndex, NodeId, ParseOptions, SyntaxTree};
use crate::Result;

/// Parsed source plus its scope tree. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Analysis {
    source: String,
    tree: SyntaxTree,
    scopes: ScopeTree,
}

impl Analysis {
    /// Parse and analyse `source`, rejecting syntax errors
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        Self::parse_with(source, &ParseOptions::default())
    }

    pub fn parse_with(source: impl Into<String>, options: &ParseOptions) -> Result<Self> {
        let source = source.into();
        let tree = SyntaxTree::parse_with(&source, options)?;
        Ok(Self::from_tree(source, tree))
    }

    /// Analyse an already lowered tree of `source`
    pub fn from_tree(source: String, tree: SyntaxTree) -> Self {
        let scopes = build_scopes(&tree);
        tracing::debug!(
            bytes = source.len(),
            nodes = tree.len(),
            scopes = scopes.len(),
            "Analysed source"
        );
        Self { source, tree, scopes }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn resolver(&self) -> NameResolver<'_> {
        NameResolver::new(&self.tree, &self.scopes)
    }

    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.source)
    }

    pub fn imports(&self) -> Vec<ImportBinding> {
        query::imports(&self.tree, &self.scopes)
    }

    pub fn exports(&self, include_re_exports: bool) -> Vec<ExportBinding> {
        query::exports(&self.resolver(), include_re_exports)
    }

    pub fn undeclared_names(&self) -> Vec<String> {
        self.resolver().undeclared_names()
    }

    pub fn global_var_refs(&self) -> Vec<NodeId> {
        self.resolver().find_global_var_refs()
    }

    /// Global refs minus well-known host globals
    pub fn unknown_global_refs(&self, known: &KnownGlobals) -> Vec<NodeId> {
        query::find_unknown_global_refs(&self.resolver(), known)
    }

    pub fn top_level(&self, options: &TopLevelOptions) -> TopLevelSummary {
        query::top_level_decls_and_refs(&self.resolver(), options)
    }

    pub fn declaration_closest_to_index(&self, name: &str, index: usize) -> Option<NodeId> {
        query::find_declaration_closest_to_index(&self.resolver(), name, index)
    }

    /// Source text of a node
    pub fn text(&self, node: NodeId) -> &str {
        let span = self.tree.span(node);
        self.source.get(span.start..span.end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_analysis_end_to_end() {
        let analysis =
            Analysis::parse("import z from './file2.js';\nexport default z;\nz + missing;")
                .unwrap();
        assert_eq!(analysis.imports().len(), 1);
        assert_eq!(analysis.exports(true).len(), 1);
        assert_eq!(analysis.undeclared_names(), vec!["missing"]);

        let refs = analysis.global_var_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(analysis.text(refs[0]), "missing");
    }

    #[test]
    fn test_parse_errors_surface_offsets() {
        let err = Analysis::parse("function (").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));

        let options = ParseOptions {
            allow_syntax_errors: true,
        };
        assert!(Analysis::parse_with("var ok = 1; )", &options).is_ok());
    }

    #[test]
    fn test_references_survive_error_recovery() {
        let options = ParseOptions {
            allow_syntax_errors: true,
        };
        let source = "var ok = 1;\nif (lost ok) { found(); }";
        assert!(Analysis::parse(source).is_err());
        let analysis = Analysis::parse_with(source, &options).unwrap();

        let undeclared = analysis.undeclared_names();
        assert!(undeclared.contains(&"lost".to_string()), "{:?}", undeclared);
        assert!(undeclared.contains(&"found".to_string()), "{:?}", undeclared);
        assert!(!undeclared.contains(&"ok".to_string()), "{:?}", undeclared);
    }

    #[test]
    fn test_analyses_are_independent_across_threads() {
        let sources = ["var a = b;", "function f() { return c; }", "d(e);"];
        let results: Vec<Vec<String>> = std::thread::scope(|s| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| s.spawn(move || Analysis::parse(*source).unwrap().undeclared_names()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, vec![vec!["b"], vec!["c"], vec!["d", "e"]]);
    }
}
