//! Queries over a syntax tree and its scope tree
//!
//! - Point queries: scope, node or statement at a source position
//! - Module bindings: import and export tables
//! - Top-level summary: declared and undeclared names of a program

pub mod modules;
pub mod position;
pub mod toplevel;

pub use modules::{exports, imports, ExportBinding, ExportKind, ImportBinding};
pub use position::{
    find_declaration_closest_to_index, find_nodes_including_lines, node_at_index, scope_at_index,
    scopes_at_index, statement_of, statement_path_of,
};
pub use toplevel::{
    find_unknown_global_refs, global_comment_names, top_level_decls_and_refs, top_level_func_decls,
    FuncDeclEntry, TopLevelOptions, TopLevelSummary,
};
