//! # Lexscope - Lexical scope analysis for JavaScript
//!
//! Builds a scope tree from a JavaScript syntax tree and answers binding
//! questions against it.
//!
//! Lexscope provides:
//! - Tree-sitter based parsing, lowered to an ESTree-shaped syntax tree
//! - Scope tree with declarations, references and `this` references per function
//! - Shadowing-aware name resolution and undeclared-name detection
//! - Point queries (scope, node, statement at a position)
//! - Import/export binding tables for ES modules

pub mod syntax;
pub mod pattern;
pub mod scope;
pub mod query;
pub mod globals;
pub mod analysis;
pub mod output;
pub mod config;
pub mod ignore;
pub mod ui;
pub mod walk;

// Re-exports for convenient access
pub use analysis::Analysis;
pub use config::LexscopeConfig;
pub use globals::KnownGlobals;
pub use pattern::{flatten, PatternEntry};
pub use scope::{build_scopes, NameResolver, Scope, ScopeId, ScopeKind, ScopeTree};
pub use syntax::{NodeId, NodeKind, ParseOptions, PathSegment, Span, SyntaxTree};

/// Result type alias for Lexscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Lexscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error at offset {offset}")]
    Syntax { offset: usize },

    #[error("Invalid binding pattern: {type_name} at offset {offset}")]
    InvalidPattern { type_name: String, offset: usize },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
