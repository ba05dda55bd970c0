//! Scope tree - lexical binding model
//!
//! The builder walks a syntax tree once and produces a [`ScopeTree`] with one
//! scope per function/program boundary; the resolver answers name lookups
//! against it.

pub mod builder;
pub mod resolver;
pub mod tree;

pub use builder::build_scopes;
pub use resolver::{Binding, BindingKind, NameResolver, RefsAndDecls};
pub use tree::{Scope, ScopeId, ScopeKind, ScopeTree};
