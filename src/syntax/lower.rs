//! Tree-sitter front end
//!
//! Parses JavaScript with `tree-sitter-javascript` and lowers the concrete
//! syntax tree into the ESTree-shaped [`SyntaxTree`]. Grammar kinds without a
//! dedicated lowering keep their named children under an `Unknown` node so
//! generic traversal still reaches the identifiers inside them.

use super::kind::{Class, Function, LiteralValue, MethodKind, NodeKind, PropertyKind, VariableKind};
use super::{Comment, Node, NodeId, Span, SyntaxTree};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::Chars;
use tree_sitter::{Node as TsNode, Parser};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Lower error regions as `Unknown` nodes instead of failing
    #[serde(default)]
    pub allow_syntax_errors: bool,
}

/// Parse `source` and lower it into a [`SyntaxTree`]
pub fn parse(source: &str, options: &ParseOptions) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| Error::Parser(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Parser("Failed to parse source".to_string()))?;
    let root = tree.root_node();

    if root.has_error() {
        let offset = first_error(root).map(|n| n.start_byte()).unwrap_or(0);
        if !options.allow_syntax_errors {
            return Err(Error::Syntax { offset });
        }
        tracing::warn!(offset, "Recovering from syntax error");
    }

    let mut lowerer = Lowerer::new(source);
    let program = lowerer.lower_program(root);
    let comments = collect_comments(root, source);
    tracing::debug!(nodes = lowerer.nodes.len(), comments = comments.len(), "Lowered syntax tree");

    Ok(SyntaxTree::from_parts(lowerer.nodes, program, comments))
}

fn first_error(root: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

fn collect_comments(root: TsNode<'_>, source: &str) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "comment" {
            comments.push(Comment {
                span: Span::new(node.start_byte(), node.end_byte()),
                text: source.get(node.start_byte()..node.end_byte()).unwrap_or("").to_string(),
            });
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    comments
}

/// Named, non-comment children
fn named<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

/// Whether `node` has a direct anonymous child token `token`
fn has_token(node: TsNode<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn span_of(node: TsNode<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

struct Lowerer<'s> {
    source: &'s str,
    nodes: Vec<Node>,
}

impl<'s> Lowerer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            nodes: Vec::new(),
        }
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    fn text(&self, node: TsNode<'_>) -> &'s str {
        self.source.get(node.start_byte()..node.end_byte()).unwrap_or("")
    }

    /// Placeholder for a child the grammar requires but error recovery dropped
    fn missing(&mut self, at: usize) -> NodeId {
        self.push(
            NodeKind::Unknown {
                type_name: "MISSING".to_string(),
                children: Vec::new(),
            },
            Span::new(at, at),
        )
    }

    fn ident(&mut self, node: TsNode<'_>) -> NodeId {
        let name = self.text(node).to_string();
        self.push(NodeKind::Identifier { name }, span_of(node))
    }

    /// A JSX tag or attribute name that binds nothing
    fn jsx_identifier(&mut self, node: TsNode<'_>) -> NodeId {
        self.push(
            NodeKind::Unknown {
                type_name: "JSXIdentifier".to_string(),
                children: Vec::new(),
            },
            span_of(node),
        )
    }

    /// Tag names starting with a lowercase letter or containing `-` are
    /// intrinsic elements; anything else names a component in scope.
    /// Closing tags repeat the opening name and are not counted again.
    fn lower_jsx_name(&mut self, node: TsNode<'_>, closing: bool) -> NodeId {
        if closing {
            return self.jsx_identifier(node);
        }
        match node.kind() {
            "identifier" => {
                let text = self.text(node);
                let intrinsic =
                    text.starts_with(|c: char| c.is_ascii_lowercase()) || text.contains('-');
                if intrinsic {
                    self.jsx_identifier(node)
                } else {
                    self.ident(node)
                }
            }
            "member_expression" => self.lower(node),
            // older grammars spell `a.b.C` as nested identifiers; only `a` is a reference
            "nested_identifier" => {
                let mut head = node;
                while head.kind() != "identifier" {
                    match named(head).first() {
                        Some(first) => head = *first,
                        None => return self.jsx_identifier(node),
                    }
                }
                let object = self.ident(head);
                self.push(
                    NodeKind::Unknown {
                        type_name: "nested_identifier".to_string(),
                        children: vec![object],
                    },
                    span_of(node),
                )
            }
            _ => self.jsx_identifier(node),
        }
    }

    fn lower_field(&mut self, node: TsNode<'_>, field: &str) -> NodeId {
        match node.child_by_field_name(field) {
            Some(child) => self.lower(child),
            None => self.missing(node.end_byte()),
        }
    }

    fn lower_opt_field(&mut self, node: TsNode<'_>, field: &str) -> Option<NodeId> {
        node.child_by_field_name(field).map(|child| self.lower(child))
    }

    fn lower_first_named(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        named(node).first().map(|child| self.lower(*child))
    }

    fn lower_all(&mut self, nodes: Vec<TsNode<'_>>) -> Vec<NodeId> {
        nodes.into_iter().map(|child| self.lower(child)).collect()
    }

    fn lower_program(&mut self, root: TsNode<'_>) -> NodeId {
        let statements: Vec<_> = named(root)
            .into_iter()
            .filter(|child| child.kind() != "hash_bang_line")
            .collect();
        let body = self.lower_all(statements);
        self.push(NodeKind::Program { body }, Span::new(0, self.source.len()))
    }

    fn lower(&mut self, node: TsNode<'_>) -> NodeId {
        let span = span_of(node);
        let kind = match node.kind() {
            // Statements
            "expression_statement" => {
                let expression = self
                    .lower_first_named(node)
                    .unwrap_or_else(|| self.missing(span.start));
                NodeKind::ExpressionStatement { expression }
            }
            "statement_block" => NodeKind::BlockStatement {
                body: self.lower_all(named(node)),
            },
            "empty_statement" => NodeKind::EmptyStatement,
            "debugger_statement" => NodeKind::DebuggerStatement,
            "return_statement" => NodeKind::ReturnStatement {
                argument: self.lower_first_named(node),
            },
            "throw_statement" => NodeKind::ThrowStatement {
                argument: self.lower_first_named(node),
            },
            "if_statement" => {
                let test = self.lower_field(node, "condition");
                let consequent = self.lower_field(node, "consequence");
                let alternate = node
                    .child_by_field_name("alternative")
                    .and_then(|clause| named(clause).first().copied())
                    .map(|statement| self.lower(statement));
                NodeKind::IfStatement {
                    test,
                    consequent,
                    alternate,
                }
            }
            "switch_statement" => {
                let discriminant = self.lower_field(node, "value");
                let cases = node
                    .child_by_field_name("body")
                    .map(|body| self.lower_all(named(body)))
                    .unwrap_or_default();
                NodeKind::SwitchStatement { discriminant, cases }
            }
            "switch_case" | "switch_default" => {
                let test = self.lower_opt_field(node, "value");
                let mut cursor = node.walk();
                let statements: Vec<_> = node
                    .children_by_field_name("body", &mut cursor)
                    .filter(|child| !child.is_extra())
                    .collect();
                NodeKind::SwitchCase {
                    test,
                    consequent: self.lower_all(statements),
                }
            }
            "try_statement" => {
                let block = self.lower_field(node, "body");
                let handler = self.lower_opt_field(node, "handler");
                let finalizer = node
                    .child_by_field_name("finalizer")
                    .map(|clause| self.lower_field(clause, "body"));
                NodeKind::TryStatement {
                    block,
                    handler,
                    finalizer,
                }
            }
            "catch_clause" => NodeKind::CatchClause {
                param: self.lower_opt_field(node, "parameter"),
                body: self.lower_field(node, "body"),
            },
            "while_statement" => NodeKind::WhileStatement {
                test: self.lower_field(node, "condition"),
                body: self.lower_field(node, "body"),
            },
            "do_statement" => NodeKind::DoWhileStatement {
                body: self.lower_field(node, "body"),
                test: self.lower_field(node, "condition"),
            },
            "with_statement" => NodeKind::WithStatement {
                object: self.lower_field(node, "object"),
                body: self.lower_field(node, "body"),
            },
            "for_statement" => {
                let init = node
                    .child_by_field_name("initializer")
                    .and_then(|clause| self.lower_for_clause(clause));
                let test = node
                    .child_by_field_name("condition")
                    .and_then(|clause| self.lower_for_clause(clause));
                let update = node
                    .child_by_field_name("increment")
                    .and_then(|clause| self.lower_for_clause(clause));
                NodeKind::ForStatement {
                    init,
                    test,
                    update,
                    body: self.lower_field(node, "body"),
                }
            }
            "for_in_statement" => self.lower_for_in(node),
            "labeled_statement" => {
                let label = match node.child_by_field_name("label") {
                    Some(label) => self.ident(label),
                    None => self.missing(span.start),
                };
                NodeKind::LabeledStatement {
                    label,
                    body: self.lower_field(node, "body"),
                }
            }
            "break_statement" => NodeKind::BreakStatement {
                label: node.child_by_field_name("label").map(|label| self.ident(label)),
            },
            "continue_statement" => NodeKind::ContinueStatement {
                label: node.child_by_field_name("label").map(|label| self.ident(label)),
            },

            // Declarations
            "variable_declaration" | "lexical_declaration" => {
                let kind = match node.child_by_field_name("kind").map(|k| self.text(k)) {
                    Some("const") => VariableKind::Const,
                    Some("let") => VariableKind::Let,
                    _ => VariableKind::Var,
                };
                let declarators: Vec<_> = named(node)
                    .into_iter()
                    .filter(|child| child.kind() == "variable_declarator")
                    .collect();
                NodeKind::VariableDeclaration {
                    kind,
                    declarations: self.lower_all(declarators),
                }
            }
            "variable_declarator" => NodeKind::VariableDeclarator {
                id: self.lower_field(node, "name"),
                init: self.lower_opt_field(node, "value"),
            },
            "function_declaration" | "generator_function_declaration" => {
                NodeKind::FunctionDeclaration(self.lower_function(node))
            }
            "function_expression" | "function" | "generator_function" => {
                NodeKind::FunctionExpression(self.lower_function(node))
            }
            "arrow_function" => NodeKind::ArrowFunctionExpression(self.lower_function(node)),
            "class_declaration" => NodeKind::ClassDeclaration(self.lower_class(node)),
            "class" => NodeKind::ClassExpression(self.lower_class(node)),
            "class_body" => {
                let members: Vec<_> = named(node)
                    .into_iter()
                    .filter(|child| child.kind() != "decorator")
                    .collect();
                NodeKind::ClassBody {
                    body: self.lower_all(members),
                }
            }
            "method_definition" => return self.lower_method(node),
            "field_definition" => {
                let (key, computed) = match node.child_by_field_name("property") {
                    Some(key) => self.lower_key(key),
                    None => (self.missing(span.start), false),
                };
                NodeKind::PropertyDefinition {
                    key,
                    value: self.lower_opt_field(node, "value"),
                    computed,
                    is_static: has_token(node, "static"),
                }
            }
            "class_static_block" => {
                let body = node
                    .child_by_field_name("body")
                    .map(|block| self.lower_all(named(block)))
                    .unwrap_or_default();
                NodeKind::StaticBlock { body }
            }

            // Modules
            "import_statement" => self.lower_import(node),
            "export_statement" => self.lower_export(node),
            "export_specifier" => {
                let name = node.child_by_field_name("name");
                let local = match name {
                    Some(name) => self.lower_module_name(name),
                    None => self.missing(span.start),
                };
                let exported = match node.child_by_field_name("alias").or(name) {
                    Some(alias) => self.lower_module_name(alias),
                    None => self.missing(span.start),
                };
                NodeKind::ExportSpecifier { local, exported }
            }

            // Identifiers and literals
            "identifier"
            | "property_identifier"
            | "statement_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "undefined" => NodeKind::Identifier {
                name: self.text(node).to_string(),
            },
            "private_property_identifier" => NodeKind::PrivateIdentifier {
                name: self.text(node).trim_start_matches('#').to_string(),
            },
            "this" => NodeKind::ThisExpression,
            "super" => NodeKind::Super,
            "number" => NodeKind::Literal {
                value: parse_number(self.text(node)),
            },
            "string" => NodeKind::Literal {
                value: LiteralValue::String(unquote(self.text(node))),
            },
            "true" => NodeKind::Literal {
                value: LiteralValue::Boolean(true),
            },
            "false" => NodeKind::Literal {
                value: LiteralValue::Boolean(false),
            },
            "null" => NodeKind::Literal {
                value: LiteralValue::Null,
            },
            "regex" => {
                let pattern = node
                    .child_by_field_name("pattern")
                    .map(|p| self.text(p).to_string())
                    .unwrap_or_default();
                let flags = node
                    .child_by_field_name("flags")
                    .map(|f| self.text(f).to_string())
                    .unwrap_or_default();
                NodeKind::Literal {
                    value: LiteralValue::RegExp { pattern, flags },
                }
            }
            "template_string" => {
                let substitutions: Vec<_> = named(node)
                    .into_iter()
                    .filter(|child| child.kind() == "template_substitution")
                    .filter_map(|child| named(child).first().copied())
                    .collect();
                NodeKind::TemplateLiteral {
                    expressions: self.lower_all(substitutions),
                }
            }

            // Expressions
            "parenthesized_expression" => {
                return match named(node).first() {
                    Some(inner) => self.lower(*inner),
                    None => self.missing(span.start),
                };
            }
            "sequence_expression" => {
                let mut expressions = Vec::new();
                self.collect_sequence(node, &mut expressions);
                NodeKind::SequenceExpression { expressions }
            }
            "array" => NodeKind::ArrayExpression {
                elements: self.lower_sparse(node),
            },
            "array_pattern" => NodeKind::ArrayPattern {
                elements: self.lower_sparse(node),
            },
            "object" | "object_pattern" => {
                let mut properties = Vec::new();
                for child in named(node) {
                    let property = match child.kind() {
                        "pair" | "pair_pattern" => self.lower_pair(child),
                        "shorthand_property_identifier"
                        | "shorthand_property_identifier_pattern" => {
                            self.lower_shorthand(child, None)
                        }
                        "object_assignment_pattern" => self.lower_object_assignment(child),
                        _ => self.lower(child),
                    };
                    properties.push(property);
                }
                if node.kind() == "object" {
                    NodeKind::ObjectExpression { properties }
                } else {
                    NodeKind::ObjectPattern { properties }
                }
            }
            "pair" | "pair_pattern" => return self.lower_pair(node),
            "assignment_pattern" | "object_assignment_pattern" => NodeKind::AssignmentPattern {
                left: self.lower_field(node, "left"),
                right: self.lower_field(node, "right"),
            },
            "rest_pattern" => NodeKind::RestElement {
                argument: self
                    .lower_first_named(node)
                    .unwrap_or_else(|| self.missing(span.end)),
            },
            "spread_element" => NodeKind::SpreadElement {
                argument: self
                    .lower_first_named(node)
                    .unwrap_or_else(|| self.missing(span.end)),
            },
            "member_expression" => NodeKind::MemberExpression {
                object: self.lower_field(node, "object"),
                property: self.lower_field(node, "property"),
                computed: false,
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
            "subscript_expression" => NodeKind::MemberExpression {
                object: self.lower_field(node, "object"),
                property: self.lower_field(node, "index"),
                computed: true,
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
            "call_expression" => self.lower_call(node),
            "new_expression" => {
                let callee = self.lower_field(node, "constructor");
                let arguments = node
                    .child_by_field_name("arguments")
                    .map(|args| self.lower_all(named(args)))
                    .unwrap_or_default();
                NodeKind::NewExpression { callee, arguments }
            }
            "assignment_expression" => NodeKind::AssignmentExpression {
                operator: "=".to_string(),
                left: self.lower_field(node, "left"),
                right: self.lower_field(node, "right"),
            },
            "augmented_assignment_expression" => NodeKind::AssignmentExpression {
                operator: self.operator(node),
                left: self.lower_field(node, "left"),
                right: self.lower_field(node, "right"),
            },
            "binary_expression" => {
                let operator = self.operator(node);
                let left = self.lower_field(node, "left");
                let right = self.lower_field(node, "right");
                if matches!(operator.as_str(), "&&" | "||" | "??") {
                    NodeKind::LogicalExpression { operator, left, right }
                } else {
                    NodeKind::BinaryExpression { operator, left, right }
                }
            }
            "unary_expression" => NodeKind::UnaryExpression {
                operator: self.operator(node),
                argument: self.lower_field(node, "argument"),
            },
            "update_expression" => {
                let prefix = match (
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("argument"),
                ) {
                    (Some(op), Some(arg)) => op.start_byte() < arg.start_byte(),
                    _ => false,
                };
                NodeKind::UpdateExpression {
                    operator: self.operator(node),
                    prefix,
                    argument: self.lower_field(node, "argument"),
                }
            }
            "ternary_expression" => NodeKind::ConditionalExpression {
                test: self.lower_field(node, "condition"),
                consequent: self.lower_field(node, "consequence"),
                alternate: self.lower_field(node, "alternative"),
            },
            "await_expression" => NodeKind::AwaitExpression {
                argument: self
                    .lower_first_named(node)
                    .unwrap_or_else(|| self.missing(span.end)),
            },
            "yield_expression" => NodeKind::YieldExpression {
                argument: self.lower_first_named(node),
                delegate: has_token(node, "*"),
            },
            "meta_property" => {
                let text = self.text(node);
                let (meta, property) = text.split_once('.').unwrap_or((text, ""));
                NodeKind::MetaProperty {
                    meta: meta.trim().to_string(),
                    property: property.trim().to_string(),
                }
            }
            // JSX: only component names and embedded expressions reference bindings
            "jsx_opening_element" | "jsx_self_closing_element" | "jsx_closing_element" => {
                let name = node.child_by_field_name("name");
                let closing = node.kind() == "jsx_closing_element";
                let children = named(node)
                    .into_iter()
                    .map(|child| match name {
                        Some(name) if name == child => self.lower_jsx_name(child, closing),
                        _ => self.lower(child),
                    })
                    .collect();
                NodeKind::Unknown {
                    type_name: node.kind().to_string(),
                    children,
                }
            }
            "jsx_attribute" => {
                let mut children = Vec::new();
                for (i, child) in named(node).into_iter().enumerate() {
                    children.push(if i == 0 {
                        self.jsx_identifier(child)
                    } else {
                        self.lower(child)
                    });
                }
                NodeKind::Unknown {
                    type_name: "jsx_attribute".to_string(),
                    children,
                }
            }
            other => {
                let type_name = if node.is_error() { "ERROR" } else { other };
                tracing::trace!(kind = type_name, start = span.start, "Lowering node generically");
                NodeKind::Unknown {
                    type_name: type_name.to_string(),
                    children: self.lower_all(named(node)),
                }
            }
        };
        self.push(kind, span)
    }

    fn operator(&self, node: TsNode<'_>) -> String {
        node.child_by_field_name("operator")
            .map(|op| self.text(op).to_string())
            .unwrap_or_default()
    }

    /// `for (init; test; update)` clauses arrive as statements or bare expressions
    fn lower_for_clause(&mut self, clause: TsNode<'_>) -> Option<NodeId> {
        match clause.kind() {
            "empty_statement" | ";" => None,
            "expression_statement" => self.lower_first_named(clause),
            _ => Some(self.lower(clause)),
        }
    }

    fn lower_for_in(&mut self, node: TsNode<'_>) -> NodeKind {
        let left = match (node.child_by_field_name("kind"), node.child_by_field_name("left")) {
            (Some(kind_node), Some(target)) => {
                let kind = match self.text(kind_node) {
                    "const" => VariableKind::Const,
                    "let" => VariableKind::Let,
                    _ => VariableKind::Var,
                };
                let id = self.lower(target);
                let init = self.lower_opt_field(node, "value");
                let end = init
                    .map(|init| self.nodes[init.index()].span.end)
                    .unwrap_or(target.end_byte());
                let declarator = self.push(
                    NodeKind::VariableDeclarator { id, init },
                    Span::new(target.start_byte(), end),
                );
                self.push(
                    NodeKind::VariableDeclaration {
                        kind,
                        declarations: vec![declarator],
                    },
                    Span::new(kind_node.start_byte(), end),
                )
            }
            _ => self.lower_field(node, "left"),
        };
        let right = self.lower_field(node, "right");
        let body = self.lower_field(node, "body");
        let is_of = node
            .child_by_field_name("operator")
            .map(|op| self.text(op) == "of")
            .unwrap_or(false);
        if is_of {
            NodeKind::ForOfStatement {
                left,
                right,
                body,
                is_await: has_token(node, "await"),
            }
        } else {
            NodeKind::ForInStatement { left, right, body }
        }
    }

    fn lower_function(&mut self, node: TsNode<'_>) -> Function {
        let id = node.child_by_field_name("name").map(|name| self.ident(name));
        let params = match node.child_by_field_name("parameters") {
            Some(params) => self.lower_params(params),
            None => node
                .child_by_field_name("parameter")
                .map(|param| vec![self.lower(param)])
                .unwrap_or_default(),
        };
        let body = self.lower_field(node, "body");
        Function {
            id,
            params,
            body,
            is_async: has_token(node, "async"),
            is_generator: has_token(node, "*"),
        }
    }

    fn lower_params(&mut self, params: TsNode<'_>) -> Vec<NodeId> {
        let params: Vec<_> = named(params)
            .into_iter()
            .filter(|param| param.kind() != "decorator")
            .collect();
        self.lower_all(params)
    }

    fn lower_class(&mut self, node: TsNode<'_>) -> Class {
        let id = node.child_by_field_name("name").map(|name| self.ident(name));
        let super_class = named(node)
            .into_iter()
            .find(|child| child.kind() == "class_heritage")
            .and_then(|heritage| named(heritage).first().copied())
            .map(|expr| self.lower(expr));
        let body = self.lower_field(node, "body");
        Class {
            id,
            super_class,
            body,
        }
    }

    /// Class methods become `MethodDefinition`, object methods `Property { method }`.
    /// The function value spans parameters and body, as in ESTree.
    fn lower_method(&mut self, node: TsNode<'_>) -> NodeId {
        let (key, computed) = match node.child_by_field_name("name") {
            Some(name) => self.lower_key(name),
            None => (self.missing(node.start_byte()), false),
        };
        let params_node = node.child_by_field_name("parameters");
        let params = params_node
            .map(|params| self.lower_params(params))
            .unwrap_or_default();
        let body = self.lower_field(node, "body");
        let value_start = params_node
            .map(|params| params.start_byte())
            .unwrap_or(node.start_byte());
        let value = self.push(
            NodeKind::FunctionExpression(Function {
                id: None,
                params,
                body,
                is_async: has_token(node, "async"),
                is_generator: has_token(node, "*"),
            }),
            Span::new(value_start, node.end_byte()),
        );

        let is_getter = has_token(node, "get") || has_token(node, "static get");
        let is_setter = has_token(node, "set");
        let in_object = node.parent().map(|p| p.kind() == "object").unwrap_or(false);

        let kind = if in_object {
            NodeKind::Property {
                key,
                value,
                kind: if is_getter {
                    PropertyKind::Get
                } else if is_setter {
                    PropertyKind::Set
                } else {
                    PropertyKind::Init
                },
                computed,
                shorthand: false,
                method: !is_getter && !is_setter,
            }
        } else {
            let is_constructor = !computed
                && matches!(
                    &self.nodes[key.index()].kind,
                    NodeKind::Identifier { name } if name == "constructor"
                );
            NodeKind::MethodDefinition {
                key,
                value,
                kind: if is_constructor {
                    MethodKind::Constructor
                } else if is_getter {
                    MethodKind::Get
                } else if is_setter {
                    MethodKind::Set
                } else {
                    MethodKind::Method
                },
                computed,
                is_static: has_token(node, "static") || has_token(node, "static get"),
            }
        };
        self.push(kind, span_of(node))
    }

    /// Property keys: `(key, computed)`
    fn lower_key(&mut self, key: TsNode<'_>) -> (NodeId, bool) {
        match key.kind() {
            "computed_property_name" => {
                let inner = self
                    .lower_first_named(key)
                    .unwrap_or_else(|| self.missing(key.start_byte()));
                (inner, true)
            }
            "property_identifier" | "identifier" => (self.ident(key), false),
            _ => (self.lower(key), false),
        }
    }

    fn lower_pair(&mut self, node: TsNode<'_>) -> NodeId {
        let (key, computed) = match node.child_by_field_name("key") {
            Some(key) => self.lower_key(key),
            None => (self.missing(node.start_byte()), false),
        };
        let value = self.lower_field(node, "value");
        self.push(
            NodeKind::Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed,
                shorthand: false,
                method: false,
            },
            span_of(node),
        )
    }

    /// `{x}` and `{x = 1}`: key and value are distinct nodes sharing the name's span
    fn lower_shorthand(
        &mut self,
        name: TsNode<'_>,
        default: Option<(TsNode<'_>, TsNode<'_>)>,
    ) -> NodeId {
        let key = self.ident(name);
        let target = self.ident(name);
        let (value, span) = match default {
            Some((whole, right)) => {
                let right = self.lower(right);
                let value = self.push(
                    NodeKind::AssignmentPattern {
                        left: target,
                        right,
                    },
                    span_of(whole),
                );
                (value, span_of(whole))
            }
            None => (target, span_of(name)),
        };
        self.push(
            NodeKind::Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed: false,
                shorthand: true,
                method: false,
            },
            span,
        )
    }

    fn lower_object_assignment(&mut self, node: TsNode<'_>) -> NodeId {
        match (node.child_by_field_name("left"), node.child_by_field_name("right")) {
            (Some(left), Some(right)) if left.kind() == "shorthand_property_identifier_pattern" => {
                self.lower_shorthand(left, Some((node, right)))
            }
            _ => self.lower(node),
        }
    }

    /// Array elements, keeping holes so indexes match the source
    fn lower_sparse(&mut self, node: TsNode<'_>) -> Vec<Option<NodeId>> {
        let mut cursor = node.walk();
        let children: Vec<_> = node
            .children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect();

        let mut elements = Vec::new();
        let mut expecting = true;
        for child in children {
            if child.kind() == "," {
                if expecting {
                    elements.push(None);
                }
                expecting = true;
            } else if child.is_named() {
                elements.push(Some(self.lower(child)));
                expecting = false;
            }
        }
        elements
    }

    fn collect_sequence(&mut self, node: TsNode<'_>, out: &mut Vec<NodeId>) {
        for child in named(node) {
            if child.kind() == "sequence_expression" {
                self.collect_sequence(child, out);
            } else {
                out.push(self.lower(child));
            }
        }
    }

    fn lower_call(&mut self, node: TsNode<'_>) -> NodeKind {
        let function = node.child_by_field_name("function");
        let arguments = node.child_by_field_name("arguments");

        if let Some(function) = function.filter(|f| f.kind() == "import") {
            let source = arguments
                .and_then(|args| self.lower_first_named(args))
                .unwrap_or_else(|| self.missing(function.end_byte()));
            return NodeKind::ImportExpression { source };
        }

        let callee = self.lower_field(node, "function");
        match arguments {
            Some(quasi) if quasi.kind() == "template_string" => NodeKind::TaggedTemplateExpression {
                tag: callee,
                quasi: self.lower(quasi),
            },
            _ => NodeKind::CallExpression {
                callee,
                arguments: arguments
                    .map(|args| self.lower_all(named(args)))
                    .unwrap_or_default(),
                optional: node.child_by_field_name("optional_chain").is_some(),
            },
        }
    }

    /// Module export names are identifiers or string literals
    fn lower_module_name(&mut self, node: TsNode<'_>) -> NodeId {
        if node.kind() == "string" {
            self.lower(node)
        } else {
            self.ident(node)
        }
    }

    fn lower_import(&mut self, node: TsNode<'_>) -> NodeKind {
        let mut specifiers = Vec::new();
        for clause in named(node)
            .into_iter()
            .filter(|child| child.kind() == "import_clause")
        {
            for part in named(clause) {
                match part.kind() {
                    "identifier" => {
                        let local = self.ident(part);
                        let specifier = NodeKind::ImportDefaultSpecifier { local };
                        specifiers.push(self.push(specifier, span_of(part)));
                    }
                    "namespace_import" => {
                        let local = match named(part).first() {
                            Some(name) => self.ident(*name),
                            None => self.missing(part.end_byte()),
                        };
                        let specifier = NodeKind::ImportNamespaceSpecifier { local };
                        specifiers.push(self.push(specifier, span_of(part)));
                    }
                    "named_imports" => {
                        for spec in named(part)
                            .into_iter()
                            .filter(|child| child.kind() == "import_specifier")
                        {
                            let Some(name) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let imported = self.lower_module_name(name);
                            let local = match spec.child_by_field_name("alias") {
                                Some(alias) => self.ident(alias),
                                None => self.ident(name),
                            };
                            let specifier = NodeKind::ImportSpecifier { imported, local };
                            specifiers.push(self.push(specifier, span_of(spec)));
                        }
                    }
                    _ => {}
                }
            }
        }
        let source = self.lower_field(node, "source");
        NodeKind::ImportDeclaration { specifiers, source }
    }

    fn lower_export(&mut self, node: TsNode<'_>) -> NodeKind {
        if let Some(declaration) = node.child_by_field_name("declaration") {
            let declaration = self.lower(declaration);
            return if has_token(node, "default") {
                NodeKind::ExportDefaultDeclaration { declaration }
            } else {
                NodeKind::ExportNamedDeclaration {
                    declaration: Some(declaration),
                    specifiers: Vec::new(),
                    source: None,
                }
            };
        }
        if let Some(value) = node.child_by_field_name("value") {
            return NodeKind::ExportDefaultDeclaration {
                declaration: self.lower(value),
            };
        }

        let children = named(node);
        if let Some(namespace) = children.iter().find(|child| child.kind() == "namespace_export") {
            let exported = named(*namespace)
                .first()
                .map(|name| self.lower_module_name(*name));
            let source = self.lower_field(node, "source");
            return NodeKind::ExportAllDeclaration { exported, source };
        }
        if let Some(clause) = children.iter().find(|child| child.kind() == "export_clause") {
            let specs: Vec<_> = named(*clause)
                .into_iter()
                .filter(|child| child.kind() == "export_specifier")
                .collect();
            let specifiers = self.lower_all(specs);
            let source = self.lower_opt_field(node, "source");
            return NodeKind::ExportNamedDeclaration {
                declaration: None,
                specifiers,
                source,
            };
        }

        let source = self.lower_field(node, "source");
        NodeKind::ExportAllDeclaration {
            exported: None,
            source,
        }
    }
}

fn parse_number(raw: &str) -> LiteralValue {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    if let Some(digits) = cleaned.strip_suffix('n') {
        return LiteralValue::BigInt(digits.to_string());
    }
    let lower = cleaned.to_ascii_lowercase();
    let value = if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok().map(|v| v as f64)
    } else if let Some(octal) = lower.strip_prefix("0o") {
        u64::from_str_radix(octal, 8).ok().map(|v| v as f64)
    } else if let Some(binary) = lower.strip_prefix("0b") {
        u64::from_str_radix(binary, 2).ok().map(|v| v as f64)
    } else {
        lower.parse::<f64>().ok()
    };
    LiteralValue::Number(value.unwrap_or(f64::NAN))
}

/// Exactly `digits` hex digits; `chars` is left untouched when they are missing
fn read_hex(chars: &mut Chars<'_>, digits: usize) -> Option<u32> {
    let mut ahead = chars.clone();
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + ahead.next()?.to_digit(16)?;
    }
    *chars = ahead;
    Some(code)
}

/// Body of a `\u` escape: `XXXX`, `{X...}`, or a `XXXX\uXXXX` surrogate pair.
/// Lone surrogates decode to U+FFFD.
fn read_unicode_escape(chars: &mut Chars<'_>) -> Option<char> {
    let code = if chars.clone().next() == Some('{') {
        let mut ahead = chars.clone();
        ahead.next();
        let mut code = 0u32;
        let mut digits = 0;
        loop {
            match ahead.next()? {
                '}' if digits > 0 => break,
                c => {
                    code = code.checked_mul(16)? + c.to_digit(16)?;
                    digits += 1;
                    if code > 0x10FFFF {
                        return None;
                    }
                }
            }
        }
        *chars = ahead;
        code
    } else {
        read_hex(chars, 4)?
    };

    if (0xD800..0xDC00).contains(&code) {
        let mut ahead = chars.clone();
        if ahead.next() == Some('\\') && ahead.next() == Some('u') {
            let low = read_hex(&mut ahead, 4).filter(|low| (0xDC00..0xE000).contains(low));
            if let Some(low) = low {
                *chars = ahead;
                return char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
            }
        }
    }
    Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
}

fn unquote(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('x') => match read_hex(&mut chars, 2).and_then(char::from_u32) {
                Some(decoded) => out.push(decoded),
                None => out.push('x'),
            },
            Some('u') => match read_unicode_escape(&mut chars) {
                Some(decoded) => out.push(decoded),
                None => out.push('u'),
            },
            // line continuation
            Some('\n') | Some('\u{2028}') | Some('\u{2029}') => {}
            Some('\r') => {
                if chars.clone().next() == Some('\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(source: &str) -> Vec<String> {
        let tree = SyntaxTree::parse(source).unwrap();
        tree.descendants(tree.root())
            .into_iter()
            .map(|id| tree.type_name(id).to_string())
            .collect()
    }

    fn find(tree: &SyntaxTree, type_name: &str) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|id| tree.type_name(*id) == type_name)
            .unwrap()
    }

    #[test]
    fn test_lowers_variable_declarations() {
        assert_eq!(
            types("var x = 23;"),
            vec!["Program", "VariableDeclaration", "VariableDeclarator", "Identifier", "Literal"]
        );

        let tree = SyntaxTree::parse("var x = 23; export { x }").unwrap();
        let declarator = find(&tree, "VariableDeclarator");
        assert_eq!(tree.span(declarator), Span::new(4, 10));
        assert_eq!(tree.span(tree.root()), Span::new(0, 24));
    }

    #[test]
    fn test_unwraps_parentheses() {
        assert_eq!(
            types("(a);"),
            vec!["Program", "ExpressionStatement", "Identifier"]
        );
    }

    #[test]
    fn test_lowers_export_default_function_span() {
        let tree = SyntaxTree::parse("export default async function foo() {}").unwrap();
        let func = find(&tree, "FunctionDeclaration");
        assert_eq!(tree.span(func), Span::new(15, 38));
        let NodeKind::FunctionDeclaration(f) = tree.kind(func) else {
            panic!("expected a function declaration");
        };
        assert!(f.is_async);
        assert_eq!(tree.span(f.id.unwrap()), Span::new(30, 33));
        assert_eq!(tree.type_name(tree.parent(func).unwrap()), "ExportDefaultDeclaration");
    }

    #[test]
    fn test_lowers_shorthand_properties_as_separate_nodes() {
        let tree = SyntaxTree::parse("var {x} = o;").unwrap();
        let property = find(&tree, "Property");
        let NodeKind::Property { key, value, shorthand, .. } = tree.kind(property) else {
            panic!("expected a property");
        };
        assert!(*shorthand);
        assert_ne!(key, value);
        assert_eq!(tree.span(*key), tree.span(*value));
    }

    #[test]
    fn test_keeps_array_holes() {
        let tree = SyntaxTree::parse("var [, b, , d] = list;").unwrap();
        let pattern = find(&tree, "ArrayPattern");
        let NodeKind::ArrayPattern { elements } = tree.kind(pattern) else {
            panic!("expected an array pattern");
        };
        let present: Vec<bool> = elements.iter().map(Option::is_some).collect();
        assert_eq!(present, vec![false, true, false, true]);
    }

    #[test]
    fn test_lowers_class_methods() {
        let tree = SyntaxTree::parse(
            "class Foo extends Bar { constructor(a) { super(a); } static get x() { return 1; } }",
        )
        .unwrap();
        let methods: Vec<_> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.type_name(*id) == "MethodDefinition")
            .collect();
        assert_eq!(methods.len(), 2);
        let NodeKind::MethodDefinition { kind, value, .. } = tree.kind(methods[0]) else {
            panic!("expected a method");
        };
        assert_eq!(*kind, MethodKind::Constructor);
        assert_eq!(tree.type_name(*value), "FunctionExpression");
        let NodeKind::MethodDefinition { kind, is_static, .. } = tree.kind(methods[1]) else {
            panic!("expected a method");
        };
        assert_eq!(*kind, MethodKind::Get);
        assert!(*is_static);
    }

    #[test]
    fn test_lowers_import_and_export_forms() {
        let tree = SyntaxTree::parse(
            "import a, { b as c, d } from './m.js';\nimport * as ns from 'n';\nexport * from 'o';\nexport { e as f } from 'p';",
        )
        .unwrap();
        let body = match tree.kind(tree.root()) {
            NodeKind::Program { body } => body.clone(),
            _ => unreachable!(),
        };
        let kinds: Vec<&str> = body.iter().map(|id| tree.type_name(*id)).collect();
        assert_eq!(
            kinds,
            vec![
                "ImportDeclaration",
                "ImportDeclaration",
                "ExportAllDeclaration",
                "ExportNamedDeclaration"
            ]
        );
        let NodeKind::ImportDeclaration { specifiers, source } = tree.kind(body[0]) else {
            unreachable!()
        };
        let spec_kinds: Vec<&str> = specifiers.iter().map(|id| tree.type_name(*id)).collect();
        assert_eq!(
            spec_kinds,
            vec!["ImportDefaultSpecifier", "ImportSpecifier", "ImportSpecifier"]
        );
        assert_eq!(tree.name_or_string(*source), Some("./m.js"));
    }

    #[test]
    fn test_for_of_head_becomes_declaration() {
        let tree = SyntaxTree::parse("for (const [k, v] of entries) {}").unwrap();
        let stmt = find(&tree, "ForOfStatement");
        let NodeKind::ForOfStatement { left, .. } = tree.kind(stmt) else {
            unreachable!()
        };
        assert_eq!(tree.type_name(*left), "VariableDeclaration");
    }

    #[test]
    fn test_rejects_syntax_errors_unless_allowed() {
        let err = SyntaxTree::parse("var = ;").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));

        let options = ParseOptions {
            allow_syntax_errors: true,
        };
        let tree = SyntaxTree::parse_with("var = ; foo();", &options).unwrap();
        assert!(tree
            .descendants(tree.root())
            .into_iter()
            .any(|id| tree.identifier_name(id) == Some("foo")));
    }

    #[test]
    fn test_collects_comments() {
        let tree = SyntaxTree::parse("/*global foo, bar*/\nfoo(); // trailing").unwrap();
        let texts: Vec<&str> = tree.comments().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["/*global foo, bar*/", "// trailing"]);
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(parse_number("0x1F"), LiteralValue::Number(31.0));
        assert_eq!(parse_number("1_000"), LiteralValue::Number(1000.0));
        assert_eq!(parse_number("10n"), LiteralValue::BigInt("10".to_string()));
        assert_eq!(unquote(r#"'a\'b'"#), "a'b");
        assert_eq!(unquote(r#""./file2.js""#), "./file2.js");
    }

    #[test]
    fn test_unquote_decodes_hex_and_unicode_escapes() {
        assert_eq!(unquote(r#"'\x41\x62c'"#), "Abc");
        assert_eq!(unquote(r#"'caf\u00e9'"#), "café");
        assert_eq!(unquote(r#"'\u{1F600}!'"#), "\u{1F600}!");
        assert_eq!(unquote(r#"'\uD83D\uDE00'"#), "\u{1F600}");
        assert_eq!(unquote(r#"'\uD83D'"#), "\u{FFFD}");
        assert_eq!(unquote(r#"'\xZZ'"#), "xZZ");
        assert_eq!(unquote("'a\\\r\nb'"), "ab");

        let tree = SyntaxTree::parse("import x from './\\u0066ile.js';").unwrap();
        let source = tree
            .descendants(tree.root())
            .into_iter()
            .find_map(|id| match tree.kind(id) {
                NodeKind::ImportDeclaration { source, .. } => Some(*source),
                _ => None,
            })
            .unwrap();
        assert_eq!(tree.name_or_string(source), Some("./file.js"));
    }
}
