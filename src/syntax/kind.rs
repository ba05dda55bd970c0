//! Node kinds - one variant per ESTree construct
//!
//! The scope engine matches exhaustively on the kinds it gives meaning to and
//! falls back to [`NodeKind::fields`] for everything else, so constructs it
//! knows nothing about are still traversed.

use super::NodeId;

/// `var`, `let` or `const`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

/// The value of a `Literal` node
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    BigInt(String),
    Boolean(bool),
    Null,
    RegExp { pattern: String, flags: String },
}

/// Shared shape of function declarations, expressions and arrows
#[derive(Debug, Clone)]
pub struct Function {
    pub id: Option<NodeId>,
    pub params: Vec<NodeId>,
    /// A `BlockStatement`, or any expression for concise arrow bodies
    pub body: NodeId,
    pub is_async: bool,
    pub is_generator: bool,
}

/// Shared shape of class declarations and expressions
#[derive(Debug, Clone)]
pub struct Class {
    pub id: Option<NodeId>,
    pub super_class: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },

    // Statements
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement {
        argument: Option<NodeId>,
    },
    ThrowStatement {
        argument: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        body: NodeId,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
        is_await: bool,
    },
    LabeledStatement {
        label: NodeId,
        body: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    WithStatement {
        object: NodeId,
        body: NodeId,
    },

    // Declarations
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    FunctionDeclaration(Function),
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    ClassDeclaration(Class),
    ClassExpression(Class),
    ClassBody {
        body: Vec<NodeId>,
    },
    MethodDefinition {
        key: NodeId,
        value: NodeId,
        kind: MethodKind,
        computed: bool,
        is_static: bool,
    },
    PropertyDefinition {
        key: NodeId,
        value: Option<NodeId>,
        computed: bool,
        is_static: bool,
    },
    StaticBlock {
        body: Vec<NodeId>,
    },

    // Modules
    ImportDeclaration {
        specifiers: Vec<NodeId>,
        source: NodeId,
    },
    ImportSpecifier {
        imported: NodeId,
        local: NodeId,
    },
    ImportDefaultSpecifier {
        local: NodeId,
    },
    ImportNamespaceSpecifier {
        local: NodeId,
    },
    ExportNamedDeclaration {
        declaration: Option<NodeId>,
        specifiers: Vec<NodeId>,
        source: Option<NodeId>,
    },
    ExportSpecifier {
        local: NodeId,
        exported: NodeId,
    },
    ExportDefaultDeclaration {
        declaration: NodeId,
    },
    ExportAllDeclaration {
        exported: Option<NodeId>,
        source: NodeId,
    },

    // Expressions
    Identifier {
        name: String,
    },
    PrivateIdentifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    TemplateLiteral {
        expressions: Vec<NodeId>,
    },
    TaggedTemplateExpression {
        tag: NodeId,
        quasi: NodeId,
    },
    ThisExpression,
    Super,
    ArrayExpression {
        elements: Vec<Option<NodeId>>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        computed: bool,
        shorthand: bool,
        method: bool,
    },
    SpreadElement {
        argument: NodeId,
    },
    UnaryExpression {
        operator: String,
        argument: NodeId,
    },
    UpdateExpression {
        operator: String,
        prefix: bool,
        argument: NodeId,
    },
    BinaryExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    AssignmentExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
        optional: bool,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
        optional: bool,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    AwaitExpression {
        argument: NodeId,
    },
    YieldExpression {
        argument: Option<NodeId>,
        delegate: bool,
    },
    MetaProperty {
        meta: String,
        property: String,
    },
    ImportExpression {
        source: NodeId,
    },

    // Patterns
    ArrayPattern {
        elements: Vec<Option<NodeId>>,
    },
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    AssignmentPattern {
        left: NodeId,
        right: NodeId,
    },
    RestElement {
        argument: NodeId,
    },

    /// Anything without dedicated semantics (JSX, decorators, error recovery)
    Unknown {
        type_name: String,
        children: Vec<NodeId>,
    },
}

/// One child slot of a node, as seen by generic traversal
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    One(NodeId),
    Many(&'a [NodeId]),
    /// A list that may contain holes, e.g. `[a, , b]`
    Sparse(&'a [Option<NodeId>]),
}

impl Field<'_> {
    pub fn ids(&self) -> Vec<NodeId> {
        match self {
            Field::One(id) => vec![*id],
            Field::Many(ids) => ids.to_vec(),
            Field::Sparse(ids) => ids.iter().flatten().copied().collect(),
        }
    }
}

fn push_opt<'a>(
    fields: &mut Vec<(&'static str, Field<'a>)>,
    name: &'static str,
    id: &Option<NodeId>,
) {
    if let Some(id) = id {
        fields.push((name, Field::One(*id)));
    }
}

impl NodeKind {
    /// ESTree `type` string for this node
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::ForOfStatement { .. } => "ForOfStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::WithStatement { .. } => "WithStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeKind::FunctionExpression(_) => "FunctionExpression",
            NodeKind::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
            NodeKind::ClassDeclaration(_) => "ClassDeclaration",
            NodeKind::ClassExpression(_) => "ClassExpression",
            NodeKind::ClassBody { .. } => "ClassBody",
            NodeKind::MethodDefinition { .. } => "MethodDefinition",
            NodeKind::PropertyDefinition { .. } => "PropertyDefinition",
            NodeKind::StaticBlock { .. } => "StaticBlock",
            NodeKind::ImportDeclaration { .. } => "ImportDeclaration",
            NodeKind::ImportSpecifier { .. } => "ImportSpecifier",
            NodeKind::ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
            NodeKind::ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
            NodeKind::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            NodeKind::ExportSpecifier { .. } => "ExportSpecifier",
            NodeKind::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            NodeKind::ExportAllDeclaration { .. } => "ExportAllDeclaration",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::PrivateIdentifier { .. } => "PrivateIdentifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::TemplateLiteral { .. } => "TemplateLiteral",
            NodeKind::TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::Super => "Super",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::SpreadElement { .. } => "SpreadElement",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::AwaitExpression { .. } => "AwaitExpression",
            NodeKind::YieldExpression { .. } => "YieldExpression",
            NodeKind::MetaProperty { .. } => "MetaProperty",
            NodeKind::ImportExpression { .. } => "ImportExpression",
            NodeKind::ArrayPattern { .. } => "ArrayPattern",
            NodeKind::ObjectPattern { .. } => "ObjectPattern",
            NodeKind::AssignmentPattern { .. } => "AssignmentPattern",
            NodeKind::RestElement { .. } => "RestElement",
            NodeKind::Unknown { type_name, .. } => type_name,
        }
    }

    /// Child slots with their ESTree field names, in source order.
    pub fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        let mut fields = Vec::new();
        match self {
            NodeKind::Program { body }
            | NodeKind::BlockStatement { body }
            | NodeKind::ClassBody { body }
            | NodeKind::StaticBlock { body } => fields.push(("body", Field::Many(body))),
            NodeKind::ExpressionStatement { expression } => {
                fields.push(("expression", Field::One(*expression)))
            }
            NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::Identifier { .. }
            | NodeKind::PrivateIdentifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::ThisExpression
            | NodeKind::Super
            | NodeKind::MetaProperty { .. } => {}
            NodeKind::ReturnStatement { argument } | NodeKind::ThrowStatement { argument } => {
                push_opt(&mut fields, "argument", argument)
            }
            NodeKind::IfStatement { test, consequent, alternate } => {
                fields.push(("test", Field::One(*test)));
                fields.push(("consequent", Field::One(*consequent)));
                push_opt(&mut fields, "alternate", alternate);
            }
            NodeKind::SwitchStatement { discriminant, cases } => {
                fields.push(("discriminant", Field::One(*discriminant)));
                fields.push(("cases", Field::Many(cases)));
            }
            NodeKind::SwitchCase { test, consequent } => {
                push_opt(&mut fields, "test", test);
                fields.push(("consequent", Field::Many(consequent)));
            }
            NodeKind::TryStatement { block, handler, finalizer } => {
                fields.push(("block", Field::One(*block)));
                push_opt(&mut fields, "handler", handler);
                push_opt(&mut fields, "finalizer", finalizer);
            }
            NodeKind::CatchClause { param, body } => {
                push_opt(&mut fields, "param", param);
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::WhileStatement { test, body } => {
                fields.push(("test", Field::One(*test)));
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::DoWhileStatement { body, test } => {
                fields.push(("body", Field::One(*body)));
                fields.push(("test", Field::One(*test)));
            }
            NodeKind::ForStatement { init, test, update, body } => {
                push_opt(&mut fields, "init", init);
                push_opt(&mut fields, "test", test);
                push_opt(&mut fields, "update", update);
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::ForInStatement { left, right, body }
            | NodeKind::ForOfStatement { left, right, body, .. } => {
                fields.push(("left", Field::One(*left)));
                fields.push(("right", Field::One(*right)));
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::LabeledStatement { label, body } => {
                fields.push(("label", Field::One(*label)));
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                push_opt(&mut fields, "label", label)
            }
            NodeKind::WithStatement { object, body } => {
                fields.push(("object", Field::One(*object)));
                fields.push(("body", Field::One(*body)));
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                fields.push(("declarations", Field::Many(declarations)))
            }
            NodeKind::VariableDeclarator { id, init } => {
                fields.push(("id", Field::One(*id)));
                push_opt(&mut fields, "init", init);
            }
            NodeKind::FunctionDeclaration(func)
            | NodeKind::FunctionExpression(func)
            | NodeKind::ArrowFunctionExpression(func) => {
                push_opt(&mut fields, "id", &func.id);
                fields.push(("params", Field::Many(&func.params)));
                fields.push(("body", Field::One(func.body)));
            }
            NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => {
                push_opt(&mut fields, "id", &class.id);
                push_opt(&mut fields, "superClass", &class.super_class);
                fields.push(("body", Field::One(class.body)));
            }
            NodeKind::MethodDefinition { key, value, .. } => {
                fields.push(("key", Field::One(*key)));
                fields.push(("value", Field::One(*value)));
            }
            NodeKind::PropertyDefinition { key, value, .. } => {
                fields.push(("key", Field::One(*key)));
                push_opt(&mut fields, "value", value);
            }
            NodeKind::ImportDeclaration { specifiers, source } => {
                fields.push(("specifiers", Field::Many(specifiers)));
                fields.push(("source", Field::One(*source)));
            }
            NodeKind::ImportSpecifier { imported, local } => {
                fields.push(("imported", Field::One(*imported)));
                fields.push(("local", Field::One(*local)));
            }
            NodeKind::ImportDefaultSpecifier { local }
            | NodeKind::ImportNamespaceSpecifier { local } => {
                fields.push(("local", Field::One(*local)))
            }
            NodeKind::ExportNamedDeclaration { declaration, specifiers, source } => {
                push_opt(&mut fields, "declaration", declaration);
                fields.push(("specifiers", Field::Many(specifiers)));
                push_opt(&mut fields, "source", source);
            }
            NodeKind::ExportSpecifier { local, exported } => {
                fields.push(("local", Field::One(*local)));
                fields.push(("exported", Field::One(*exported)));
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                fields.push(("declaration", Field::One(*declaration)))
            }
            NodeKind::ExportAllDeclaration { exported, source } => {
                push_opt(&mut fields, "exported", exported);
                fields.push(("source", Field::One(*source)));
            }
            NodeKind::TemplateLiteral { expressions } => {
                fields.push(("expressions", Field::Many(expressions)))
            }
            NodeKind::TaggedTemplateExpression { tag, quasi } => {
                fields.push(("tag", Field::One(*tag)));
                fields.push(("quasi", Field::One(*quasi)));
            }
            NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } => {
                fields.push(("elements", Field::Sparse(elements)))
            }
            NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties } => {
                fields.push(("properties", Field::Many(properties)))
            }
            NodeKind::Property { key, value, .. } => {
                fields.push(("key", Field::One(*key)));
                fields.push(("value", Field::One(*value)));
            }
            NodeKind::SpreadElement { argument }
            | NodeKind::UnaryExpression { argument, .. }
            | NodeKind::UpdateExpression { argument, .. }
            | NodeKind::AwaitExpression { argument }
            | NodeKind::RestElement { argument } => {
                fields.push(("argument", Field::One(*argument)))
            }
            NodeKind::YieldExpression { argument, .. } => {
                push_opt(&mut fields, "argument", argument)
            }
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. }
            | NodeKind::AssignmentExpression { left, right, .. }
            | NodeKind::AssignmentPattern { left, right } => {
                fields.push(("left", Field::One(*left)));
                fields.push(("right", Field::One(*right)));
            }
            NodeKind::ConditionalExpression { test, consequent, alternate } => {
                fields.push(("test", Field::One(*test)));
                fields.push(("consequent", Field::One(*consequent)));
                fields.push(("alternate", Field::One(*alternate)));
            }
            NodeKind::CallExpression { callee, arguments, .. }
            | NodeKind::NewExpression { callee, arguments } => {
                fields.push(("callee", Field::One(*callee)));
                fields.push(("arguments", Field::Many(arguments)));
            }
            NodeKind::MemberExpression { object, property, .. } => {
                fields.push(("object", Field::One(*object)));
                fields.push(("property", Field::One(*property)));
            }
            NodeKind::SequenceExpression { expressions } => {
                fields.push(("expressions", Field::Many(expressions)))
            }
            NodeKind::ImportExpression { source } => fields.push(("source", Field::One(*source))),
            NodeKind::Unknown { children, .. } => fields.push(("children", Field::Many(children))),
        }
        fields
    }

    /// All child ids in field order
    pub fn children(&self) -> Vec<NodeId> {
        self.fields().iter().flat_map(|(_, field)| field.ids()).collect()
    }

    /// Function data for the three function kinds
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            NodeKind::FunctionDeclaration(func)
            | NodeKind::FunctionExpression(func)
            | NodeKind::ArrowFunctionExpression(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            NodeKind::ClassDeclaration(class) | NodeKind::ClassExpression(class) => Some(class),
            _ => None,
        }
    }

    /// Statement kinds a statement-level tool can point at
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::ExpressionStatement { .. }
                | NodeKind::BlockStatement { .. }
                | NodeKind::EmptyStatement
                | NodeKind::DebuggerStatement
                | NodeKind::ReturnStatement { .. }
                | NodeKind::ThrowStatement { .. }
                | NodeKind::IfStatement { .. }
                | NodeKind::SwitchStatement { .. }
                | NodeKind::TryStatement { .. }
                | NodeKind::WhileStatement { .. }
                | NodeKind::DoWhileStatement { .. }
                | NodeKind::ForStatement { .. }
                | NodeKind::ForInStatement { .. }
                | NodeKind::ForOfStatement { .. }
                | NodeKind::LabeledStatement { .. }
                | NodeKind::BreakStatement { .. }
                | NodeKind::ContinueStatement { .. }
                | NodeKind::WithStatement { .. }
                | NodeKind::VariableDeclaration { .. }
                | NodeKind::FunctionDeclaration(_)
                | NodeKind::ClassDeclaration(_)
                | NodeKind::ImportDeclaration { .. }
                | NodeKind::ExportNamedDeclaration { .. }
                | NodeKind::ExportDefaultDeclaration { .. }
                | NodeKind::ExportAllDeclaration { .. }
        )
    }
}
