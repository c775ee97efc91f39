use serde::{Deserialize, Serialize};

use crate::ast::{AssignOp, BinaryOp, LiteralValue, LogicalOp, UnaryOp};

/// Abstract Syntax Tree node.
///
/// The tree produced by the parser is plain data. It is what the compiler
/// walks and what tooling sees when the tree is serialized to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// Top-level list of `;`-separated statements
    ///
    /// # Example
    /// ```text
    /// a = 1; b = 2
    /// ```
    Program { body: Vec<Node> },

    /// One statement of a program
    ExpressionStatement { expression: Box<Node> },

    /// Constant value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 'text'
    /// undefined
    /// ```
    Literal {
        #[serde(default, skip_serializing_if = "LiteralValue::is_undefined")]
        value: LiteralValue,
    },

    /// Bare name looked up in locals, then in the context
    Identifier { name: String },

    /// `this`: the evaluation context itself
    ThisExpression,

    /// `$locals`: the local-override context itself
    LocalsExpression,

    /// Property access
    ///
    /// # Examples
    /// ```text
    /// user.name        // computed: false, property is an Identifier
    /// items[index]     // computed: true, property is any expression
    /// ```
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },

    /// Function call or filter application
    ///
    /// A filter pipe `value | name:arg` becomes a call with `filter: true`,
    /// the filter name as callee and the piped value as first argument.
    ///
    /// # Examples
    /// ```text
    /// format(amount, 2)
    /// amount | number:2
    /// ```
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
        #[serde(default, skip_serializing_if = "is_false")]
        filter: bool,
    },

    /// `left = right`, right-associative
    AssignmentExpression {
        left: Box<Node>,
        right: Box<Node>,
        operator: AssignOp,
    },

    /// `test ? alternate : consequent`
    ConditionalExpression {
        test: Box<Node>,
        alternate: Box<Node>,
        consequent: Box<Node>,
    },

    /// `&&` and `||`
    LogicalExpression {
        operator: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Arithmetic, relational and equality operators
    BinaryExpression {
        operator: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Prefix `+`, `-` and `!`
    UnaryExpression {
        operator: UnaryOp,
        prefix: bool,
        argument: Box<Node>,
    },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [1, name, 'x',]
    /// ```
    ArrayExpression { elements: Vec<Node> },

    /// Object literal
    ///
    /// # Example
    /// ```text
    /// {a: 1, 'b': 2, [key]: 3, short}
    /// ```
    ObjectExpression { properties: Vec<Property> },
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Property")]
pub struct Property {
    pub kind: PropertyKind,
    pub key: Node,
    pub value: Node,
    pub computed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertyKind {
    #[default]
    #[serde(rename = "init")]
    Init,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn program(body: Vec<Node>) -> Self {
        Node::Program { body }
    }

    pub fn statement(expression: Node) -> Self {
        Node::ExpressionStatement {
            expression: Box::new(expression),
        }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Node::Literal {
            value: value.into(),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::Identifier { name: name.into() }
    }

    pub fn member(object: Node, property: Node, computed: bool) -> Self {
        Node::MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed,
        }
    }

    pub fn call(callee: Node, arguments: Vec<Node>, filter: bool) -> Self {
        Node::CallExpression {
            callee: Box::new(callee),
            arguments,
            filter,
        }
    }

    pub fn assignment(left: Node, right: Node) -> Self {
        Node::AssignmentExpression {
            left: Box::new(left),
            right: Box::new(right),
            operator: AssignOp::Assign,
        }
    }

    pub fn conditional(test: Node, alternate: Node, consequent: Node) -> Self {
        Node::ConditionalExpression {
            test: Box::new(test),
            alternate: Box::new(alternate),
            consequent: Box::new(consequent),
        }
    }

    pub fn logical(operator: LogicalOp, left: Node, right: Node) -> Self {
        Node::LogicalExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn binary(operator: BinaryOp, left: Node, right: Node) -> Self {
        Node::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOp, argument: Node) -> Self {
        Node::UnaryExpression {
            operator,
            prefix: true,
            argument: Box::new(argument),
        }
    }

    /// Identifiers and member accesses are the only valid assignment targets.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Node::Identifier { .. } | Node::MemberExpression { .. })
    }

    /// Statement expressions of a `Program`, in order.
    pub fn statements(&self) -> Vec<&Node> {
        match self {
            Node::Program { body } => body
                .iter()
                .map(|statement| match statement {
                    Node::ExpressionStatement { expression } => expression.as_ref(),
                    other => other,
                })
                .collect(),
            Node::ExpressionStatement { expression } => vec![expression.as_ref()],
            other => vec![other],
        }
    }
}

impl Property {
    pub fn new(key: Node, value: Node, computed: bool) -> Self {
        Property {
            kind: PropertyKind::Init,
            key,
            value,
            computed,
        }
    }
}
