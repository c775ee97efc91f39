//! Source rendering for AST nodes.
//!
//! `Node`'s `Display` produces canonical expression text: single spaces
//! around binary operators, double-quoted strings, and parentheses only
//! where precedence requires them. Printing a parsed AST and parsing the
//! result again yields the same AST.

use std::fmt::{self, Write};

use crate::{
    ast::{BinaryOp, LiteralValue, LogicalOp, Node, Property},
    value::format_number,
};

const FILTER: u8 = 0;
const ASSIGNMENT: u8 = 1;
const CONDITIONAL: u8 = 2;
const POSTFIX: u8 = 10;
const UNARY: u8 = 9;

fn precedence(node: &Node) -> u8 {
    match node {
        Node::Program { .. } | Node::ExpressionStatement { .. } => FILTER,
        Node::CallExpression { filter: true, .. } => FILTER,
        Node::AssignmentExpression { .. } => ASSIGNMENT,
        Node::ConditionalExpression { .. } => CONDITIONAL,
        Node::LogicalExpression {
            operator: LogicalOp::Or,
            ..
        } => 3,
        Node::LogicalExpression {
            operator: LogicalOp::And,
            ..
        } => 4,
        Node::BinaryExpression { operator, .. } => binary_precedence(*operator),
        Node::UnaryExpression { .. } => UNARY,
        _ => POSTFIX,
    }
}

fn binary_precedence(op: BinaryOp) -> u8 {
    use BinaryOp::*;
    match op {
        Equal | NotEqual | StrictEqual | StrictNotEqual => 5,
        LessThan | GreaterThan | LessEqual | GreaterEqual => 6,
        Add | Subtract => 7,
        Multiply | Divide | Modulo => 8,
    }
}

/// Writes `node`, parenthesized when it binds looser than `min`.
fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, min: u8) -> fmt::Result {
    if precedence(node) < min {
        f.write_char('(')?;
        write_bare(f, node)?;
        f.write_char(')')
    } else {
        write_bare(f, node)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[Node], min: u8) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_node(f, node, min)?;
    }
    Ok(())
}

fn write_bare(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Program { body } => {
            for (i, statement) in body.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                write_node(f, statement, FILTER)?;
            }
            Ok(())
        }
        Node::ExpressionStatement { expression } => write_node(f, expression, FILTER),
        Node::Literal { value } => write!(f, "{}", value),
        Node::Identifier { name } => f.write_str(name),
        Node::ThisExpression => f.write_str("this"),
        Node::LocalsExpression => f.write_str("$locals"),
        Node::MemberExpression {
            object,
            property,
            computed,
        } => {
            write_node(f, object, POSTFIX)?;
            if *computed {
                f.write_char('[')?;
                write_node(f, property, ASSIGNMENT)?;
                f.write_char(']')
            } else {
                f.write_char('.')?;
                write_bare(f, property)
            }
        }
        Node::CallExpression {
            callee,
            arguments,
            filter: true,
        } => {
            let (input, rest) = match arguments.split_first() {
                Some((input, rest)) => (Some(input), rest),
                None => (None, &[][..]),
            };
            if let Some(input) = input {
                write_node(f, input, FILTER)?;
            }
            f.write_str(" | ")?;
            write_bare(f, callee)?;
            for argument in rest {
                f.write_char(':')?;
                write_node(f, argument, ASSIGNMENT)?;
            }
            Ok(())
        }
        Node::CallExpression {
            callee, arguments, ..
        } => {
            write_node(f, callee, POSTFIX)?;
            f.write_char('(')?;
            write_list(f, arguments, FILTER)?;
            f.write_char(')')
        }
        Node::AssignmentExpression {
            left,
            right,
            operator,
        } => {
            write_node(f, left, POSTFIX)?;
            write!(f, " {} ", operator)?;
            write_node(f, right, ASSIGNMENT)
        }
        Node::ConditionalExpression {
            test,
            alternate,
            consequent,
        } => {
            write_node(f, test, CONDITIONAL + 1)?;
            f.write_str(" ? ")?;
            write_node(f, alternate, ASSIGNMENT)?;
            f.write_str(" : ")?;
            write_node(f, consequent, ASSIGNMENT)
        }
        Node::LogicalExpression {
            operator,
            left,
            right,
        } => {
            let level = precedence(node);
            write_node(f, left, level)?;
            write!(f, " {} ", operator)?;
            write_node(f, right, level + 1)
        }
        Node::BinaryExpression {
            operator,
            left,
            right,
        } => {
            let level = binary_precedence(*operator);
            write_node(f, left, level)?;
            write!(f, " {} ", operator)?;
            write_node(f, right, level + 1)
        }
        Node::UnaryExpression {
            operator, argument, ..
        } => {
            write!(f, "{}", operator)?;
            write_node(f, argument, UNARY)
        }
        Node::ArrayExpression { elements } => {
            f.write_char('[')?;
            write_list(f, elements, ASSIGNMENT)?;
            f.write_char(']')
        }
        Node::ObjectExpression { properties } => {
            f.write_char('{')?;
            for (i, property) in properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_property(f, property)?;
            }
            f.write_char('}')
        }
    }
}

fn write_property(f: &mut fmt::Formatter<'_>, property: &Property) -> fmt::Result {
    if property.computed {
        f.write_char('[')?;
        write_node(f, &property.key, ASSIGNMENT)?;
        f.write_char(']')?;
    } else {
        write_bare(f, &property.key)?;
    }
    f.write_str(": ")?;
    write_node(f, &property.value, ASSIGNMENT)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, FILTER)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Undefined => f.write_str("undefined"),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Integer(n) => write!(f, "{}", n),
            // `{:?}` keeps the fraction on whole floats so they lex back as floats
            LiteralValue::Float(n) if n.is_finite() => write!(f, "{:?}", n),
            LiteralValue::Float(n) => f.write_str(&format_number(*n)),
            LiteralValue::String(s) => write_quoted(f, s),
        }
    }
}

/// Double-quoted string with the escapes the lexer understands.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{000C}' => f.write_str("\\f")?,
            '\u{000B}' => f.write_str("\\v")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
