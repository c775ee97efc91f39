//! Static facts about an AST: constancy, watch inputs and literal shape.

use crate::{
    ast::{Node, UnaryOp},
    filters::FilterResolver,
};

/// Whether `node` evaluates to the same value regardless of scope and locals.
///
/// Identifiers, `this`, `$locals`, plain calls and assignments are never
/// constant. A filter call is constant when the filter is stateless and all
/// of its arguments are constant.
pub fn is_constant(node: &Node, filters: &dyn FilterResolver) -> bool {
    let constant = |child: &Node| is_constant(child, filters);

    match node {
        Node::Program { body } => body.iter().all(constant),
        Node::ExpressionStatement { expression } => constant(expression),
        Node::Literal { .. } => true,
        Node::Identifier { .. } | Node::ThisExpression | Node::LocalsExpression => false,
        Node::MemberExpression {
            object,
            property,
            computed,
        } => constant(object) && (!computed || constant(property)),
        Node::CallExpression {
            callee,
            arguments,
            filter: true,
        } => is_pure_filter(callee, filters) && arguments.iter().all(constant),
        Node::CallExpression { .. } | Node::AssignmentExpression { .. } => false,
        Node::ConditionalExpression {
            test,
            alternate,
            consequent,
        } => constant(test) && constant(alternate) && constant(consequent),
        Node::LogicalExpression { left, right, .. } | Node::BinaryExpression { left, right, .. } => {
            constant(left) && constant(right)
        }
        Node::UnaryExpression { argument, .. } => constant(argument),
        Node::ArrayExpression { elements } => elements.iter().all(constant),
        Node::ObjectExpression { properties } => properties
            .iter()
            .all(|p| constant(&p.value) && (!p.computed || constant(&p.key))),
    }
}

fn is_pure_filter(callee: &Node, filters: &dyn FilterResolver) -> bool {
    match callee {
        Node::Identifier { name } => filters
            .resolve(name)
            .is_some_and(|filter| !filter.is_stateful()),
        _ => false,
    }
}

/// Source texts of the sub-expressions a watcher needs to observe, in first
/// appearance order with duplicates removed.
///
/// Operators over non-constant operands are transparent: `a + b.c` watches
/// `a` and `b.c`. Conditionals and logical expressions short-circuit, so
/// they are watched whole. Stateless filters are transparent in their
/// arguments; stateful filters, plain calls and assignments are watched
/// whole.
///
/// Only single-statement programs have inputs; a program of several
/// statements reports none.
pub fn watch_inputs(node: &Node, filters: &dyn FilterResolver) -> Vec<String> {
    let statements = node.statements();
    let [statement] = statements.as_slice() else {
        return vec![];
    };
    let mut nodes = vec![];
    collect_inputs(*statement, filters, &mut nodes);

    let mut inputs: Vec<String> = vec![];
    for node in nodes {
        let text = node.to_string();
        if !inputs.contains(&text) {
            inputs.push(text);
        }
    }
    inputs
}

fn collect_inputs<'n>(node: &'n Node, filters: &dyn FilterResolver, out: &mut Vec<&'n Node>) {
    if is_constant(node, filters) {
        return;
    }

    match node {
        Node::UnaryExpression { argument, .. } => collect_inputs(argument, filters, out),
        Node::BinaryExpression { left, right, .. } => {
            collect_inputs(left, filters, out);
            collect_inputs(right, filters, out);
        }
        Node::CallExpression {
            callee,
            arguments,
            filter: true,
        } if is_pure_filter(callee, filters) => {
            for argument in arguments {
                collect_inputs(argument, filters, out);
            }
        }
        Node::ArrayExpression { elements } => {
            for element in elements {
                collect_inputs(element, filters, out);
            }
        }
        Node::ObjectExpression { properties } => {
            for property in properties {
                if property.computed {
                    collect_inputs(&property.key, filters, out);
                }
                collect_inputs(&property.value, filters, out);
            }
        }
        // Scope and locals themselves are not watchable paths
        Node::ThisExpression | Node::LocalsExpression => {}
        _ => out.push(node),
    }
}

/// Whether the program is empty or a single literal, array literal or
/// object literal. Shallow: `[a, b]` counts.
pub fn is_literal(program: &Node) -> bool {
    match program.statements().as_slice() {
        [] => true,
        [single] => matches!(
            single,
            Node::Literal { .. } | Node::ArrayExpression { .. } | Node::ObjectExpression { .. }
        ),
        _ => false,
    }
}

/// Whether the program is a single value built only from literals, arrays
/// and objects with non-computed keys, recursively. Unary minus/plus on a
/// number literal counts as a literal.
pub fn is_json_literal(program: &Node) -> bool {
    match program.statements().as_slice() {
        [single] => is_json_value(single),
        _ => false,
    }
}

fn is_json_value(node: &Node) -> bool {
    match node {
        Node::Literal { .. } => true,
        Node::UnaryExpression {
            operator: UnaryOp::Plus | UnaryOp::Minus,
            argument,
            ..
        } => matches!(argument.as_ref(), Node::Literal { value } if value.is_number()),
        Node::ArrayExpression { elements } => elements.iter().all(is_json_value),
        Node::ObjectExpression { properties } => properties
            .iter()
            .all(|p| !p.computed && is_json_value(&p.value)),
        _ => false,
    }
}
