//! Turns an AST into a tree of closures.
//!
//! Compilation walks the tree once. Each node becomes a boxed closure that
//! evaluates its children and combines the results, so evaluation never
//! matches on node kinds again. Filters are looked up here, not at
//! evaluation time: an unknown filter fails compilation.

use std::{fmt, sync::Arc};

use log::debug;

use crate::{
    analysis,
    ast::{LiteralValue, LogicalOp, Node, Property},
    error::ExprError,
    filters::FilterResolver,
    operations::{apply_binary, apply_unary},
    options::ParseOptions,
    parser::parse_with_options,
    path::{AccessPath, PathRoot, PathSegment},
    value::Value,
};

/// A compiled node.
pub(crate) type Compiled = Box<dyn Fn(&mut Env<'_>) -> Result<Value, ExprError> + Send + Sync>;

/// What a compiled expression runs against: the scope (`this`) and the
/// optional locals, which shadow the scope for names they define.
pub(crate) struct Env<'a> {
    scope: &'a mut Value,
    locals: Option<&'a mut Value>,
}

impl<'a> Env<'a> {
    fn new(scope: &'a mut Value, locals: Option<&'a mut Value>) -> Self {
        Env { scope, locals }
    }

    pub(crate) fn scope(&self) -> &Value {
        &*self.scope
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Value {
        &mut *self.scope
    }

    pub(crate) fn locals(&self) -> Option<&Value> {
        self.locals.as_deref()
    }

    pub(crate) fn locals_mut(&mut self) -> Option<&mut Value> {
        self.locals.as_deref_mut()
    }

    /// The object a bare identifier resolves against.
    pub(crate) fn base_for(&self, name: &str) -> &Value {
        match self.locals.as_deref() {
            Some(locals) if locals.has_property(name) => locals,
            _ => &*self.scope,
        }
    }

    pub(crate) fn base_for_mut(&mut self, name: &str) -> &mut Value {
        match self.locals.as_deref_mut() {
            Some(locals) if locals.has_property(name) => locals,
            _ => &mut *self.scope,
        }
    }
}

/// Invokes `function` with `this` as receiver.
pub(crate) fn call_value(
    function: &Value,
    this: &Value,
    arguments: &[Value],
    expression: &str,
) -> Result<Value, ExprError> {
    match function {
        Value::Function(function) => function.call(this, arguments),
        nullish if nullish.is_nullish() => Ok(Value::Undefined),
        other => Err(ExprError::type_error(format!(
            "{} is not a function in expression [{}]",
            other.type_name(),
            expression
        ))),
    }
}

/// A compiled expression.
///
/// Evaluators are immutable and `Send + Sync`; the cache hands out shared
/// handles to them. Evaluation only writes to the scope or the locals when
/// the expression contains an assignment, or through [`Evaluator::assign`].
pub struct Evaluator {
    source: String,
    ast: Node,
    statements: Vec<Compiled>,
    setter: Option<AccessPath>,
    constant: bool,
    literal: bool,
    one_time: bool,
    inputs: Vec<String>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("source", &self.source)
            .field("constant", &self.constant)
            .field("literal", &self.literal)
            .field("one_time", &self.one_time)
            .field("assignable", &self.setter.is_some())
            .field("inputs", &self.inputs)
            .finish()
    }
}

impl Evaluator {
    /// Runs every statement in order and returns the value of the last one
    /// (`undefined` for an empty program).
    ///
    /// # Examples
    ///
    /// ```
    /// use bindexpr::{Value, convert::json_to_value, parse};
    ///
    /// let eval = parse("user.name | uppercase").unwrap();
    /// let mut scope = json_to_value(serde_json::json!({"user": {"name": "ada"}}));
    /// assert_eq!(eval.evaluate(&mut scope, None).unwrap(), Value::from("ADA"));
    /// ```
    pub fn evaluate(&self, scope: &mut Value, locals: Option<&mut Value>) -> Result<Value, ExprError> {
        let mut env = Env::new(scope, locals);
        let mut last = Value::Undefined;
        for statement in &self.statements {
            last = statement(&mut env)?;
        }
        Ok(last)
    }

    /// Writes `value` to the location the expression denotes. Only
    /// single-statement identifier or member expressions are assignable.
    pub fn assign(
        &self,
        scope: &mut Value,
        value: Value,
        locals: Option<&mut Value>,
    ) -> Result<Value, ExprError> {
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| ExprError::non_assignable(&self.source))?;
        setter.assign(&mut Env::new(scope, locals), value)
    }

    pub fn is_assignable(&self) -> bool {
        self.setter.is_some()
    }

    /// The result never depends on the scope, the locals or a stateful filter.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Empty, or a single literal, array literal or object literal.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Whether the source carried the `::` prefix.
    pub fn is_one_time(&self) -> bool {
        self.one_time
    }

    /// Source texts of the sub-expressions whose values determine the
    /// result. Empty for constant expressions.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// The source text, without any `::` prefix.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }
}

/// Lowers an AST into closures, resolving filters through `resolver`.
pub struct Compiler<'r> {
    source: Arc<str>,
    resolver: &'r dyn FilterResolver,
}

impl<'r> Compiler<'r> {
    /// `source` is only used in error messages and `Evaluator::source`.
    pub fn new(source: &str, resolver: &'r dyn FilterResolver) -> Self {
        Compiler {
            source: Arc::from(source),
            resolver,
        }
    }

    pub fn compile(&self, ast: Node) -> Result<Evaluator, ExprError> {
        let statements = ast.statements();
        let compiled = statements
            .iter()
            .map(|statement| self.compile_node(statement))
            .collect::<Result<Vec<_>, _>>()?;
        let setter = match statements.as_slice() {
            [single] if single.is_assignable() => Some(self.compile_path(single)?),
            _ => None,
        };

        let constant = analysis::is_constant(&ast, self.resolver);
        let inputs = if constant {
            vec![]
        } else {
            analysis::watch_inputs(&ast, self.resolver)
        };
        let literal = analysis::is_literal(&ast);

        Ok(Evaluator {
            source: self.source.to_string(),
            ast,
            statements: compiled,
            setter,
            constant,
            literal,
            one_time: false,
            inputs,
        })
    }

    fn compile_node(&self, node: &Node) -> Result<Compiled, ExprError> {
        match node {
            Node::Program { body } => {
                let body = body
                    .iter()
                    .map(|statement| self.compile_node(statement))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(move |env| {
                    let mut last = Value::Undefined;
                    for statement in &body {
                        last = statement(env)?;
                    }
                    Ok(last)
                }))
            }
            Node::ExpressionStatement { expression } => self.compile_node(expression),
            Node::Literal { value } => {
                let value = Value::from(value);
                Ok(Box::new(move |_| Ok(value.clone())))
            }
            Node::Identifier { .. } | Node::MemberExpression { .. } => {
                let path = self.compile_path(node)?;
                Ok(Box::new(move |env| path.read(env)))
            }
            Node::ThisExpression => Ok(Box::new(|env| Ok(env.scope().clone()))),
            Node::LocalsExpression => Ok(Box::new(|env| Ok(env.locals().cloned().unwrap_or_default()))),
            Node::CallExpression {
                callee,
                arguments,
                filter: true,
            } => self.compile_filter(callee, arguments),
            Node::CallExpression {
                callee, arguments, ..
            } => self.compile_call(callee, arguments),
            Node::AssignmentExpression { left, right, .. } => {
                if !left.is_assignable() {
                    return Err(ExprError::non_assignable(&self.source));
                }
                let target = self.compile_path(left)?;
                let right = self.compile_node(right)?;
                // The target's keys are evaluated before the value
                Ok(Box::new(move |env| {
                    let location = target.resolve(env)?;
                    let value = right(env)?;
                    target.write(env, location, value)
                }))
            }
            Node::ConditionalExpression {
                test,
                alternate,
                consequent,
            } => {
                let test = self.compile_node(test)?;
                let alternate = self.compile_node(alternate)?;
                let consequent = self.compile_node(consequent)?;
                Ok(Box::new(move |env| {
                    if test(env)?.is_truthy() {
                        alternate(env)
                    } else {
                        consequent(env)
                    }
                }))
            }
            Node::LogicalExpression {
                operator,
                left,
                right,
            } => {
                let left = self.compile_node(left)?;
                let right = self.compile_node(right)?;
                // Short-circuits and yields the deciding operand, not a boolean
                let short_circuit_on = matches!(operator, LogicalOp::Or);
                Ok(Box::new(move |env| {
                    let value = left(env)?;
                    if value.is_truthy() == short_circuit_on {
                        Ok(value)
                    } else {
                        right(env)
                    }
                }))
            }
            Node::BinaryExpression {
                operator,
                left,
                right,
            } => {
                let operator = *operator;
                let left = self.compile_node(left)?;
                let right = self.compile_node(right)?;
                Ok(Box::new(move |env| {
                    let lhs = left(env)?;
                    let rhs = right(env)?;
                    Ok(apply_binary(operator, &lhs, &rhs))
                }))
            }
            Node::UnaryExpression {
                operator, argument, ..
            } => {
                let operator = *operator;
                let argument = self.compile_node(argument)?;
                Ok(Box::new(move |env| Ok(apply_unary(operator, &argument(env)?))))
            }
            Node::ArrayExpression { elements } => {
                let elements = self.compile_all(elements)?;
                Ok(Box::new(move |env| {
                    let mut items = Vec::with_capacity(elements.len());
                    for element in &elements {
                        items.push(element(env)?);
                    }
                    Ok(Value::Array(items))
                }))
            }
            Node::ObjectExpression { properties } => self.compile_object(properties),
        }
    }

    fn compile_all(&self, nodes: &[Node]) -> Result<Vec<Compiled>, ExprError> {
        nodes.iter().map(|node| self.compile_node(node)).collect()
    }

    fn compile_object(&self, properties: &[Property]) -> Result<Compiled, ExprError> {
        enum Key {
            Static(String),
            Computed(Compiled),
        }

        let mut entries = Vec::with_capacity(properties.len());
        for property in properties {
            let key = if property.computed {
                Key::Computed(self.compile_node(&property.key)?)
            } else {
                Key::Static(static_key(&property.key))
            };
            entries.push((key, self.compile_node(&property.value)?));
        }

        Ok(Box::new(move |env| {
            let mut object = Value::Object(Default::default());
            for (key, value) in &entries {
                let key = match key {
                    Key::Static(name) => name.clone(),
                    Key::Computed(key) => key(env)?.to_display_string(),
                };
                let value = value(env)?;
                object.set_property(&key, value)?;
            }
            Ok(object)
        }))
    }

    fn compile_call(&self, callee: &Node, arguments: &[Node]) -> Result<Compiled, ExprError> {
        let arguments = self.compile_all(arguments)?;

        match callee {
            // Method calls keep their receiver
            Node::Identifier { .. } | Node::MemberExpression { .. } => {
                let path = self.compile_path(callee)?;
                Ok(Box::new(move |env| path.call(env, &arguments)))
            }
            other => {
                let callee = self.compile_node(other)?;
                let source = Arc::clone(&self.source);
                Ok(Box::new(move |env| {
                    let function = callee(env)?;
                    let mut values = Vec::with_capacity(arguments.len());
                    for argument in &arguments {
                        values.push(argument(env)?);
                    }
                    call_value(&function, &Value::Undefined, &values, &source)
                }))
            }
        }
    }

    fn compile_filter(&self, callee: &Node, arguments: &[Node]) -> Result<Compiled, ExprError> {
        let name = match callee {
            Node::Identifier { name } => name.clone(),
            other => other.to_string(),
        };
        let filter = self
            .resolver
            .resolve(&name)
            .ok_or_else(|| ExprError::UnknownFilter {
                name,
                expression: self.source.to_string(),
            })?;
        let arguments = self.compile_all(arguments)?;

        Ok(Box::new(move |env| {
            let mut values = Vec::with_capacity(arguments.len());
            for argument in &arguments {
                values.push(argument(env)?);
            }
            filter.apply(&values)
        }))
    }

    /// Extracts an access path from an identifier or member chain, innermost
    /// object first.
    fn compile_path(&self, node: &Node) -> Result<AccessPath, ExprError> {
        let mut segments = Vec::new();
        let mut current = node;

        let root = loop {
            match current {
                Node::MemberExpression {
                    object,
                    property,
                    computed,
                } => {
                    segments.push(if *computed {
                        PathSegment::Computed(self.compile_node(property)?)
                    } else {
                        PathSegment::Field(static_key(property))
                    });
                    current = object;
                }
                Node::Identifier { name } => {
                    segments.push(PathSegment::Field(name.clone()));
                    break PathRoot::Context;
                }
                Node::ThisExpression => break PathRoot::This,
                Node::LocalsExpression => break PathRoot::Locals,
                other => break PathRoot::Temporary(self.compile_node(other)?),
            }
        };

        segments.reverse();
        Ok(AccessPath::new(root, segments, Arc::clone(&self.source)))
    }
}

/// Name of a non-computed property key: `a` in `x.a` or `{a: 1}`, or the
/// string form of a literal key as in `{'a': 1}` or `{1: 2}`.
fn static_key(key: &Node) -> String {
    match key {
        Node::Identifier { name } => name.clone(),
        Node::Literal {
            value: LiteralValue::String(s),
        } => s.clone(),
        Node::Literal { value } => Value::from(value).to_display_string(),
        other => other.to_string(),
    }
}

/// Parses and compiles `source` without caching.
///
/// A leading `::` (after whitespace) marks a one-time binding; it is
/// stripped before parsing and reported by [`Evaluator::is_one_time`].
/// With `isolate_literal`, anything but a literal made only of literals
/// fails with [`ExprError::NonLiteral`].
pub fn compile_with(
    source: &str,
    resolver: &dyn FilterResolver,
    options: &ParseOptions,
    isolate_literal: bool,
) -> Result<Evaluator, ExprError> {
    let trimmed = source.trim_start();
    let (one_time, body) = match trimmed.strip_prefix("::") {
        Some(rest) => (true, rest),
        None => (false, source),
    };

    let ast = parse_with_options(body, options)?;
    if isolate_literal && !analysis::is_json_literal(&ast) {
        debug!("rejected non-literal [{}]", body);
        return Err(ExprError::NonLiteral {
            expression: body.to_string(),
        });
    }

    let mut evaluator = Compiler::new(body, resolver).compile(ast)?;
    evaluator.one_time = one_time;
    debug!(
        "compiled [{}]: constant={} literal={} inputs={:?}",
        evaluator.source, evaluator.constant, evaluator.literal, evaluator.inputs
    );
    Ok(evaluator)
}
