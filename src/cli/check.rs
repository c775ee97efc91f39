//! Inspect and evaluate expressions from the command line

use super::CliError;
use crate::{
    Token, TokenKind, Value, cache,
    convert::{json_to_value, value_to_json},
    parser, tokenize,
};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON scope; an empty object when absent
    pub scope: Option<String>,
    /// JSON locals
    pub locals: Option<String>,
}

/// What `check` reports about a compiled expression
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub assignable: bool,
    pub constant: bool,
    pub literal: bool,
    pub one_time: bool,
    pub inputs: Vec<String>,
}

impl CheckReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "assignable": self.assignable,
            "constant": self.constant,
            "literal": self.literal,
            "oneTime": self.one_time,
            "inputs": self.inputs,
        })
    }
}

/// One JSON object per token: text, index and kind, plus the value of
/// constants
pub fn render_tokens(expression: &str) -> Result<serde_json::Value, CliError> {
    let tokens = tokenize(expression)?;
    Ok(serde_json::Value::Array(
        tokens.iter().map(token_to_json).collect(),
    ))
}

fn token_to_json(token: &Token) -> serde_json::Value {
    let mut object = serde_json::json!({
        "text": token.text,
        "index": token.index,
    });
    let kind = match &token.kind {
        TokenKind::Identifier => "identifier",
        TokenKind::Operator => "operator",
        TokenKind::Constant(value) => {
            object["value"] = value_to_json(&Value::from(value));
            "constant"
        }
    };
    object["kind"] = serde_json::Value::from(kind);
    object
}

/// The AST as JSON
pub fn render_ast(expression: &str) -> Result<serde_json::Value, CliError> {
    let ast = parser::parse(expression)?;
    Ok(serde_json::to_value(&ast)?)
}

/// Compile `expression` and report its metadata
pub fn inspect(expression: &str) -> Result<CheckReport, CliError> {
    let evaluator = cache::global().get_or_compile(expression, false)?;
    Ok(CheckReport {
        assignable: evaluator.is_assignable(),
        constant: evaluator.is_constant(),
        literal: evaluator.is_literal(),
        one_time: evaluator.is_one_time(),
        inputs: evaluator.inputs().to_vec(),
    })
}

/// Evaluate an expression against a JSON scope
pub fn execute_eval(options: &EvalOptions) -> Result<serde_json::Value, CliError> {
    let evaluator = cache::global().get_or_compile(&options.expression, false)?;

    let mut scope = match &options.scope {
        Some(json) => json_to_value(serde_json::from_str(json)?),
        None => Value::Object(Default::default()),
    };
    let mut locals = match &options.locals {
        Some(json) => Some(json_to_value(serde_json::from_str(json)?)),
        None => None,
    };

    let result = evaluator.evaluate(&mut scope, locals.as_mut())?;
    Ok(value_to_json(&result))
}
