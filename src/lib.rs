//! Data-binding expressions: a small JavaScript-like language for reading,
//! writing and transforming values in a template scope.
//!
//! Source text goes through [`lexer`], [`parser`] and [`compiler`] into an
//! [`Evaluator`]; the [`cache`] memoizes that pipeline per source string.
//!
//! ```
//! use bindexpr::{Value, convert::json_to_value};
//!
//! let total = bindexpr::parse("items.length > 0 ? items[0].price * qty : 0").unwrap();
//! let mut scope = json_to_value(serde_json::json!({"items": [{"price": 2.5}], "qty": 4}));
//! assert_eq!(total.evaluate(&mut scope, None).unwrap(), Value::Integer(10));
//! ```

pub mod analysis;
pub mod ast;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod convert;
pub mod error;
pub mod filters;
pub mod lexer;
mod operations;
pub mod options;
pub mod parser;
mod path;
mod printer;
pub mod sandbox;
pub mod value;

use std::sync::Arc;

pub use ast::{LiteralValue, Node, Token, TokenKind};
pub use cache::ExpressionCache;
pub use compiler::{Compiler, Evaluator, compile_with};
pub use error::{ErrorKind, ExprError};
pub use filters::{Filter, FilterRegistry, FilterResolver};
pub use lexer::{Lexer, tokenize};
pub use options::ParseOptions;
pub use parser::Parser;
pub use value::{NativeFunction, Value};

/// Compiles `source` through the process-wide cache.
pub fn parse(source: &str) -> Result<Arc<Evaluator>, ExprError> {
    cache::global().get_or_compile(source, false)
}

/// Parses `source` into an AST without compiling it.
pub fn parse_ast(source: &str) -> Result<Node, ExprError> {
    parser::parse(source)
}
