//! # Binding Expressions - Abstract Syntax Tree
//!
//! Data types shared by the lexer, the parser and the compiler.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[literals]** - Constant values carried by tokens and `Literal` nodes
//! - **[operators]** - Unary, binary, logical and assignment operators
//! - **[expressions]** - The node tree itself
//!
//! ## Quick Start
//!
//! ```text
//! user.name | uppercase
//! ```
//!
//! parses to a `Program` holding one `ExpressionStatement`, whose expression
//! is a filter `CallExpression` with callee `uppercase` and the member access
//! `user.name` as its first argument.
//!
//! ## JSON shape
//!
//! Nodes serialize with serde as objects tagged by `type`, using the field
//! names tooling expects (`object`, `property`, `computed`, `callee`,
//! `arguments`, ...). The tree holds no references back into the parser, so
//! it can be cached and shared freely.
pub mod expressions;
pub mod literals;
pub mod operators;
pub mod tokens;

pub use expressions::{Node, Property, PropertyKind};
pub use literals::LiteralValue;
pub use operators::{AssignOp, BinaryOp, LogicalOp, UnaryOp};
pub use tokens::{Token, TokenKind};
