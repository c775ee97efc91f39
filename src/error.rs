//! Errors raised while lexing, parsing, compiling and evaluating expressions.

use std::fmt;

use thiserror::Error;

use crate::ast::Token;

/// Machine-checkable classification of an [`ExprError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unrecognized character sequence in the source.
    Lexical,
    /// Grammar violation.
    Syntax,
    /// Input ended in the middle of an expression.
    UnexpectedEnd,
    /// Assignment to something that is not an identifier or member access.
    NonAssignable,
    /// Access to a sandbox-forbidden name.
    Security,
    /// Filter name the resolver does not know.
    UnknownFilter,
    /// Non-literal expression compiled in isolate-literal mode.
    NonLiteral,
    /// Runtime type mismatch (calling a non-function, writing into a number).
    Type,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::UnexpectedEnd => "unexpected-end",
            ErrorKind::NonAssignable => "non-assignable",
            ErrorKind::Security => "security",
            ErrorKind::UnknownFilter => "unknown-filter",
            ErrorKind::NonLiteral => "non-literal",
            ErrorKind::Type => "type",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure the expression engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The lexer hit a character sequence it cannot tokenize.
    #[error("Lexer Error: {message} at column {} in expression [{expression}]", .index + 1)]
    Lexical {
        message: String,
        /// Zero-based character offset of the offending input.
        index: usize,
        expression: String,
    },

    /// A token does not fit the grammar at its position.
    #[error(
        "Syntax Error: Token '{token}' {reason} at column {column} of the expression [{expression}] starting at [{remaining}]"
    )]
    Syntax {
        token: String,
        reason: String,
        /// One-based column of the offending token.
        column: usize,
        expression: String,
        remaining: String,
    },

    #[error("Unexpected end of expression: {expression}")]
    UnexpectedEnd { expression: String },

    #[error("Trying to assign a value to a non l-value in expression [{expression}]")]
    NonAssignable { expression: String },

    #[error("Attempting to access a disallowed field '{field}' in expression [{expression}]")]
    Security { field: String, expression: String },

    #[error("Unknown filter '{name}' in expression [{expression}]")]
    UnknownFilter { name: String, expression: String },

    #[error("Expression [{expression}] is not a literal")]
    NonLiteral { expression: String },

    #[error("Type error: {0}")]
    Type(String),
}

impl ExprError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExprError::Lexical { .. } => ErrorKind::Lexical,
            ExprError::Syntax { .. } => ErrorKind::Syntax,
            ExprError::UnexpectedEnd { .. } => ErrorKind::UnexpectedEnd,
            ExprError::NonAssignable { .. } => ErrorKind::NonAssignable,
            ExprError::Security { .. } => ErrorKind::Security,
            ExprError::UnknownFilter { .. } => ErrorKind::UnknownFilter,
            ExprError::NonLiteral { .. } => ErrorKind::NonLiteral,
            ExprError::Type(_) => ErrorKind::Type,
        }
    }

    /// Builds a syntax error pointing at `token` inside `expression`.
    pub fn syntax(token: &Token, reason: impl Into<String>, expression: &str) -> Self {
        ExprError::Syntax {
            token: token.text.clone(),
            reason: reason.into(),
            column: token.index + 1,
            expression: expression.to_string(),
            remaining: expression.chars().skip(token.index).collect(),
        }
    }

    pub fn lexical(message: impl Into<String>, index: usize, expression: &str) -> Self {
        ExprError::Lexical {
            message: message.into(),
            index,
            expression: expression.to_string(),
        }
    }

    pub fn unexpected_end(expression: &str) -> Self {
        ExprError::UnexpectedEnd {
            expression: expression.to_string(),
        }
    }

    pub fn non_assignable(expression: &str) -> Self {
        ExprError::NonAssignable {
            expression: expression.to_string(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ExprError::Type(message.into())
    }
}
