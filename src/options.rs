//! Parser configuration.

use std::collections::HashMap;

use crate::ast::LiteralValue;

/// Settings shared by the lexer and the parser.
///
/// The defaults recognize `true`, `false`, `null` and `undefined` as literal
/// keywords, and identifiers made of ASCII letters, `$`, `_` and (after the
/// first character) digits. Non-ASCII letters are accepted as well.
///
/// # Examples
///
/// ```
/// use bindexpr::{LiteralValue, ParseOptions};
///
/// let options = ParseOptions::default()
///     .add_literal("yes", LiteralValue::Boolean(true))
///     .identifier_fns(|c| c.is_alphabetic() || c == '@', |c| c.is_alphanumeric());
/// assert!(options.literal("yes").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    literals: HashMap<String, LiteralValue>,
    is_identifier_start: fn(char) -> bool,
    is_identifier_continue: fn(char) -> bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        let literals = [
            ("true", LiteralValue::Boolean(true)),
            ("false", LiteralValue::Boolean(false)),
            ("null", LiteralValue::Null),
            ("undefined", LiteralValue::Undefined),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        ParseOptions {
            literals,
            is_identifier_start: default_identifier_start,
            is_identifier_continue: default_identifier_continue,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extra literal keyword. Like `true`, it is only special
    /// where a primary expression is expected.
    pub fn add_literal(mut self, name: impl Into<String>, value: LiteralValue) -> Self {
        self.literals.insert(name.into(), value);
        self
    }

    /// Replaces the identifier character classes.
    pub fn identifier_fns(
        mut self,
        is_start: fn(char) -> bool,
        is_continue: fn(char) -> bool,
    ) -> Self {
        self.is_identifier_start = is_start;
        self.is_identifier_continue = is_continue;
        self
    }

    pub fn literal(&self, name: &str) -> Option<&LiteralValue> {
        self.literals.get(name)
    }

    pub fn identifier_start_fn(&self) -> fn(char) -> bool {
        self.is_identifier_start
    }

    pub fn identifier_continue_fn(&self) -> fn(char) -> bool {
        self.is_identifier_continue
    }
}

fn default_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn default_identifier_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
