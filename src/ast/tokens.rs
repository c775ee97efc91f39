use crate::ast::LiteralValue;

/// What a token is, independent of its spelling.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier, including keywords such as `true`, `this` or `$locals`.
    ///
    /// Keywords are only special where the parser expects a primary
    /// expression, so the lexer never treats them differently.
    ///
    /// # Examples
    /// ```text
    /// user
    /// $index
    /// _private
    /// ```
    Identifier,

    /// Numeric or string constant with its decoded value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 1.5e3
    /// 'it\'s'
    /// ```
    Constant(LiteralValue),

    /// Operator or punctuation
    ///
    /// # Examples
    /// ```text
    /// ===
    /// &&
    /// |
    /// (
    /// ```
    Operator,
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Source spelling. String constants keep their quotes, so a quoted `"("`
    /// never compares equal to the punctuation.
    pub text: String,
    /// Zero-based character offset of the token in the source.
    pub index: usize,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, index: usize, kind: TokenKind) -> Self {
        Token {
            text: text.into(),
            index,
            kind,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, TokenKind::Constant(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.kind, TokenKind::Operator)
    }

    /// Decoded value of a constant token.
    pub fn value(&self) -> Option<&LiteralValue> {
        match &self.kind {
            TokenKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// True for operator tokens spelled exactly `text`.
    pub fn is(&self, text: &str) -> bool {
        self.is_operator() && self.text == text
    }
}
