use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition or string concatenation (`+`)
    #[serde(rename = "+")]
    Add,
    /// Subtraction (`-`)
    #[serde(rename = "-")]
    Subtract,
    /// Multiplication (`*`)
    #[serde(rename = "*")]
    Multiply,
    /// Division (`/`)
    #[serde(rename = "/")]
    Divide,
    /// Remainder (`%`)
    #[serde(rename = "%")]
    Modulo,

    // Relational
    /// Less than (`<`)
    #[serde(rename = "<")]
    LessThan,
    /// Greater than (`>`)
    #[serde(rename = ">")]
    GreaterThan,
    /// Less than or equal (`<=`)
    #[serde(rename = "<=")]
    LessEqual,
    /// Greater than or equal (`>=`)
    #[serde(rename = ">=")]
    GreaterEqual,

    // Equality
    /// Loose equality (`==`)
    #[serde(rename = "==")]
    Equal,
    /// Loose inequality (`!=`)
    #[serde(rename = "!=")]
    NotEqual,
    /// Strict equality (`===`)
    #[serde(rename = "===")]
    StrictEqual,
    /// Strict inequality (`!==`)
    #[serde(rename = "!==")]
    StrictNotEqual,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match symbol {
            "+" => Add,
            "-" => Subtract,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulo,
            "<" => LessThan,
            ">" => GreaterThan,
            "<=" => LessEqual,
            ">=" => GreaterEqual,
            "==" => Equal,
            "!=" => NotEqual,
            "===" => StrictEqual,
            "!==" => StrictNotEqual,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            LessThan => "<",
            GreaterThan => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            StrictEqual => "===",
            StrictNotEqual => "!==",
        }
    }
}

/// Short-circuit logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Logical AND (`&&`)
    #[serde(rename = "&&")]
    And,
    /// Logical OR (`||`)
    #[serde(rename = "||")]
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Numeric conversion (`+`)
    #[serde(rename = "+")]
    Plus,
    /// Negation (`-`)
    #[serde(rename = "-")]
    Minus,
    /// Logical not (`!`)
    #[serde(rename = "!")]
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(UnaryOp::Plus),
            "-" => Some(UnaryOp::Minus),
            "!" => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// The only assignment operator, `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssignOp {
    #[default]
    #[serde(rename = "=")]
    Assign,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        "="
    }
}

macro_rules! display_as_symbol {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_symbol!(BinaryOp, LogicalOp, UnaryOp, AssignOp);
