use serde::{Deserialize, Serialize};

/// Constant value of a `Literal` node or a constant token.
///
/// Serialized untagged so a literal's `value` field holds the plain JSON
/// value. `undefined` has no JSON spelling: the `value` field is omitted and
/// a missing field deserializes back to [`LiteralValue::Undefined`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    #[default]
    #[serde(skip)]
    Undefined,
}

impl LiteralValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, LiteralValue::Undefined)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, LiteralValue::Integer(_) | LiteralValue::Float(_))
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Float(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}
