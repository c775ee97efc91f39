use std::{collections::HashMap, fmt, sync::Arc};

use crate::{ast::LiteralValue, error::ExprError};

/// Signature of host functions callable from expressions: receiver, then
/// arguments.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ExprError> + Send + Sync;

/// A host function stored in the evaluation context.
///
/// Two handles are equal only when they share the same function.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        NativeFunction {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ExprError> {
        (self.func)(this, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// A runtime value seen by compiled expressions.
///
/// Integers and floats are kept apart so whole-number arithmetic stays exact;
/// they still compare equal when they hold the same number.
///
/// # Examples
///
/// ```
/// use bindexpr::Value;
/// use std::collections::HashMap;
///
/// let mut obj = HashMap::new();
/// obj.insert("key".to_string(), Value::String("value".to_string()));
/// let object = Value::Object(obj);
///
/// assert_eq!(object.get("key"), Value::String("value".into()));
/// assert!(object.get("missing").is_undefined());
/// assert_eq!(Value::Integer(2), Value::Float(2.0));
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value; what a missing property reads as
    #[default]
    Undefined,

    Null,

    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    Float(f64),

    String(String),

    Array(Vec<Value>),

    Object(HashMap<String, Value>),

    /// Host function
    Function(NativeFunction),
}

/// Result of reading one property.
pub enum Lookup<'v> {
    /// The property is stored in the container.
    Borrowed(&'v Value),
    /// The property is derived (`length`, a string character).
    Computed(Value),
    Missing,
}

impl Value {
    pub fn function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        Value::Function(NativeFunction::new(name, func))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Undefined | Null => false,
            Boolean(b) => *b,
            Integer(n) => *n != 0,
            Float(n) => *n != 0.0 && !n.is_nan(),
            String(s) => !s.is_empty(),
            Array(_) | Object(_) | Function(_) => true,
        }
    }

    /// Numeric conversion; anything without a numeric reading is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Null => 0.0,
            Value::String(s) => parse_numeric_string(s),
            _ => f64::NAN,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.is_finite() => Some(n.trunc() as i64),
            Value::String(_) | Value::Boolean(_) => {
                let n = self.to_number();
                n.is_finite().then(|| n.trunc() as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String conversion used by concatenation and property keys.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => format!("function {}() {{ [native code] }}", func.name()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Reads property `key`.
    ///
    /// Objects are keyed by string; arrays accept canonical indices and
    /// `length`; strings accept indices and `length`.
    pub fn property(&self, key: &str) -> Lookup<'_> {
        match self {
            Value::Object(map) => match map.get(key) {
                Some(value) => Lookup::Borrowed(value),
                None => Lookup::Missing,
            },
            Value::Array(items) => {
                if key == "length" {
                    return Lookup::Computed(Value::Integer(items.len() as i64));
                }
                match array_index(key).and_then(|index| items.get(index)) {
                    Some(value) => Lookup::Borrowed(value),
                    None => Lookup::Missing,
                }
            }
            Value::String(s) => {
                if key == "length" {
                    return Lookup::Computed(Value::Integer(s.chars().count() as i64));
                }
                match array_index(key).and_then(|index| s.chars().nth(index)) {
                    Some(ch) => Lookup::Computed(Value::String(ch.to_string())),
                    None => Lookup::Missing,
                }
            }
            _ => Lookup::Missing,
        }
    }

    /// Reads property `key` into an owned value; missing reads as `undefined`.
    pub fn get(&self, key: &str) -> Value {
        match self.property(key) {
            Lookup::Borrowed(value) => value.clone(),
            Lookup::Computed(value) => value,
            Lookup::Missing => Value::Undefined,
        }
    }

    /// Whether `key` is an own property (used for locals shadowing).
    pub fn has_property(&self, key: &str) -> bool {
        !matches!(self.property(key), Lookup::Missing)
    }

    /// Mutable slot for `key`, creating an empty object there when it is
    /// missing or nullish. `null`/`undefined` containers become objects.
    pub fn child_mut(&mut self, key: &str) -> Result<&mut Value, ExprError> {
        if self.is_nullish() {
            *self = Value::Object(HashMap::new());
        }
        let type_name = self.type_name();
        let slot = match self {
            Value::Object(map) => map.entry(key.to_string()).or_default(),
            Value::Array(items) => array_slot(items, key)?,
            _ => {
                return Err(ExprError::type_error(format!(
                    "Cannot set property '{}' of {}",
                    key, type_name
                )));
            }
        };
        if slot.is_nullish() {
            *slot = Value::Object(HashMap::new());
        }
        Ok(slot)
    }

    /// Writes property `key`. Arrays grow with `undefined` holes.
    pub fn set_property(&mut self, key: &str, value: Value) -> Result<(), ExprError> {
        if self.is_nullish() {
            *self = Value::Object(HashMap::new());
        }
        let type_name = self.type_name();
        match self {
            Value::Object(map) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                *array_slot(items, key)? = value;
                Ok(())
            }
            _ => Err(ExprError::type_error(format!(
                "Cannot set property '{}' of {}",
                key, type_name
            ))),
        }
    }

    /// Loose equality (`==`).
    pub fn loose_equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (String(a), String(b)) => a == b,
            (Boolean(_) | Integer(_) | Float(_) | String(_), Boolean(_) | Integer(_) | Float(_) | String(_)) => {
                if let (Integer(a), Integer(b)) = (self, other) {
                    return a == b;
                }
                self.to_number() == other.to_number()
            }
            _ => self == other,
        }
    }
}

/// Strict equality: numbers compare numerically across integer and float,
/// containers structurally, functions by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Integer(_) | Float(_), Integer(_) | Float(_)) => self.to_number() == other.to_number(),
            (String(a), String(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Function(a), Function(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Undefined => Value::Undefined,
            LiteralValue::Null => Value::Null,
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Integer(n) => Value::Integer(*n),
            LiteralValue::Float(n) => Value::Float(*n),
            LiteralValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Canonical array index: no sign, no leading zeros.
/// How many `undefined` holes a single write may add past the end of an
/// array.
pub const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// Slot `key` of `items`, padding with `undefined` up to it.
fn array_slot<'v>(items: &'v mut Vec<Value>, key: &str) -> Result<&'v mut Value, ExprError> {
    let index = array_index(key)
        .ok_or_else(|| ExprError::type_error(format!("Cannot use key '{}' on array", key)))?;
    if index >= items.len() {
        if index - items.len() >= MAX_ARRAY_GROWTH {
            return Err(ExprError::type_error(format!(
                "Array index {} is out of range (length {})",
                index,
                items.len()
            )));
        }
        items.resize(index + 1, Value::Undefined);
    }
    Ok(&mut items[index])
}

fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

fn parse_numeric_string(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed
            .chars()
            .any(|c| c.is_alphabetic() && c != 'e' && c != 'E') =>
        {
            f64::NAN
        }
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Renders a float the way script engines print numbers: whole values
/// without a fraction, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        n.to_string()
    }
}
