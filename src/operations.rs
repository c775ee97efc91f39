//! Operator semantics for compiled expressions.
//!
//! Integer arithmetic stays integral while it fits in `i64`. Mixed
//! integer/float arithmetic is carried out in `rust_decimal` so results such
//! as `0.1 * 3` come back as the decimal the user wrote rather than the
//! nearest binary float, and collapse back to integers when whole.

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{BinaryOp, UnaryOp},
    value::Value,
};

/// A value after numeric conversion.
#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Number {
        match value {
            Value::Integer(n) => Number::Integer(*n),
            Value::Boolean(b) => Number::Integer(i64::from(*b)),
            Value::Null => Number::Integer(0),
            other => Number::Float(other.to_number()),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Integer(n) => Value::Integer(n),
            Number::Float(n) => Value::Float(n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Arith {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Arith {
    fn integers(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Arith::Add => a.checked_add(b),
            Arith::Subtract => a.checked_sub(b),
            Arith::Multiply => a.checked_mul(b),
            // Only exact quotients stay integral
            Arith::Divide if a.checked_rem(b) == Some(0) => a.checked_div(b),
            Arith::Divide => None,
            Arith::Modulo if b != 0 => a.checked_rem(b),
            Arith::Modulo => None,
        }
    }

    fn floats(self, a: f64, b: f64) -> f64 {
        match self {
            Arith::Add => a + b,
            Arith::Subtract => a - b,
            Arith::Multiply => a * b,
            Arith::Divide => a / b,
            Arith::Modulo => a % b,
        }
    }

    fn decimals(self, a: Decimal, b: Decimal) -> Option<Decimal> {
        match self {
            Arith::Add => a.checked_add(b),
            Arith::Subtract => a.checked_sub(b),
            Arith::Multiply => a.checked_mul(b),
            Arith::Divide => a.checked_div(b),
            Arith::Modulo => a.checked_rem(b),
        }
    }

    fn apply(self, left: Number, right: Number) -> Number {
        match (left, right) {
            (Number::Integer(a), Number::Integer(b)) => match self.integers(a, b) {
                Some(n) => Number::Integer(n),
                None => Number::Float(self.floats(a as f64, b as f64)),
            },
            (Number::Float(a), Number::Float(b)) => Number::Float(self.floats(a, b)),
            (a, b) => self
                .mixed(a, b)
                .unwrap_or_else(|| Number::Float(self.floats(a.as_f64(), b.as_f64()))),
        }
    }

    /// Mixed integer/float arithmetic through `Decimal`.
    fn mixed(self, left: Number, right: Number) -> Option<Number> {
        let to_decimal = |n: Number| match n {
            Number::Integer(i) => Decimal::from_i64(i),
            Number::Float(f) => Decimal::from_f64(f),
        };
        let result = self.decimals(to_decimal(left)?, to_decimal(right)?)?;
        if result.is_integer()
            && let Some(n) = result.to_i64()
        {
            return Some(Number::Integer(n));
        }
        result.to_f64().map(Number::Float)
    }
}

/// Applies a binary operator. Operators never fail; meaningless arithmetic
/// produces NaN the way script engines do.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => {
            // undefined operands count as zero
            arithmetic(Arith::Subtract, defined_or_zero(left), defined_or_zero(right))
        }
        BinaryOp::Multiply => arithmetic(Arith::Multiply, left, right),
        BinaryOp::Divide => arithmetic(Arith::Divide, left, right),
        BinaryOp::Modulo => arithmetic(Arith::Modulo, left, right),
        BinaryOp::LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::GreaterThan => Value::Boolean(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::LessEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GreaterEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Equal => Value::Boolean(left.loose_equals(right)),
        BinaryOp::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEqual => Value::Boolean(left == right),
        BinaryOp::StrictNotEqual => Value::Boolean(left != right),
    }
}

pub fn apply_unary(op: UnaryOp, argument: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Boolean(!argument.is_truthy()),
        UnaryOp::Plus if argument.is_undefined() => Value::Integer(0),
        UnaryOp::Plus => Number::of(argument).into_value(),
        UnaryOp::Minus if argument.is_undefined() => Value::Integer(0),
        UnaryOp::Minus => match Number::of(argument) {
            Number::Integer(n) => match n.checked_neg() {
                Some(n) => Value::Integer(n),
                None => Value::Float(-(n as f64)),
            },
            Number::Float(n) => Value::Float(-n),
        },
    }
}

/// `+`: an `undefined` side yields the other side; strings and containers
/// concatenate; everything else adds numerically.
fn add(left: &Value, right: &Value) -> Value {
    if left.is_undefined() {
        return right.clone();
    }
    if right.is_undefined() {
        return left.clone();
    }
    let concatenates = |v: &Value| {
        matches!(
            v,
            Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
        )
    };
    if concatenates(left) || concatenates(right) {
        return Value::String(format!(
            "{}{}",
            left.to_display_string(),
            right.to_display_string()
        ));
    }
    arithmetic(Arith::Add, left, right)
}

static ZERO: Value = Value::Integer(0);

fn defined_or_zero(value: &Value) -> &Value {
    if value.is_undefined() { &ZERO } else { value }
}

fn arithmetic(op: Arith, left: &Value, right: &Value) -> Value {
    op.apply(Number::of(left), Number::of(right)).into_value()
}

/// Relational comparison: two strings compare lexicographically, anything
/// else numerically. `None` when either side is NaN.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Some(a.cmp(b));
    }
    match (Number::of(left), Number::of(right)) {
        (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
        (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
    }
}
