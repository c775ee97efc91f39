use std::{cmp::Ordering, sync::Arc};

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use serde::Serialize;

use super::{Filter, FilterRegistry};
use crate::{
    cache,
    compiler::Evaluator,
    convert::value_to_json,
    error::ExprError,
    operations::compare,
    value::Value,
};

pub(super) fn register_all(registry: FilterRegistry) -> FilterRegistry {
    registry
        .register("uppercase", Filter::new(uppercase))
        .register("lowercase", Filter::new(lowercase))
        .register("json", Filter::new(json))
        .register("limitTo", Filter::new(limit_to))
        .register("orderBy", Filter::new(order_by))
        .register("number", Filter::new(number))
        .register("filter", Filter::new(filter))
}

fn arg(args: &[Value], index: usize) -> &Value {
    static UNDEFINED: Value = Value::Undefined;
    args.get(index).unwrap_or(&UNDEFINED)
}

fn uppercase(args: &[Value]) -> Result<Value, ExprError> {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    })
}

fn lowercase(args: &[Value]) -> Result<Value, ExprError> {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    })
}

/// `json[:indent]`, two spaces by default; `0` renders compactly.
fn json(args: &[Value]) -> Result<Value, ExprError> {
    let document = value_to_json(arg(args, 0));
    let indent = match arg(args, 1) {
        Value::Undefined => 2,
        other => other.as_int().unwrap_or(2).clamp(0, 10) as usize,
    };

    let text = if indent == 0 {
        serde_json::to_string(&document)
    } else {
        let spaces = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(spaces.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document
            .serialize(&mut serializer)
            .map(|()| String::from_utf8_lossy(&out).into_owned())
    };
    text.map(Value::String)
        .map_err(|e| ExprError::type_error(format!("json: {}", e)))
}

/// `limitTo:limit[:begin]` on arrays, strings and numbers (as strings).
///
/// A negative limit counts from the end; a negative begin is an offset from
/// the end. A limit that is not a number returns the input unchanged.
fn limit_to(args: &[Value]) -> Result<Value, ExprError> {
    let input = arg(args, 0);
    let limit = arg(args, 1).to_number();
    if limit.is_nan() {
        return Ok(input.clone());
    }

    let chars: Vec<char> = match input {
        Value::Array(_) => vec![],
        Value::String(s) => s.chars().collect(),
        Value::Integer(_) | Value::Float(_) => input.to_display_string().chars().collect(),
        other => return Ok(other.clone()),
    };
    let len = match input {
        Value::Array(items) => items.len(),
        _ => chars.len(),
    } as i64;

    let limit = if limit.is_infinite() {
        if limit > 0.0 { len } else { -len }
    } else {
        limit.trunc() as i64
    };
    let begin = match arg(args, 2).to_number() {
        n if n.is_nan() => 0,
        n if n < 0.0 => (len + n.trunc() as i64).max(0),
        n => n.trunc() as i64,
    };

    let (start, end) = if limit >= 0 {
        (begin, begin.saturating_add(limit))
    } else if begin == 0 {
        (len + limit, len)
    } else {
        (begin + limit, begin)
    };
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    let range = start..end.max(start);

    Ok(match input {
        Value::Array(items) => Value::Array(items[range].to_vec()),
        _ => Value::String(chars[range].iter().collect()),
    })
}

/// One `orderBy` criterion: the value to sort by and its direction.
///
/// Key expressions compile through [`cache::global`], with the default
/// `ParseOptions` and the built-in filters, whichever cache compiled the
/// expression that applies `orderBy`.
struct SortKey {
    getter: Option<Arc<Evaluator>>,
    descending: bool,
}

impl SortKey {
    fn parse(spec: &Value) -> Result<SortKey, ExprError> {
        let text = match spec {
            Value::String(s) => s.trim(),
            _ => "",
        };
        let (descending, expression) = match text.chars().next() {
            Some('-') => (true, &text[1..]),
            Some('+') => (false, &text[1..]),
            _ => (false, text),
        };
        let getter = if expression.is_empty() {
            None
        } else {
            Some(cache::global().get_or_compile(expression, false)?)
        };
        Ok(SortKey { getter, descending })
    }

    fn value_of(&self, item: &Value) -> Result<Value, ExprError> {
        match &self.getter {
            Some(getter) => getter.evaluate(&mut item.clone(), None),
            None => Ok(item.clone()),
        }
    }
}

/// `orderBy[:expression[:reverse]]`, where `expression` is a key expression
/// evaluated against each item (prefix `-` for descending) or an array of
/// them. Sorting is stable.
fn order_by(args: &[Value]) -> Result<Value, ExprError> {
    let Value::Array(items) = arg(args, 0) else {
        return Ok(arg(args, 0).clone());
    };

    let keys = match arg(args, 1) {
        Value::Array(specs) if !specs.is_empty() => specs
            .iter()
            .map(SortKey::parse)
            .collect::<Result<Vec<_>, _>>()?,
        spec => vec![SortKey::parse(spec)?],
    };
    let reverse = arg(args, 2).is_truthy();

    let mut decorated = Vec::with_capacity(items.len());
    for item in items {
        let values = keys
            .iter()
            .map(|key| key.value_of(item))
            .collect::<Result<Vec<_>, _>>()?;
        decorated.push((values, item));
    }

    decorated.sort_by(|(a, _), (b, _)| {
        let ordering = keys
            .iter()
            .zip(a.iter().zip(b))
            .map(|(key, (a, b))| {
                let ordering = sort_order(a, b);
                if key.descending { ordering.reverse() } else { ordering }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal);
        if reverse { ordering.reverse() } else { ordering }
    });

    Ok(Value::Array(
        decorated.into_iter().map(|(_, item)| item.clone()).collect(),
    ))
}

/// Numbers numerically, strings case-insensitively, mixed types by type
/// name.
fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ if a.type_name() == b.type_name() => compare(a, b).unwrap_or(Ordering::Equal),
        _ => a.type_name().cmp(b.type_name()),
    }
}

/// `number[:fractionDigits]`: grouped thousands and rounded fraction.
/// Without an explicit size, at most three fraction digits are kept and
/// trailing zeros dropped. Non-numeric input renders as an empty string.
fn number(args: &[Value]) -> Result<Value, ExprError> {
    let input = arg(args, 0);
    let n = match input {
        Value::Integer(_) | Value::Float(_) | Value::String(_) => input.to_number(),
        _ => f64::NAN,
    };
    if n.is_nan() {
        return Ok(Value::from(""));
    }
    if n.is_infinite() {
        return Ok(Value::from(if n > 0.0 { "∞" } else { "-∞" }));
    }

    let fraction = match arg(args, 1) {
        Value::Undefined => None,
        other => other.as_int().map(|d| d.clamp(0, 20) as u32),
    };

    let Some(decimal) = Decimal::from_f64(n) else {
        return Ok(Value::String(n.to_string()));
    };
    let rounded = decimal.round_dp_with_strategy(
        fraction.unwrap_or(3),
        RoundingStrategy::MidpointAwayFromZero,
    );
    let text = match fraction {
        Some(digits) => format!("{:.*}", digits as usize, rounded.abs()),
        None => rounded.abs().normalize().to_string(),
    };

    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (text.as_str(), None),
    };
    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Ok(Value::String(out))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `filter:needle` keeps the array items that match `needle`.
///
/// - a string, number or boolean matches items containing its text,
///   case-insensitively, anywhere in their nested values;
/// - an object matches items whose named properties match (the key `$`
///   matches any property);
/// - a function is called with `(item, index)` and keeps truthy results.
fn filter(args: &[Value]) -> Result<Value, ExprError> {
    let input = arg(args, 0);
    let items = match input {
        Value::Array(items) => items,
        nullish if nullish.is_nullish() => return Ok(nullish.clone()),
        other => {
            return Err(ExprError::type_error(format!(
                "filter: expected an array, got {}",
                other.type_name()
            )));
        }
    };

    let needle = arg(args, 1);
    if needle.is_nullish() {
        return Ok(input.clone());
    }

    let mut kept = vec![];
    for (index, item) in items.iter().enumerate() {
        let keep = match needle {
            Value::Function(predicate) => predicate
                .call(&Value::Undefined, &[item.clone(), Value::Integer(index as i64)])?
                .is_truthy(),
            Value::Object(fields) => fields.iter().all(|(key, expected)| {
                let text = expected.to_display_string().to_lowercase();
                if key == "$" {
                    deep_contains(item, &text)
                } else {
                    deep_contains(&item.get(key), &text)
                }
            }),
            other => deep_contains(item, &other.to_display_string().to_lowercase()),
        };
        if keep {
            kept.push(item.clone());
        }
    }
    Ok(Value::Array(kept))
}

/// `needle` must already be lowercase.
fn deep_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => {
            value.to_display_string().to_lowercase().contains(needle)
        }
        Value::Array(items) => items.iter().any(|item| deep_contains(item, needle)),
        Value::Object(fields) => fields.values().any(|field| deep_contains(field, needle)),
        _ => false,
    }
}
