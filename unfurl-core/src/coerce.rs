//! Scalar coercion applied while dumping declared fields.

use serde_json::{Number, Value};
use unfurl_schema::FieldKind;

use crate::error::{ExpandError, ExpandResult};

/// Coerce `value` to the scalar `kind`. `null` passes through for every kind.
///
/// Nested kinds are not scalars; they are handled by the serializer and
/// reported as an internal error here.
pub fn coerce(kind: &FieldKind, value: &Value) -> ExpandResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let coerced = match kind {
        FieldKind::Int => to_int(value),
        FieldKind::Float => to_float(value),
        FieldKind::Str => to_str(value),
        FieldKind::Bool => to_bool(value),
        FieldKind::Raw => Some(value.clone()),
        FieldKind::Nested(_) => {
            return Err(ExpandError::internal("nested field reached scalar coercion"));
        }
    };

    coerced.ok_or_else(|| ExpandError::invalid_data_type(kind.as_str(), value))
}

fn to_int(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Number::from_f64(f).map(Value::Number)
}

fn to_str(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
