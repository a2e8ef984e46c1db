//! Script-style conversions between [`Value`] kinds.

use crate::value::Value;

/// Numeric conversion following script rules.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) | Value::Date(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Getter(getter) => getter.read().map(|v| to_number(&v)).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Truthiness.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Format a number the way scripts print it: integers without a fraction.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// String conversion used by `+` concatenation and diagnostics.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Array(items) | Value::Sequence { items, .. } => items
            .iter()
            .map(|v| if v.is_nullish() { String::new() } else { to_display_string(v) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        Value::Date(ms) => format!("Date({})", number_to_string(*ms)),
        Value::RegExp { pattern, flags } => {
            let mut s = format!("/{}/", pattern);
            if flags.contains(crate::value::RegExpFlags::GLOBAL) {
                s.push('g');
            }
            if flags.contains(crate::value::RegExpFlags::IGNORE_CASE) {
                s.push('i');
            }
            if flags.contains(crate::value::RegExpFlags::MULTILINE) {
                s.push('m');
            }
            s
        }
        Value::Function { name } => format!("function {}() {{ [code] }}", name),
        Value::QObject(id) => format!("QObject({})", id.0),
        Value::ListModel(_) => "[object ListModel]".to_string(),
        Value::Getter(getter) => getter
            .read()
            .map(|v| to_display_string(&v))
            .unwrap_or_else(|_| "undefined".to_string()),
    }
}

/// Result of the `typeof` operator.
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Function { .. } => "function",
        _ => "object",
    }
}

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::QObject(x), Value::QObject(y)) => x == y,
        (Value::ListModel(x), Value::ListModel(y)) => x.ptr_eq(y),
        // Composite values compare structurally; the runtime has no object identity for them.
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => a == b,
        _ => false,
    }
}

/// `==`
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() && y.is_nullish() => true,
        (x, _) | (_, x) if x.is_nullish() => false,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => to_number(a) == to_number(b),
        _ => strict_equals(a, b),
    }
}
