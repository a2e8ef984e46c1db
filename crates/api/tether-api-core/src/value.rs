//! Value: the dynamic script value that flows through bindings, animations and the
//! worker codec.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;
use crate::list_model::ListModelHandle;

/// Lightweight kind enum for quick dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Undefined,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Date,
    RegExp,
    Sequence,
    Function,
    QObject,
    ListModel,
    Getter,
}

bitflags! {
    /// Regular expression flags, stored in the codec header's size field.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RegExpFlags: u32 {
        const GLOBAL = 1;
        const IGNORE_CASE = 2;
        const MULTILINE = 4;
    }
}

impl RegExpFlags {
    /// Parse the trailing flag letters of a regexp literal (`gim`). Unknown letters are ignored.
    pub fn from_letters(letters: &str) -> Self {
        let mut flags = Self::empty();
        for c in letters.chars() {
            match c {
                'g' => flags |= Self::GLOBAL,
                'i' => flags |= Self::IGNORE_CASE,
                'm' => flags |= Self::MULTILINE,
                _ => {}
            }
        }
        flags
    }
}

/// Element type of a typed sequence bound to a native list property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    Int,
    Real,
    Bool,
    String,
    Url,
}

impl SequenceKind {
    /// Stable numeric code used on the wire.
    pub const fn code(self) -> i32 {
        match self {
            SequenceKind::Int => 1,
            SequenceKind::Real => 2,
            SequenceKind::Bool => 3,
            SequenceKind::String => 4,
            SequenceKind::Url => 5,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(SequenceKind::Int),
            2 => Some(SequenceKind::Real),
            3 => Some(SequenceKind::Bool),
            4 => Some(SequenceKind::String),
            5 => Some(SequenceKind::Url),
            _ => None,
        }
    }

    /// Whether `value` is a legal element of a sequence of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (SequenceKind::Int, Value::Number(n)) => n.fract() == 0.0 && n.is_finite(),
            (SequenceKind::Real, Value::Number(_)) => true,
            (SequenceKind::Bool, Value::Bool(_)) => true,
            (SequenceKind::String | SequenceKind::Url, Value::String(_)) => true,
            _ => false,
        }
    }
}

/// Error message produced by a throwing accessor.
pub type GetterResult = Result<Value, String>;

/// Accessor property: reading it runs a closure that may throw.
#[derive(Clone)]
pub struct Getter(Arc<dyn Fn() -> GetterResult + Send + Sync>);

impl Getter {
    pub fn new(f: impl Fn() -> GetterResult + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the accessor.
    pub fn read(&self) -> GetterResult {
        (self.0)()
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Getter(..)")
    }
}

impl PartialEq for Getter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    #[default]
    Undefined,

    Null,

    Bool(bool),

    /// All script numbers are doubles; the codec picks an integer encoding when exact.
    Number(f64),

    String(String),

    Array(Vec<Value>),

    /// Plain object: own enumerable properties in enumeration order.
    Object(Vec<(String, Value)>),

    /// Milliseconds since the epoch.
    Date(f64),

    RegExp { pattern: String, flags: RegExpFlags },

    /// Typed list bound to a native property.
    Sequence { kind: SequenceKind, items: Vec<Value> },

    /// Script function; never crosses the worker boundary.
    Function { name: String },

    /// Reference to an object owned by the property system.
    QObject(ObjectId),

    /// Cross-thread shared list model.
    #[serde(skip)]
    ListModel(ListModelHandle),

    /// Accessor property whose read may throw.
    #[serde(skip)]
    Getter(Getter),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Date(_) => ValueKind::Date,
            Value::RegExp { .. } => ValueKind::RegExp,
            Value::Sequence { .. } => ValueKind::Sequence,
            Value::Function { .. } => ValueKind::Function,
            Value::QObject(_) => ValueKind::QObject,
            Value::ListModel(_) => ValueKind::ListModel,
            Value::Getter(_) => ValueKind::Getter,
        }
    }

    /// Convenience constructors
    pub fn number(n: impl Into<f64>) -> Self {
        Value::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn regexp(pattern: impl Into<String>, flags: RegExpFlags) -> Self {
        Value::RegExp {
            pattern: pattern.into(),
            flags,
        }
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an own property of a plain object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace an own property of a plain object. Returns `false` if `self`
    /// is not an object.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        match self {
            Value::Object(entries) => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| k == key) {
                    slot.1 = value;
                } else {
                    entries.push((key.to_string(), value));
                }
                true
            }
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_get_set_keeps_order() {
        let mut v = Value::object([("b", Value::from(1)), ("a", Value::from(2))]);
        assert!(v.set("b", Value::from(3)));
        assert!(v.set("c", Value::Null));
        match &v {
            Value::Object(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, ["b", "a", "c"]);
            }
            other => panic!("expected object, got {other:?}"),
        }
        assert_eq!(v.get("b"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn sequence_kind_codes_roundtrip() {
        for kind in [
            SequenceKind::Int,
            SequenceKind::Real,
            SequenceKind::Bool,
            SequenceKind::String,
            SequenceKind::Url,
        ] {
            assert_eq!(SequenceKind::from_code(kind.code()), Some(kind));
        }
        assert!(!SequenceKind::Int.accepts(&Value::Number(1.5)));
        assert!(SequenceKind::Real.accepts(&Value::Number(1.5)));
    }

    #[test]
    fn plain_values_serialize_as_tagged_json() {
        let v = Value::Array(vec![Value::Null, Value::from(2.5), Value::from("x")]);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Array");
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
