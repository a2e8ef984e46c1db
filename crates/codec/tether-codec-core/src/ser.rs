use tether_api_core::{ListModelHandle, Value};

use crate::config::Limits;
use crate::tag::{header, Tag};

/// Output of [`serialize`]: the flat bytes plus the list-model handles they refer to.
///
/// Holding a handle here keeps the model alive while the bytes are in flight; the
/// receiving side takes ownership in [`deserialize`](crate::deserialize).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializedValue {
    pub bytes: Vec<u8>,
    pub handles: Vec<ListModelHandle>,
}

impl SerializedValue {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn serialize(value: &Value) -> SerializedValue {
    serialize_with(value, &Limits::default())
}

pub fn serialize_with(value: &Value, limits: &Limits) -> SerializedValue {
    let mut ser = Serializer {
        out: SerializedValue::default(),
        limits,
    };
    ser.value(value, 0);
    ser.out
}

struct Serializer<'a> {
    out: SerializedValue,
    limits: &'a Limits,
}

impl Serializer<'_> {
    fn push_u32(&mut self, word: u32) {
        self.out.bytes.extend_from_slice(&word.to_le_bytes());
    }

    fn push_header(&mut self, tag: Tag, size: u32) {
        self.push_u32(header(tag, size));
    }

    fn push_units(&mut self, units: &[u16]) {
        self.out.bytes.reserve(units.len() * 2 + 2);
        for unit in units {
            self.out.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        if units.len() % 2 == 1 {
            self.out.bytes.extend_from_slice(&[0, 0]);
        }
    }

    fn undefined(&mut self) {
        self.push_header(Tag::Undefined, 0);
    }

    fn fits(&self, len: usize, what: &str) -> bool {
        if len > self.limits.size_cap() as usize {
            log::trace!("{what} of length {len} exceeds the codec size limit; encoding undefined");
            false
        } else {
            true
        }
    }

    fn string(&mut self, s: &str) {
        let units: Vec<u16> = s.encode_utf16().collect();
        if !self.fits(units.len(), "string") {
            self.undefined();
            return;
        }
        self.push_header(Tag::String, units.len() as u32);
        self.push_units(&units);
    }

    fn number(&mut self, n: f64) {
        let integral = n.fract() == 0.0 && !(n == 0.0 && n.is_sign_negative());
        if integral && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
            self.push_header(Tag::Int32, 0);
            self.out.bytes.extend_from_slice(&(n as i32).to_le_bytes());
        } else if integral && n >= 0.0 && n <= u32::MAX as f64 {
            self.push_header(Tag::Uint32, 0);
            self.push_u32(n as u32);
        } else {
            self.push_header(Tag::Number, 0);
            self.out.bytes.extend_from_slice(&n.to_le_bytes());
        }
    }

    fn value(&mut self, value: &Value, depth: usize) {
        if depth > self.limits.max_depth {
            log::trace!("value nested deeper than {}; encoding undefined", self.limits.max_depth);
            self.undefined();
            return;
        }
        match value {
            Value::Undefined => self.undefined(),
            Value::Null => self.push_header(Tag::Null, 0),
            Value::Bool(true) => self.push_header(Tag::True, 0),
            Value::Bool(false) => self.push_header(Tag::False, 0),
            Value::Number(n) => self.number(*n),
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                if !self.fits(items.len(), "array") {
                    self.undefined();
                    return;
                }
                self.push_header(Tag::Array, items.len() as u32);
                for item in items {
                    self.value(item, depth + 1);
                }
            }
            Value::Object(entries) => {
                if !self.fits(entries.len(), "object") {
                    self.undefined();
                    return;
                }
                self.push_header(Tag::Object, entries.len() as u32);
                for (key, member) in entries {
                    self.string(key);
                    self.value(member, depth + 1);
                }
            }
            Value::Date(ms) => {
                self.push_header(Tag::Date, 0);
                self.out.bytes.extend_from_slice(&ms.to_le_bytes());
            }
            Value::RegExp { pattern, flags } => {
                let mut units: Vec<u16> = pattern.encode_utf16().collect();
                if !self.fits(units.len(), "regexp pattern") {
                    self.undefined();
                    return;
                }
                units.push(0);
                self.push_header(Tag::Regexp, flags.bits());
                self.push_u32(units.len() as u32);
                self.push_units(&units);
            }
            Value::Sequence { kind, items } => {
                if !self.fits(items.len() + 1, "sequence") {
                    self.undefined();
                    return;
                }
                if !items.iter().all(|item| kind.accepts(item)) {
                    log::trace!("sequence items do not match element kind {kind:?}; encoding undefined");
                    self.undefined();
                    return;
                }
                self.push_header(Tag::Sequence, items.len() as u32 + 1);
                self.number(kind.code() as f64);
                for item in items {
                    self.value(item, depth + 1);
                }
            }
            Value::ListModel(handle) => {
                let index = self.out.handles.len() as u64;
                self.out.handles.push(handle.clone());
                self.push_header(Tag::ListModel, 0);
                self.out.bytes.extend_from_slice(&index.to_le_bytes());
            }
            Value::Getter(getter) => match getter.read() {
                // Accessors may hand back another accessor; stop after one level.
                Ok(Value::Getter(_)) | Err(_) => self.undefined(),
                Ok(resolved) => self.value(&resolved, depth),
            },
            Value::Function { .. } | Value::QObject(_) => self.undefined(),
        }
    }
}
