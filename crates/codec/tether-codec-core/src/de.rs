use tether_api_core::{ListModelHandle, RegExpFlags, SequenceKind, Value};

use crate::config::Limits;
use crate::error::CodecError;
use crate::ser::SerializedValue;
use crate::tag::{split_header, Tag};

/// Decode `data` and attach any list models it carries to `agent`.
pub fn deserialize(data: SerializedValue, agent: u64) -> Result<Value, CodecError> {
    deserialize_with(data, agent, &Limits::default())
}

pub fn deserialize_with(
    data: SerializedValue,
    agent: u64,
    limits: &Limits,
) -> Result<Value, CodecError> {
    let SerializedValue { bytes, handles } = data;
    let mut de = Deserializer {
        bytes: &bytes,
        pos: 0,
        handles: handles.into_iter().map(Some).collect(),
        agent,
        max_depth: limits.max_depth,
    };
    let value = de.value(0)?;
    // Transport clones that were never claimed are released here.
    Ok(value)
}

struct Deserializer<'a> {
    bytes: &'a [u8],
    pos: usize,
    handles: Vec<Option<ListModelHandle>>,
    agent: u64,
    max_depth: usize,
}

impl Deserializer<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], CodecError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - (self.bytes.len() - self.pos),
            }),
        }
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_le_bytes(raw))
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        self.u64().map(f64::from_bits)
    }

    fn units(&mut self, count: usize) -> Result<Vec<u16>, CodecError> {
        let padded = (count * 2 + 3) & !3;
        let b = self.take(padded)?;
        Ok(b[..count * 2]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect())
    }

    fn string_payload(&mut self, count: usize) -> Result<String, CodecError> {
        let offset = self.pos;
        let units = self.units(count)?;
        String::from_utf16(&units).map_err(|_| CodecError::InvalidString { offset })
    }

    fn key(&mut self, depth: usize) -> Result<String, CodecError> {
        match self.value(depth)? {
            Value::String(s) => Ok(s),
            other => Ok(tether_api_core::coercion::to_display_string(&other)),
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, CodecError> {
        let offset = self.pos;
        if depth > self.max_depth {
            return Err(CodecError::TooDeep {
                max_depth: self.max_depth,
                offset,
            });
        }
        let (raw, size) = split_header(self.u32()?);
        let tag = Tag::from_u8(raw).ok_or(CodecError::UnknownTag { tag: raw, offset })?;
        let size = size as usize;
        Ok(match tag {
            Tag::Undefined | Tag::Function => Value::Undefined,
            Tag::Null => Value::Null,
            Tag::True => Value::Bool(true),
            Tag::False => Value::Bool(false),
            Tag::String => Value::String(self.string_payload(size)?),
            Tag::Array => {
                let mut items = Vec::with_capacity(size.min(1024));
                for _ in 0..size {
                    items.push(self.value(depth + 1)?);
                }
                Value::Array(items)
            }
            Tag::Object => {
                let mut entries = Vec::with_capacity(size.min(1024));
                for _ in 0..size {
                    let key = self.key(depth + 1)?;
                    let member = self.value(depth + 1)?;
                    entries.push((key, member));
                }
                Value::Object(entries)
            }
            Tag::Int32 => Value::Number(self.u32()? as i32 as f64),
            Tag::Uint32 => Value::Number(self.u32()? as f64),
            Tag::Number => Value::Number(self.f64()?),
            Tag::Date => Value::Date(self.f64()?),
            Tag::Regexp => {
                let flags = RegExpFlags::from_bits_truncate(size as u32);
                let len = self.u32()? as usize;
                let mut units = self.units(len)?;
                if units.last() == Some(&0) {
                    units.pop();
                }
                let pattern =
                    String::from_utf16(&units).map_err(|_| CodecError::InvalidString { offset })?;
                Value::RegExp { pattern, flags }
            }
            Tag::ListModel => {
                let index = self.u64()?;
                let handle = self
                    .handles
                    .get_mut(index as usize)
                    .and_then(Option::take)
                    .ok_or(CodecError::InvalidHandle { index })?;
                handle.attach(self.agent);
                Value::ListModel(handle)
            }
            Tag::Sequence => {
                if size == 0 {
                    return Err(CodecError::InvalidSequenceKind { offset });
                }
                let kind = match self.value(depth + 1)? {
                    Value::Number(code) if code.fract() == 0.0 => SequenceKind::from_code(code as i32),
                    _ => None,
                }
                .ok_or(CodecError::InvalidSequenceKind { offset })?;
                let mut items = Vec::with_capacity((size - 1).min(1024));
                for _ in 1..size {
                    items.push(self.value(depth + 1)?);
                }
                Value::Sequence { kind, items }
            }
        })
    }
}
